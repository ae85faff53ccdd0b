//! Conversational Query Router
//!
//! Turns one user utterance into one answer:
//! - Extracts an intent, a confidence and entities with static rules
//! - Decides between a direct action, a clarification and escalation
//! - Routes escalated queries to topic responders by priority
//! - Falls back to reference knowledge, web search, then a default message
//!
//! PIPELINE:
//! CLASSIFY → DECIDE → DISPATCH → (RESPOND | FALLBACK)

pub mod api;
pub mod config;
pub mod dialog;
pub mod dispatcher;
pub mod error;
pub mod extractor;
pub mod fallback;
pub mod models;
pub mod orchestrator;
pub mod responders;
pub mod router;
pub mod session;

pub use error::{Result, RouterError};

// Re-export common types
pub use config::RouterConfig;
pub use models::*;
pub use router::QueryRouter;
pub use session::{Session, Turn, TurnRole};
