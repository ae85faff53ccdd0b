//! Specialized responders and the handler table
//!
//! Each responder owns one topic and answers from static reference content.
//! Responders never do network I/O. The handler table orders registrations
//! by priority once, at construction, and is never mutated afterwards.

use crate::models::Response;
use crate::Result;
use lazy_static::lazy_static;
use std::fmt;
use std::sync::Arc;

pub mod arithmetic;
pub mod forecast;
pub mod migration;
pub mod pricing;
pub mod security;

pub use arithmetic::ArithmeticResponder;
pub use forecast::CryptoForecastResponder;
pub use migration::ProtocolMigrationResponder;
pub use pricing::PricingProjectionResponder;
pub use security::SecurityArchitectureResponder;

/// A topic-scoped responder.
///
/// `Ok(None)` is a decline. `Err` is a fault; the orchestrator logs it and
/// treats it as a decline.
pub trait Responder: Send + Sync {
    fn id(&self) -> &'static str;
    fn respond(&self, text: &str) -> Result<Option<Response>>;
}

/// One row of the dispatch table
#[derive(Clone)]
pub struct HandlerRegistration {
    pub priority: u32,
    pub trigger_keywords: Vec<String>,
    pub handler_id: String,
    responder: Arc<dyn Responder>,
}

impl HandlerRegistration {
    pub fn new(priority: u32, triggers: &[&str], responder: Arc<dyn Responder>) -> Self {
        Self {
            priority,
            trigger_keywords: triggers.iter().map(|t| t.to_lowercase()).collect(),
            handler_id: responder.id().to_string(),
            responder,
        }
    }

    /// True if any trigger is a substring of the (already lowercased) text.
    /// Substrings let inflections match: "migrat" claims "migrations".
    pub fn matches(&self, lowered: &str) -> bool {
        self.trigger_keywords
            .iter()
            .any(|keyword| lowered.contains(keyword.as_str()))
    }

    pub fn responder(&self) -> &dyn Responder {
        self.responder.as_ref()
    }
}

impl fmt::Debug for HandlerRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistration")
            .field("priority", &self.priority)
            .field("handler_id", &self.handler_id)
            .field("trigger_keywords", &self.trigger_keywords)
            .finish()
    }
}

/// Immutable, priority-ordered handler table
#[derive(Debug, Clone)]
pub struct HandlerTable {
    registrations: Vec<HandlerRegistration>,
}

impl HandlerTable {
    /// Sorts by ascending priority. The sort is stable, so equal priorities keep
    /// declaration order.
    pub fn new(mut registrations: Vec<HandlerRegistration>) -> Self {
        registrations.sort_by_key(|r| r.priority);
        Self { registrations }
    }

    /// First registration (lowest priority number) whose triggers hit the text
    pub fn find_match(&self, text: &str) -> Option<&HandlerRegistration> {
        let lowered = text.to_lowercase();
        self.registrations.iter().find(|r| r.matches(&lowered))
    }

    pub fn registrations(&self) -> &[HandlerRegistration] {
        &self.registrations
    }

    pub fn handler_ids(&self) -> Vec<&str> {
        self.registrations
            .iter()
            .map(|r| r.handler_id.as_str())
            .collect()
    }
}

lazy_static! {
    static ref DEFAULT_TABLE: Arc<HandlerTable> = Arc::new(build_default_table());
}

/// Process-wide default table, built on first use
pub fn default_handler_table() -> Arc<HandlerTable> {
    Arc::clone(&DEFAULT_TABLE)
}

fn build_default_table() -> HandlerTable {
    HandlerTable::new(vec![
        // Forecast phrasing overlaps with arithmetic ("how much"), so it must sit lower
        HandlerRegistration::new(
            10,
            &[
                "price prediction",
                "price target",
                "forecast",
                "will be worth",
                "in 10 years",
                "years from now",
            ],
            Arc::new(CryptoForecastResponder),
        ),
        HandlerRegistration::new(
            20,
            &[
                "security architecture",
                "zero trust",
                "threat model",
                "threat modeling",
                "encryption",
                "network segmentation",
                "multi-factor",
                "multifactor",
            ],
            Arc::new(SecurityArchitectureResponder),
        ),
        HandlerRegistration::new(
            30,
            &[
                "migrat",
                "ipv6",
                "http/2",
                "http/3",
                "tls 1.3",
            ],
            Arc::new(ProtocolMigrationResponder),
        ),
        HandlerRegistration::new(
            40,
            &[
                "pricing",
                "subscription",
                "revenue",
                "projection",
                "return on investment",
            ],
            Arc::new(PricingProjectionResponder),
        ),
        HandlerRegistration::new(
            50,
            &[
                "how much",
                "calculat",
                "compute",
                "what is",
                "percent of",
            ],
            Arc::new(ArithmeticResponder),
        ),
    ])
}
