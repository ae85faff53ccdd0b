//! Query Orchestrator
//!
//! MATCH → RESPOND → (DECLINE | FAULT)? → FALLBACK
//!
//! The first registration whose triggers hit the text is the only responder
//! tried. Its answer is final; a decline or a fault hands the text to the
//! fallback chain. Nothing is retried.

use crate::fallback::FallbackChain;
use crate::models::Response;
use crate::responders::{HandlerRegistration, HandlerTable};
use crate::Result;
use crate::error::RouterError;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub struct QueryOrchestrator {
    table: Arc<HandlerTable>,
    fallback: FallbackChain,
}

impl QueryOrchestrator {
    pub fn new(table: Arc<HandlerTable>, fallback: FallbackChain) -> Self {
        Self { table, fallback }
    }

    /// Always produces a response
    pub async fn answer(&self, text: &str) -> Response {
        let start = Instant::now();

        if text.trim().is_empty() {
            debug!("Empty query, going straight to fallback");
            return self.fallback.fallback(text).await;
        }

        match self.table.find_match(text) {
            Some(registration) => match invoke(registration, text) {
                Ok(Some(response)) if !response.is_empty() => {
                    info!(
                        handler_id = %registration.handler_id,
                        priority = registration.priority,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Answered by specialized responder"
                    );
                    return response;
                }
                Ok(_) => {
                    debug!(handler_id = %registration.handler_id, "Responder declined");
                }
                Err(error) => {
                    warn!(
                        handler_id = %registration.handler_id,
                        error = %error,
                        "Responder fault, treating as decline"
                    );
                }
            },
            None => debug!("No handler registration matched"),
        }

        let response = self.fallback.fallback(text).await;
        info!(
            kind = %response.kind,
            source = %response.source,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Answered by fallback chain"
        );
        response
    }
}

/// Run a responder, turning a panic into a fault
fn invoke(registration: &HandlerRegistration, text: &str) -> Result<Option<Response>> {
    panic::catch_unwind(AssertUnwindSafe(|| registration.responder().respond(text)))
        .unwrap_or_else(|_| {
            Err(RouterError::handler_fault(
                &registration.handler_id,
                "responder panicked",
            ))
        })
}
