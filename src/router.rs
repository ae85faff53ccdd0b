//! Query Router
//!
//! Synchronous entry point for one conversational turn:
//! CLASSIFY → DECIDE → DISPATCH
//!
//! `handle` blocks the calling thread. Async callers must run it on a
//! blocking thread (see `api`).

use crate::config::RouterConfig;
use crate::dialog::DialogDecisionUnit;
use crate::dispatcher::ActionDispatcher;
use crate::extractor::EntityExtractor;
use crate::fallback::search::create_providers;
use crate::fallback::FallbackChain;
use crate::models::{ClassificationResult, DialogDecision, Response};
use crate::orchestrator::QueryOrchestrator;
use crate::responders::{default_handler_table, HandlerTable};
use crate::session::Session;
use crate::Result;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, info_span};
use uuid::Uuid;

pub struct QueryRouter {
    decision_unit: DialogDecisionUnit,
    dispatcher: ActionDispatcher,
}

impl QueryRouter {
    /// Default handler table plus the configured search providers
    pub fn new(config: &RouterConfig) -> Result<Self> {
        config.validate()?;

        let providers = create_providers(config)?;
        let fallback = FallbackChain::new(providers, config.search_timeout);

        info!(
            providers = ?fallback.provider_names(),
            threshold = config.confidence_threshold,
            "Query router initialized"
        );

        Ok(Self::with_components(
            default_handler_table(),
            fallback,
            DialogDecisionUnit::new(config.confidence_threshold),
        ))
    }

    pub fn with_components(
        table: Arc<HandlerTable>,
        fallback: FallbackChain,
        decision_unit: DialogDecisionUnit,
    ) -> Self {
        let orchestrator = Arc::new(QueryOrchestrator::new(table, fallback));
        Self {
            decision_unit,
            dispatcher: ActionDispatcher::new(orchestrator),
        }
    }

    /// Knowledge table and default message only; no network access
    pub fn offline() -> Self {
        Self::with_components(
            default_handler_table(),
            FallbackChain::without_search(),
            DialogDecisionUnit::default(),
        )
    }

    pub fn classify(&self, text: &str) -> ClassificationResult {
        EntityExtractor::classify(text)
    }

    pub fn decide(&self, classification: &ClassificationResult, session: &Session) -> DialogDecision {
        self.decision_unit.decide(classification, session)
    }

    /// Answer one utterance. Always returns a response.
    pub fn handle(&self, text: &str, session: &Session) -> Response {
        let request_id = Uuid::new_v4();
        let span = info_span!("turn", %request_id, query = %query_fingerprint(text));
        let _enter = span.enter();
        let start = Instant::now();

        let classification = self.classify(text);
        let decision = self.decide(&classification, session);
        let response = self.dispatcher.execute(&decision);

        info!(
            intent = %classification.intent,
            confidence = classification.confidence,
            mode = %decision.mode,
            source = %response.source,
            kind = %response.kind,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Turn handled"
        );

        response
    }
}

/// Short stable digest of the utterance, so logs can correlate repeats
/// without recording what users typed
pub fn query_fingerprint(text: &str) -> String {
    let digest = Sha256::digest(text.trim().to_lowercase().as_bytes());
    hex::encode(&digest[..6])
}
