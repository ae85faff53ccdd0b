//! Fallback chain
//!
//! Runs only when no specialized responder produced an answer.
//! Stages, first success wins:
//! 1. Static historical knowledge
//! 2. External search providers, in order, each under a timeout
//! 3. Fixed default message, which always succeeds

use crate::error::RouterError;
use crate::models::{kind, Response};
use crate::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub mod knowledge;
pub mod search;

pub use search::{ProviderPayload, SearchProvider};

pub const SOURCE_KNOWLEDGE: &str = "historical_knowledge";
pub const SOURCE_FALLBACK: &str = "fallback";

pub const DEFAULT_MESSAGE: &str = "I'm sorry, I couldn't find an answer to that. \
Try rephrasing your question or asking about something more specific.";

pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(5);

pub struct FallbackChain {
    providers: Vec<Arc<dyn SearchProvider>>,
    provider_timeout: Duration,
}

impl FallbackChain {
    pub fn new(providers: Vec<Arc<dyn SearchProvider>>, provider_timeout: Duration) -> Self {
        Self {
            providers,
            provider_timeout,
        }
    }

    /// Knowledge table and default message only
    pub fn without_search() -> Self {
        Self::new(Vec::new(), DEFAULT_PROVIDER_TIMEOUT)
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Never fails
    pub async fn fallback(&self, text: &str) -> Response {
        if let Some(fact) = knowledge::lookup(text) {
            debug!("Answered from historical knowledge");
            return Response::new(fact, SOURCE_KNOWLEDGE, kind::HISTORICAL_FACT);
        }

        if text.trim().is_empty() {
            debug!("Empty query, skipping search providers");
        } else {
            for provider in &self.providers {
                match self.query_provider(provider.as_ref(), text).await {
                    Ok(answer) => {
                        info!(provider = provider.name(), "Answered from search provider");
                        return Response::new(answer, provider.name(), kind::SEARCH_RESULT);
                    }
                    Err(error) => {
                        warn!(
                            provider = provider.name(),
                            error = %error,
                            "Search provider failed, trying next stage"
                        );
                    }
                }
            }
        }

        Response::new(DEFAULT_MESSAGE, SOURCE_FALLBACK, kind::DEFAULT)
    }

    async fn query_provider(&self, provider: &dyn SearchProvider, query: &str) -> Result<String> {
        let name = provider.name();

        let raw = tokio::time::timeout(
            self.provider_timeout,
            provider.search(query, self.provider_timeout),
        )
        .await
        .map_err(|_| RouterError::ProviderTimeout {
            provider: name.to_string(),
            timeout: self.provider_timeout,
        })??;

        ProviderPayload::parse(name, raw)?
            .into_text()
            .ok_or_else(|| RouterError::provider_fault(name, "empty result"))
    }
}
