//! Error types for the query router

use std::time::Duration;
use thiserror::Error;

/// Result type alias for router operations
pub type Result<T> = std::result::Result<T, RouterError>;

#[derive(Error, Debug)]
pub enum RouterError {

    // =============================
    // Pipeline Faults
    // =============================

    #[error("Handler fault in {handler_id}: {reason}")]
    HandlerFault {
        handler_id: String,
        reason: String,
    },

    #[error("Search provider {provider} failed: {reason}")]
    ProviderFault {
        provider: String,
        reason: String,
    },

    #[error("Search provider {provider} timed out after {timeout:?}")]
    ProviderTimeout {
        provider: String,
        timeout: Duration,
    },

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Invalid action payload for {action}: {reason}")]
    InvalidPayload {
        action: String,
        reason: String,
    },

    #[error("Dispatch error: {0}")]
    DispatchError(String),

    #[error("Runtime error: {0}")]
    RuntimeError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl RouterError {
    pub fn handler_fault(handler_id: &str, reason: impl Into<String>) -> Self {
        RouterError::HandlerFault {
            handler_id: handler_id.to_string(),
            reason: reason.into(),
        }
    }

    pub fn provider_fault(provider: &str, reason: impl Into<String>) -> Self {
        RouterError::ProviderFault {
            provider: provider.to_string(),
            reason: reason.into(),
        }
    }
}
