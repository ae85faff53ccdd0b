//! Core data models for the query router

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Intent label used when no rule matched
pub const UNKNOWN_INTENT: &str = "unknown";

/// Entity map. Ordered so two classifications of the same text compare equal.
pub type Entities = BTreeMap<String, String>;

/// Action payload handed to executors
pub type Payload = BTreeMap<String, String>;

/// Response kinds shared across components
pub mod kind {
    pub const HISTORICAL_FACT: &str = "historical_fact";
    pub const SEARCH_RESULT: &str = "search_result";
    pub const DEFAULT: &str = "default";
    pub const ERROR: &str = "error";
    pub const CLARIFY: &str = "clarify";
}

//
// ================= Classification =================
//

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub intent: String,
    pub confidence: f32,
    pub entities: Entities,
    pub raw_text: String,
}

impl ClassificationResult {
    pub fn unknown(raw_text: &str) -> Self {
        Self {
            intent: UNKNOWN_INTENT.to_string(),
            confidence: 0.0,
            entities: Entities::new(),
            raw_text: raw_text.to_string(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.intent == UNKNOWN_INTENT
    }

    pub fn entity(&self, name: &str) -> Option<&str> {
        self.entities.get(name).map(String::as_str)
    }
}

//
// ================= Dialog Decision =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DecisionMode {
    DirectAction,
    Escalate,
    Clarify,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogDecision {
    pub mode: DecisionMode,
    pub action_name: Option<String>,
    pub payload: Payload,
}

impl DialogDecision {
    /// Payload value for `query`, empty when absent
    pub fn query(&self) -> &str {
        self.payload.get("query").map(String::as_str).unwrap_or_default()
    }
}

//
// ================= Response =================
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub text: String,
    pub source: String,
    pub kind: String,
}

impl Response {
    pub fn new(
        text: impl Into<String>,
        source: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            kind: kind.into(),
        }
    }

    /// Answer produced by a specialized responder; kind mirrors the handler id
    pub fn from_handler(handler_id: &str, text: impl Into<String>) -> Self {
        Self::new(text, handler_id, handler_id)
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

impl fmt::Display for DecisionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DecisionMode::DirectAction => "direct_action",
            DecisionMode::Escalate => "escalate",
            DecisionMode::Clarify => "clarify",
        };
        write!(f, "{}", s)
    }
}
