//! Dialog Decision Unit
//!
//! Turns a classification into one of three outcomes:
//! - Escalate: intent unknown, the last user utterance goes to the general query path
//! - Clarify: intent known but confidence under the threshold
//! - DirectAction: intent known with enough confidence, entities become the payload
//!
//! Stateless across calls. The session is only read.

use crate::extractor::{
    INTENT_GENERAL_QUERY, INTENT_GOODBYE, INTENT_GREET, INTENT_HELP, INTENT_STOCK_PRICE,
    INTENT_THANKS,
};
use crate::models::{ClassificationResult, DecisionMode, DialogDecision, Payload};
use crate::session::Session;
use tracing::debug;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

pub const ACTION_GREET: &str = "utter_greet";
pub const ACTION_GOODBYE: &str = "utter_goodbye";
pub const ACTION_THANKS: &str = "utter_thanks";
pub const ACTION_HELP: &str = "utter_help";
pub const ACTION_STOCK_QUOTE: &str = "action_stock_quote";
pub const ACTION_GENERAL_QUERY: &str = "general_query";

/// Intent → action mapping
const INTENT_ACTIONS: &[(&str, &str)] = &[
    (INTENT_GREET, ACTION_GREET),
    (INTENT_GOODBYE, ACTION_GOODBYE),
    (INTENT_THANKS, ACTION_THANKS),
    (INTENT_HELP, ACTION_HELP),
    (INTENT_STOCK_PRICE, ACTION_STOCK_QUOTE),
    (INTENT_GENERAL_QUERY, ACTION_GENERAL_QUERY),
];

pub fn action_for_intent(intent: &str) -> Option<&'static str> {
    INTENT_ACTIONS
        .iter()
        .find(|(i, _)| *i == intent)
        .map(|(_, action)| *action)
}

#[derive(Debug, Clone, Copy)]
pub struct DialogDecisionUnit {
    threshold: f32,
}

impl DialogDecisionUnit {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn decide(&self, classification: &ClassificationResult, session: &Session) -> DialogDecision {
        if classification.is_unknown() {
            return Self::escalate(session);
        }

        let Some(action) = action_for_intent(&classification.intent) else {
            debug!(intent = %classification.intent, "No action mapped for intent, escalating");
            return Self::escalate(session);
        };

        if classification.confidence < self.threshold {
            debug!(
                intent = %classification.intent,
                confidence = classification.confidence,
                threshold = self.threshold,
                "Low confidence, asking to clarify"
            );

            let mut payload = Payload::new();
            payload.insert("intent".to_string(), classification.intent.clone());
            payload.insert("query".to_string(), classification.raw_text.clone());

            return DialogDecision {
                mode: DecisionMode::Clarify,
                action_name: None,
                payload,
            };
        }

        let mut payload: Payload = classification.entities.clone();
        payload.insert("query".to_string(), classification.raw_text.clone());

        DialogDecision {
            mode: DecisionMode::DirectAction,
            action_name: Some(action.to_string()),
            payload,
        }
    }

    /// Escalation carries the most recent user utterance, or an empty query
    fn escalate(session: &Session) -> DialogDecision {
        let query = session.last_user_utterance().unwrap_or_default();

        let mut payload = Payload::new();
        payload.insert("query".to_string(), query.to_string());

        DialogDecision {
            mode: DecisionMode::Escalate,
            action_name: Some(ACTION_GENERAL_QUERY.to_string()),
            payload,
        }
    }
}

impl Default for DialogDecisionUnit {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Entities;
    use crate::session::Turn;

    fn classification(intent: &str, confidence: f32) -> ClassificationResult {
        let mut entities = Entities::new();
        entities.insert("ticker".to_string(), "AAPL".to_string());

        ClassificationResult {
            intent: intent.to_string(),
            confidence,
            entities,
            raw_text: "apple stock price".to_string(),
        }
    }

    #[test]
    fn test_unknown_escalates_with_last_user_turn() {
        let unit = DialogDecisionUnit::default();
        let session = Session::from_turns(vec![
            Turn::user("first question"),
            Turn::system("first answer"),
            Turn::user("When did World War II end?"),
        ]);

        // Even a (bogus) high confidence does not stop escalation
        let mut result = ClassificationResult::unknown("asdf");
        result.confidence = 0.99;

        let decision = unit.decide(&result, &session);
        assert_eq!(decision.mode, DecisionMode::Escalate);
        assert_eq!(decision.action_name.as_deref(), Some(ACTION_GENERAL_QUERY));
        assert_eq!(decision.query(), "When did World War II end?");
    }

    #[test]
    fn test_escalation_without_user_turn_has_empty_query() {
        let unit = DialogDecisionUnit::default();
        let session = Session::from_turns(vec![Turn::system("Welcome")]);

        let decision = unit.decide(&ClassificationResult::unknown("???"), &session);
        assert_eq!(decision.mode, DecisionMode::Escalate);
        assert_eq!(decision.query(), "");
    }

    #[test]
    fn test_threshold_boundary() {
        let unit = DialogDecisionUnit::new(0.5);
        let session = Session::new();

        let at = unit.decide(&classification(INTENT_STOCK_PRICE, 0.5), &session);
        assert_eq!(at.mode, DecisionMode::DirectAction);
        assert_eq!(at.action_name.as_deref(), Some(ACTION_STOCK_QUOTE));
        assert_eq!(at.payload.get("ticker").map(String::as_str), Some("AAPL"));

        let below = unit.decide(&classification(INTENT_STOCK_PRICE, 0.49), &session);
        assert_eq!(below.mode, DecisionMode::Clarify);
        assert!(below.action_name.is_none());
        assert_eq!(below.payload.get("intent").map(String::as_str), Some(INTENT_STOCK_PRICE));
    }

    #[test]
    fn test_unmapped_intent_escalates() {
        let unit = DialogDecisionUnit::default();
        let session = Session::from_turns(vec![Turn::user("order a pizza")]);

        let decision = unit.decide(&classification("order_food", 0.9), &session);
        assert_eq!(decision.mode, DecisionMode::Escalate);
        assert_eq!(decision.query(), "order a pizza");
    }

    #[test]
    fn test_every_known_intent_has_an_action() {
        for intent in [
            INTENT_GREET,
            INTENT_GOODBYE,
            INTENT_THANKS,
            INTENT_HELP,
            INTENT_STOCK_PRICE,
            INTENT_GENERAL_QUERY,
        ] {
            assert!(action_for_intent(intent).is_some(), "intent: {}", intent);
        }
    }
}
