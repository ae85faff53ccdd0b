//! Conversation session
//!
//! Ordered turns owned by the conversation layer. The router only reads them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a turn author
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    System,
}

impl TurnRole {
    /// Lenient parse for transport payloads. Anything that is not the user is the system.
    pub fn parse(role: &str) -> Self {
        match role.trim().to_lowercase().as_str() {
            "user" | "human" => TurnRole::User,
            _ => TurnRole::System,
        }
    }
}

/// A single turn in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(TurnRole::System, content)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    turns: Vec<Turn>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_turns(turns: Vec<Turn>) -> Self {
        Self { turns }
    }

    /// Append a turn (conversation layer only)
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Most recent user utterance, if any
    pub fn last_user_utterance(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.role == TurnRole::User)
            .map(|t| t.content.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_user_utterance_skips_system_turns() {
        let session = Session::from_turns(vec![
            Turn::user("what is XRP?"),
            Turn::system("XRP is a digital asset."),
            Turn::user("and in 10 years?"),
            Turn::system("Let me check."),
        ]);

        assert_eq!(session.last_user_utterance(), Some("and in 10 years?"));
        assert_eq!(session.len(), 4);
    }

    #[test]
    fn test_empty_session_has_no_user_utterance() {
        let mut session = Session::new();
        assert!(session.last_user_utterance().is_none());

        session.push(Turn::system("Welcome!"));
        assert!(session.last_user_utterance().is_none());
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(TurnRole::parse("User"), TurnRole::User);
        assert_eq!(TurnRole::parse("assistant"), TurnRole::System);
        assert_eq!(TurnRole::parse("system"), TurnRole::System);
    }
}
