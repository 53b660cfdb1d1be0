//! Conversation turns passed to backends as prior history.

use serde::{Deserialize, Serialize};

/// Who spoke a turn. System instructions travel separately as the system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_serialization_uses_lowercase_roles() {
        let json = serde_json::to_string(&ChatTurn::assistant("hi")).unwrap();
        assert!(json.contains("\"assistant\""));
        let back: ChatTurn = serde_json::from_str(&json).unwrap();
        assert_eq!(back.role, TurnRole::Assistant);
    }
}
