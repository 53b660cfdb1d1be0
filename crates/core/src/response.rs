//! The structured result of one reasoning invocation.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Model label used for merged multi-backend answers.
pub const CONSENSUS_MODEL: &str = "consensus";

/// Model label used for the fallback answer.
pub const ERROR_MODEL: &str = "error";

pub const MIN_CONFIDENCE: f64 = 0.1;
pub const MAX_CONFIDENCE: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiResponse {
    pub content: String,
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<String>,
    /// Always within [0.1, 1.0].
    pub confidence: f64,
    /// Backend id, `"consensus"`, or `"error"`.
    pub model: String,
    pub timestamp: DateTime<Local>,
    pub context_used: Vec<String>,
}

impl AiResponse {
    /// The polite answer returned whenever inference fails.
    pub fn fallback(timestamp: DateTime<Local>) -> Self {
        Self {
            content: "I apologize, but I encountered an error while processing your request. Please try again.".into(),
            reasoning: "Error occurred during model inference".into(),
            actions: Vec::new(),
            confidence: MIN_CONFIDENCE,
            model: ERROR_MODEL.into(),
            timestamp,
            context_used: Vec::new(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.model == ERROR_MODEL
    }
}

/// Clamp a raw confidence into the response range.
pub fn clamp_confidence(value: f64) -> f64 {
    value.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}
