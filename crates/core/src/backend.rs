//! The model backend trait, over language-model providers.
//!
//! A backend takes a system prompt, prior turns, and the user query, and
//! returns plain text. Envelope differences between providers stay inside
//! the adapter; failures come back as a typed [`BackendError`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::message::ChatTurn;

/// What a backend is good at. Drives model selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendCapabilities {
    /// 0–10.
    pub reasoning: u8,
    pub vision: bool,
    /// 0–10.
    pub code_generation: u8,
    pub real_time_data: bool,
    /// In tokens.
    pub context_window: u32,
}

/// An image attached to a query, for vision-capable backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePayload {
    /// e.g. "image/jpeg"
    pub media_type: String,
    pub base64_data: String,
}

/// One backend invocation. Identical in structure for every backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendRequest {
    pub system_prompt: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<ChatTurn>,

    pub query: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImagePayload>,
}

/// Every provider adapter (OpenAI-compatible, Anthropic, test doubles)
/// implements this trait.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// The backend id used in scoring and in `AiResponse::model`.
    fn id(&self) -> &str;

    /// Send the request and return the generated text.
    async fn invoke(&self, request: BackendRequest) -> Result<String, BackendError>;

    /// Can we reach the backend?
    async fn health_check(&self) -> Result<bool, BackendError> {
        Ok(true)
    }
}
