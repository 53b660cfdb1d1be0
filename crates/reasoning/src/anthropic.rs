//! Native Anthropic Messages API backend.
//!
//! Differences from the OpenAI dialect:
//! - `x-api-key` header instead of Bearer auth
//! - `anthropic-version` header
//! - system prompt as a top-level field
//! - images as base64 `image` content blocks

use async_trait::async_trait;
use aria_core::{BackendError, BackendRequest, ModelBackend, TurnRole};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::http;

const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

pub struct AnthropicBackend {
    id: String,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    client: reqwest::Client,
}

impl AnthropicBackend {
    pub fn new(
        id: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        Ok(Self {
            id: id.into(),
            base_url: ANTHROPIC_BASE_URL.into(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.7,
            max_tokens: 2000,
            client: http::client(timeout)?,
        })
    }

    /// Point at a proxy or test server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    fn request_body(&self, request: &BackendRequest) -> serde_json::Value {
        let mut messages: Vec<AnthropicMessage> = request
            .history
            .iter()
            .map(|turn| AnthropicMessage {
                role: turn.role.as_str(),
                content: AnthropicContent::Text(turn.content.clone()),
            })
            .collect();

        let content = match &request.image {
            Some(image) => AnthropicContent::Blocks(vec![
                ContentBlock::Image {
                    source: ImageSource {
                        kind: "base64",
                        media_type: image.media_type.clone(),
                        data: image.base64_data.clone(),
                    },
                },
                ContentBlock::Text {
                    text: request.query.clone(),
                },
            ]),
            None => AnthropicContent::Text(request.query.clone()),
        };
        messages.push(AnthropicMessage {
            role: TurnRole::User.as_str(),
            content,
        });

        serde_json::json!({
            "model": self.model,
            "system": request.system_prompt,
            "messages": messages,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        })
    }

    /// Text of the first text block.
    fn extract_text(response: AnthropicResponse) -> Result<String, BackendError> {
        response
            .content
            .into_iter()
            .find_map(|block| match block {
                ResponseBlock::Text { text } => Some(text),
                ResponseBlock::Other => None,
            })
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| BackendError::MalformedResponse("no text block in response".into()))
    }
}

#[async_trait]
impl ModelBackend for AnthropicBackend {
    fn id(&self) -> &str {
        &self.id
    }

    async fn invoke(&self, request: BackendRequest) -> Result<String, BackendError> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = self.request_body(&request);

        debug!(backend = %self.id, model = %self.model, "Sending messages request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(http::transport_error)?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            return Err(http::status_error(&self.id, status, error_body));
        }

        let api_response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| BackendError::MalformedResponse(format!("{}: {e}", self.id)))?;

        Self::extract_text(api_response)
    }
}

// --- Anthropic API types ---

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: AnthropicContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum AnthropicContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    Image { source: ImageSource },
}

#[derive(Debug, Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;
    use aria_core::{ChatTurn, ImagePayload};

    fn backend() -> AnthropicBackend {
        AnthropicBackend::new(
            "anthropic",
            "sk-ant-test",
            "claude-3-5-sonnet-20241022",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn request() -> BackendRequest {
        BackendRequest {
            system_prompt: "You are ARIA".into(),
            history: vec![ChatTurn::user("hi")],
            query: "describe this".into(),
            image: None,
        }
    }

    #[test]
    fn constructor_with_base_url() {
        let b = backend().with_base_url("https://custom.proxy.com/");
        assert_eq!(b.base_url, "https://custom.proxy.com");
        assert_eq!(b.id(), "anthropic");
    }

    #[test]
    fn system_prompt_is_top_level() {
        let body = backend().request_body(&request());
        assert_eq!(body["system"], "You are ARIA");
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|m| m["role"] != "system"));
        assert_eq!(body["max_tokens"], 2000);
    }

    #[test]
    fn image_block_precedes_text() {
        let mut req = request();
        req.image = Some(ImagePayload {
            media_type: "image/png".into(),
            base64_data: "iVBOR".into(),
        });
        let body = backend().request_body(&req);
        let blocks = body["messages"][1]["content"].as_array().unwrap();
        assert_eq!(blocks[0]["type"], "image");
        assert_eq!(blocks[0]["source"]["type"], "base64");
        assert_eq!(blocks[0]["source"]["media_type"], "image/png");
        assert_eq!(blocks[1]["text"], "describe this");
    }

    #[test]
    fn envelope_text_extraction() {
        let ok: AnthropicResponse = serde_json::from_str(
            r#"{"id":"msg_1","content":[{"type":"thinking","thinking":"hmm"},{"type":"text","text":"Hello"}]}"#,
        )
        .unwrap();
        assert_eq!(AnthropicBackend::extract_text(ok).unwrap(), "Hello");

        let empty: AnthropicResponse = serde_json::from_str(r#"{"content":[]}"#).unwrap();
        assert!(matches!(
            AnthropicBackend::extract_text(empty),
            Err(BackendError::MalformedResponse(_))
        ));
    }
}
