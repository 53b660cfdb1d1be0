//! OpenAI-compatible chat completions backend.
//!
//! Serves OpenAI itself and anything speaking the same `/chat/completions`
//! dialect (xAI Grok, OpenRouter, Ollama, vLLM).

use async_trait::async_trait;
use aria_core::{BackendError, BackendRequest, ModelBackend, TurnRole};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::http;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiCompatBackend {
    id: String,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    client: reqwest::Client,
}

impl OpenAiCompatBackend {
    pub fn new(
        id: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        Ok(Self {
            id: id.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.7,
            max_tokens: 2000,
            client: http::client(timeout)?,
        })
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// Request body: system prompt first, then history, then the query.
    fn request_body(&self, request: &BackendRequest) -> serde_json::Value {
        let mut messages = Vec::with_capacity(request.history.len() + 2);
        messages.push(ApiMessage {
            role: "system",
            content: ApiContent::Text(request.system_prompt.clone()),
        });
        messages.extend(request.history.iter().map(|turn| ApiMessage {
            role: turn.role.as_str(),
            content: ApiContent::Text(turn.content.clone()),
        }));

        let user_content = match &request.image {
            Some(image) => ApiContent::Parts(vec![
                ApiPart::Text {
                    text: request.query.clone(),
                },
                ApiPart::ImageUrl {
                    image_url: ImageUrl {
                        url: format!("data:{};base64,{}", image.media_type, image.base64_data),
                    },
                },
            ]),
            None => ApiContent::Text(request.query.clone()),
        };
        messages.push(ApiMessage {
            role: TurnRole::User.as_str(),
            content: user_content,
        });

        serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "stream": false,
        })
    }

    /// Pull the first choice's text out of the envelope.
    fn extract_text(response: ApiResponse) -> Result<String, BackendError> {
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| BackendError::MalformedResponse("no content in first choice".into()))
    }
}

#[async_trait]
impl ModelBackend for OpenAiCompatBackend {
    fn id(&self) -> &str {
        &self.id
    }

    async fn invoke(&self, request: BackendRequest) -> Result<String, BackendError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.request_body(&request);

        debug!(backend = %self.id, model = %self.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
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

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| BackendError::MalformedResponse(format!("{}: {e}", self.id)))?;

        Self::extract_text(api_response)
    }

    async fn health_check(&self) -> Result<bool, BackendError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(http::transport_error)?;

        Ok(response.status().is_success())
    }
}

// --- API types ---

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: ApiContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ApiContent {
    Text(String),
    Parts(Vec<ApiPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}
