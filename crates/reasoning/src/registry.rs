//! Builds a [`ReasoningEngine`] from configuration.

use aria_config::{AppConfig, BackendConfig, BackendKind};
use aria_core::{BackendError, Clock, ModelBackend};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::anthropic::AnthropicBackend;
use crate::engine::ReasoningEngine;
use crate::openai_compat::{OPENAI_BASE_URL, OpenAiCompatBackend};

/// Register every configured backend in declaration order.
///
/// A backend whose HTTP client cannot be built is skipped with a warning.
pub fn build_from_config(config: &AppConfig, clock: Arc<dyn Clock>) -> ReasoningEngine {
    let mut engine = ReasoningEngine::new(clock);

    for backend_config in &config.backends {
        let api_key = config.api_key_for(backend_config).unwrap_or_default();
        if api_key.is_empty() {
            warn!(backend = %backend_config.id, "No API key configured, calls will fail");
        }

        match build_backend(backend_config, api_key) {
            Ok(backend) => {
                debug!(backend = %backend_config.id, kind = ?backend_config.kind, "Registered backend");
                engine.register(
                    backend,
                    backend_config.capabilities,
                    Duration::from_secs(backend_config.timeout_secs),
                );
            }
            Err(e) => warn!(backend = %backend_config.id, error = %e, "Skipping backend"),
        }
    }

    engine
}

fn build_backend(
    config: &BackendConfig,
    api_key: String,
) -> Result<Arc<dyn ModelBackend>, BackendError> {
    let timeout = Duration::from_secs(config.timeout_secs);

    let backend: Arc<dyn ModelBackend> = match config.kind {
        BackendKind::Anthropic => {
            let mut backend = AnthropicBackend::new(&config.id, api_key, &config.model, timeout)?
                .with_sampling(config.temperature, config.max_tokens);
            if let Some(url) = &config.api_url {
                backend = backend.with_base_url(url);
            }
            Arc::new(backend)
        }
        BackendKind::OpenaiCompat => {
            let base_url = config
                .api_url
                .clone()
                .unwrap_or_else(|| OPENAI_BASE_URL.to_string());
            Arc::new(
                OpenAiCompatBackend::new(&config.id, base_url, api_key, &config.model, timeout)?
                    .with_sampling(config.temperature, config.max_tokens),
            )
        }
    };

    Ok(backend)
}
