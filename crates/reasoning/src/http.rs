use aria_core::BackendError;
use std::time::Duration;
use tracing::warn;

const RATE_LIMIT_RETRY_SECS: u64 = 5;

pub(crate) fn client(timeout: Duration) -> Result<reqwest::Client, BackendError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| BackendError::NotConfigured(format!("HTTP client: {e}")))
}

/// Map a non-200 status onto the backend error taxonomy.
pub(crate) fn status_error(backend: &str, status: u16, body: String) -> BackendError {
    match status {
        429 => BackendError::RateLimited {
            retry_after_secs: RATE_LIMIT_RETRY_SECS,
        },
        401 | 403 => BackendError::Authentication(format!(
            "{backend}: invalid API key or insufficient permissions"
        )),
        _ => {
            warn!(backend, status, body = %body, "Backend returned error");
            BackendError::Api {
                status_code: status,
                message: body,
            }
        }
    }
}

pub(crate) fn transport_error(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout(e.to_string())
    } else {
        BackendError::Network(e.to_string())
    }
}
