//! Error types for the ARIA domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all ARIA operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Backend errors ---
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    // --- Sensor errors ---
    #[error("Sensor error: {0}")]
    Sensor(#[from] SensorError),

    // --- Notification errors ---
    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),

    // --- Task errors ---
    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures a language-model backend can surface.
///
/// Adapters map their transport and envelope quirks onto these variants so
/// nothing downstream ever sees a half-parsed response.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Rate limited by backend, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Backend not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum SensorError {
    #[error("Permission denied for {0}")]
    PermissionDenied(String),

    #[error("Sensor unavailable: {0}")]
    Unavailable(String),

    #[error("Subscription to {stream} failed: {reason}")]
    SubscriptionFailed { stream: String, reason: String },
}

#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    #[error("Notification delivery failed: {0}")]
    DeliveryFailed(String),
}

#[derive(Debug, Clone, Error)]
pub enum TaskError {
    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("Invalid task transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Task execution failed: {task_id}: {reason}")]
    ExecutionFailed { task_id: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_displays_correctly() {
        let err = Error::Backend(BackendError::Api {
            status_code: 500,
            message: "Internal Server Error".into(),
        });
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("Internal Server Error"));
    }

    #[test]
    fn task_transition_error_names_both_states() {
        let err = Error::Task(TaskError::InvalidTransition {
            from: "completed".into(),
            to: "active".into(),
        });
        assert!(err.to_string().contains("completed -> active"));
    }
}
