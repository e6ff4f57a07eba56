//! Error types for agent operations.

use thiserror::Error;

/// Errors that can occur while invoking a language-model backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// Network connectivity error (DNS, connection refused, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded deadline.
    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    /// Backend returned an error response (4xx, 5xx).
    #[error("Backend error {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Backend response doesn't match expected format.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Agent configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}
