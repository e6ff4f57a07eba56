//! Backend SDK adapters.
//!
//! This module provides the `CompletionAgent` trait that hides one concrete
//! language-model provider behind a uniform "segments in, tokens and text out"
//! capability, plus the HTTP implementations used in production.

use async_trait::async_trait;

pub mod anthropic;
pub mod error;
pub mod factory;
pub mod openai;
pub mod types;

// Re-export key types for convenience
pub use error::AgentError;
pub use types::{AgentProfile, Completion, Invocation};

/// Uniform interface over a single provider credential/instance.
///
/// # Object Safety
///
/// This trait is object-safe and designed to be used as `Arc<dyn CompletionAgent>`.
/// All async methods use `async_trait` for compatibility with trait objects.
///
/// # Cancellation Safety
///
/// `invoke` is cancellation-safe. Dropping the future aborts the in-flight
/// HTTP request, which is how deadlines and cancellation reach the provider.
#[async_trait]
pub trait CompletionAgent: Send + Sync + 'static {
    /// Unique identifier for this agent instance (e.g., "qwen-0").
    fn id(&self) -> &str;

    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Provider type and model.
    fn profile(&self) -> AgentProfile;

    /// Execute one non-streaming completion.
    ///
    /// # Returns
    ///
    /// - `Ok(Completion)` with billed tokens and answer text
    /// - `Err(AgentError::Upstream)` if the provider returned an error status
    /// - `Err(AgentError::Network)` if the connection failed
    /// - `Err(AgentError::Timeout)` if the provider exceeded its own deadline
    /// - `Err(AgentError::InvalidResponse)` if the body could not be decoded
    ///
    /// No retries happen here; the caller owns retry policy.
    async fn invoke(&self, invocation: &Invocation) -> Result<Completion, AgentError>;
}

/// Heuristic token estimate (chars / 4) used before a real count is known.
pub fn heuristic_tokens<S: AsRef<str>>(texts: &[S]) -> u32 {
    let chars: usize = texts.iter().map(|t| t.as_ref().chars().count()).sum();
    u32::try_from(chars / 4).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristic_counts_chars_not_bytes() {
        // 8 CJK chars are 24 bytes but only 2 heuristic tokens
        assert_eq!(heuristic_tokens(&["最终评分最终评分"]), 2);
        assert_eq!(heuristic_tokens(&["abcd", "efgh"]), 2);
        assert_eq!(heuristic_tokens::<&str>(&[]), 0);
    }
}
