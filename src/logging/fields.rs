//! Field extraction helpers for structured logging

use crate::pipeline::{GradingResponse, PipelineError};

/// Extract status and error message from a pipeline result
///
/// Returns a tuple of (status, error_message).
/// - For Ok results: ("success", None)
/// - For Err results: (error kind, Some(error message))
///
/// # Examples
///
/// ```
/// use examen::logging::extract_status;
/// use examen::pipeline::{GradingResponse, PipelineError};
///
/// let result: Result<GradingResponse, PipelineError> = Err(PipelineError::Cancelled);
/// let (status, error_msg) = extract_status(&result);
/// assert_eq!(status, "cancelled");
/// assert!(error_msg.is_some());
/// ```
pub fn extract_status(
    result: &Result<GradingResponse, PipelineError>,
) -> (&'static str, Option<String>) {
    match result {
        Ok(_) => ("success", None),
        Err(e) => (e.kind(), Some(e.to_string())),
    }
}

/// Preview of the request inputs for logging (privacy-safe)
///
/// Returns None unless content logging is enabled. When enabled, returns the
/// last input segment (the user's own answer) truncated to `max_chars`.
pub fn truncate_inputs(
    inputs: &[String],
    enable_content_logging: bool,
    max_chars: usize,
) -> Option<String> {
    if !enable_content_logging {
        return None;
    }

    inputs
        .last()
        .filter(|s| !s.is_empty())
        .map(|s| truncate_string(s, max_chars))
}

/// Truncate to at most `max_chars` characters, never splitting a character
pub fn truncate_string(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}...", &s[..cut]),
    }
}
