//! Supporting types for agent operations.

use serde::{Deserialize, Serialize};

/// Metadata describing which provider and model an agent talks to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Backend type string (e.g., "openai", "anthropic", "generic").
    pub backend_type: String,

    /// Model identifier sent with every request.
    pub model: String,
}

/// A single call to a language model.
///
/// `segments` are sent in order as user turns; the optional system prompt
/// and sampling knobs come from business configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    pub segments: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl Invocation {
    /// Invocation with only input segments and provider defaults.
    pub fn from_segments(segments: Vec<String>) -> Self {
        Self {
            segments,
            ..Default::default()
        }
    }
}

/// Result of a successful model call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    /// Total tokens billed by the provider (prompt + completion).
    pub tokens: u32,

    /// Answer text of the first choice.
    pub text: String,
}
