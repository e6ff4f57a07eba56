//! Per-business settings injected by the configuration stage

use crate::pipeline::{BusinessKey, RequestParameters};
use serde::{Deserialize, Serialize};

/// Settings for one business key (`[businesses.<key>]`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessConfig {
    /// System prompt sent ahead of the business prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Template rendered by the business stage; `{title}`, `{canonical}` and
    /// `{answer}` are substituted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Rewrite the request's business key (e.g. route a trial business
    /// through another business's settings)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_as: Option<BusinessKey>,
}

impl BusinessConfig {
    /// Parameters this business contributes to a request
    pub fn parameters(&self) -> RequestParameters {
        RequestParameters {
            system_prompt: self.system_prompt.clone(),
            prompt_template: self.prompt_template.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}
