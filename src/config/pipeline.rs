//! Pipeline configuration

use serde::{Deserialize, Serialize};

/// Terminal platform settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Name of the provider whose adapters back the platform handler
    pub provider: String,

    /// Cost per consumed token, in the smallest currency unit
    pub unit_price: i64,

    /// Deadline for one examination, backend call included
    pub request_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            provider: "default".to_string(),
            unit_price: 1,
            request_timeout_secs: 60,
        }
    }
}
