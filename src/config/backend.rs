//! Provider configuration

use serde::{Deserialize, Serialize};

/// Provider API flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    /// OpenAI or any OpenAI-compatible API with Bearer keys
    OpenAI,
    /// Anthropic Messages API
    Anthropic,
    /// OpenAI-compatible server without authentication
    Generic,
}

/// One language-model provider.
///
/// Every credential becomes its own adapter in the provider's round-robin
/// pool, so several keys for one provider spread load across them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub backend_type: BackendType,
    pub model: String,
    /// Inline API keys
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub api_keys: Vec<String>,
    /// Names of environment variables holding API keys
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub api_key_envs: Vec<String>,
    /// Number of unauthenticated instances for `generic` providers
    #[serde(default = "default_instances")]
    pub instances: usize,
}

fn default_instances() -> usize {
    1
}

impl ProviderConfig {
    /// Number of configured credentials (inline + env).
    pub fn credential_count(&self) -> usize {
        self.api_keys.len() + self.api_key_envs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_config_parse() {
        let toml = r#"
        name = "qwen"
        url = "https://dashscope.aliyuncs.com/compatible-mode"
        type = "openai"
        model = "qwen-plus"
        api_keys = ["sk-1"]
        api_key_envs = ["QWEN_KEY_2"]
        "#;

        let provider: ProviderConfig = toml::from_str(toml).unwrap();
        assert_eq!(provider.backend_type, BackendType::OpenAI);
        assert_eq!(provider.credential_count(), 2);
        assert_eq!(provider.instances, 1);
    }

    #[test]
    fn test_backend_type_serde() {
        let json = serde_json::to_string(&BackendType::Anthropic).unwrap();
        assert_eq!(json, "\"anthropic\"");
        let parsed: BackendType = serde_json::from_str("\"generic\"").unwrap();
        assert_eq!(parsed, BackendType::Generic);
    }
}
