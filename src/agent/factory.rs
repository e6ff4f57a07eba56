//! Agent factory for creating `CompletionAgent` trait objects from configuration.

use super::{anthropic::AnthropicAgent, openai::OpenAIAgent, AgentError, CompletionAgent};
use crate::config::{BackendType, ProviderConfig};
use reqwest::Client;
use std::sync::Arc;

/// Create a single agent for one credential of a provider.
///
/// # Examples
///
/// ```
/// use examen::agent::factory::create_agent;
/// use examen::config::BackendType;
/// use reqwest::Client;
/// use std::sync::Arc;
///
/// let agent = create_agent(
///     "qwen-0".to_string(),
///     "https://dashscope.aliyuncs.com/compatible-mode".to_string(),
///     "qwen-plus".to_string(),
///     BackendType::OpenAI,
///     Some("sk-test".to_string()),
///     Arc::new(Client::new()),
/// ).unwrap();
///
/// assert_eq!(agent.id(), "qwen-0");
/// ```
pub fn create_agent(
    id: String,
    url: String,
    model: String,
    backend_type: BackendType,
    api_key: Option<String>,
    client: Arc<Client>,
) -> Result<Arc<dyn CompletionAgent>, AgentError> {
    let name = id.clone();
    match backend_type {
        BackendType::OpenAI => {
            let key = api_key.ok_or_else(|| {
                AgentError::Configuration("OpenAI provider requires an API key".to_string())
            })?;
            Ok(Arc::new(OpenAIAgent::new(id, name, url, model, key, client)))
        }
        BackendType::Anthropic => {
            let key = api_key.ok_or_else(|| {
                AgentError::Configuration("Anthropic provider requires an API key".to_string())
            })?;
            Ok(Arc::new(AnthropicAgent::new(id, name, url, model, key, client)))
        }
        BackendType::Generic => Ok(Arc::new(OpenAIAgent::generic(id, name, url, model, client))),
    }
}

/// Build one agent per credential (or per instance for `generic`) of a provider.
///
/// Agents are named `<provider>-<index>` in credential order: inline keys
/// first, then keys read from `api_key_envs`.
pub fn create_provider_agents(
    provider: &ProviderConfig,
    client: Arc<Client>,
) -> Result<Vec<Arc<dyn CompletionAgent>>, AgentError> {
    if provider.backend_type == BackendType::Generic {
        return (0..provider.instances.max(1))
            .map(|i| {
                create_agent(
                    format!("{}-{}", provider.name, i),
                    provider.url.clone(),
                    provider.model.clone(),
                    provider.backend_type,
                    None,
                    Arc::clone(&client),
                )
            })
            .collect();
    }

    let mut keys = provider.api_keys.clone();
    for env_var in &provider.api_key_envs {
        let key = std::env::var(env_var).map_err(|e| {
            AgentError::Configuration(format!(
                "Failed to read API key from env var '{}': {}",
                env_var, e
            ))
        })?;
        keys.push(key);
    }

    if keys.is_empty() {
        return Err(AgentError::Configuration(format!(
            "Provider '{}' has no API keys configured",
            provider.name
        )));
    }

    keys.into_iter()
        .enumerate()
        .map(|(i, key)| {
            create_agent(
                format!("{}-{}", provider.name, i),
                provider.url.clone(),
                provider.model.clone(),
                provider.backend_type,
                Some(key),
                Arc::clone(&client),
            )
        })
        .collect()
}
