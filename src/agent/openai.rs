//! OpenAI-compatible agent implementation.
//!
//! Covers OpenAI itself and every provider exposing the same
//! `/v1/chat/completions` contract (DashScope compatible mode, vLLM, etc.).

use super::{AgentError, AgentProfile, Completion, CompletionAgent, Invocation};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const CHAT_TIMEOUT_MS: u64 = 120_000;

/// OpenAI-compatible agent.
///
/// Chat completion via POST /v1/chat/completions, with Bearer authentication
/// when an API key is configured.
pub struct OpenAIAgent {
    /// Unique agent ID
    id: String,
    /// Human-readable name
    name: String,
    /// Base URL (e.g., "https://api.openai.com")
    base_url: String,
    /// Model sent with every request
    model: String,
    /// API key for Bearer authentication (None for unauthenticated generic servers)
    api_key: Option<String>,
    /// "openai" or "generic"
    backend_type: &'static str,
    /// Shared HTTP client for connection pooling
    client: Arc<Client>,
}

impl OpenAIAgent {
    pub fn new(
        id: String,
        name: String,
        base_url: String,
        model: String,
        api_key: String,
        client: Arc<Client>,
    ) -> Self {
        Self {
            id,
            name,
            base_url,
            model,
            api_key: Some(api_key),
            backend_type: "openai",
            client,
        }
    }

    /// Agent for an OpenAI-compatible server that needs no credential.
    pub fn generic(
        id: String,
        name: String,
        base_url: String,
        model: String,
        client: Arc<Client>,
    ) -> Self {
        Self {
            id,
            name,
            base_url,
            model,
            api_key: None,
            backend_type: "generic",
            client,
        }
    }

    fn build_request(&self, invocation: &Invocation) -> ChatRequest {
        let mut messages = Vec::with_capacity(invocation.segments.len() + 1);
        if let Some(system) = &invocation.system_prompt {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.extend(invocation.segments.iter().map(|s| ChatMessage {
            role: "user".to_string(),
            content: s.clone(),
        }));

        ChatRequest {
            model: self.model.clone(),
            messages,
            max_tokens: invocation.max_tokens,
            temperature: invocation.temperature,
            stream: false,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatUsage {
    total_tokens: u32,
}

#[async_trait]
impl CompletionAgent for OpenAIAgent {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn profile(&self) -> AgentProfile {
        AgentProfile {
            backend_type: self.backend_type.to_string(),
            model: self.model.clone(),
        }
    }

    async fn invoke(&self, invocation: &Invocation) -> Result<Completion, AgentError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let mut builder = self
            .client
            .post(&url)
            .json(&self.build_request(invocation))
            .timeout(Duration::from_millis(CHAT_TIMEOUT_MS));
        if let Some(key) = &self.api_key {
            builder = builder.header("authorization", format!("Bearer {}", key));
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                AgentError::Timeout(CHAT_TIMEOUT_MS)
            } else {
                AgentError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AgentError::Upstream {
                status: status.as_u16(),
                message: error_body,
            });
        }

        let completion: ChatResponse = response.json().await.map_err(|e| {
            AgentError::InvalidResponse(format!("Failed to parse completion response: {}", e))
        })?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AgentError::InvalidResponse("Response has no choices".to_string()))?;

        Ok(Completion {
            tokens: completion.usage.map(|u| u.total_tokens).unwrap_or(0),
            text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn test_agent(base_url: String, api_key: &str) -> OpenAIAgent {
        OpenAIAgent::new(
            "qwen-0".to_string(),
            "Qwen #0".to_string(),
            base_url,
            "qwen-plus".to_string(),
            api_key.to_string(),
            Arc::new(Client::new()),
        )
    }

    #[tokio::test]
    async fn test_invoke_with_bearer_auth() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test123")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "qwen-plus",
                "messages": [
                    {"role": "system", "content": "grade"},
                    {"role": "user", "content": "What is a mutex?"}
                ]
            })))
            .with_status(200)
            .with_body(r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"最终评分\n3\nok"}}],"usage":{"prompt_tokens":40,"completion_tokens":2,"total_tokens":42}}"#)
            .create_async()
            .await;

        let agent = test_agent(server.url(), "sk-test123");
        let invocation = Invocation {
            segments: vec!["What is a mutex?".to_string()],
            system_prompt: Some("grade".to_string()),
            ..Default::default()
        };
        let completion = agent.invoke(&invocation).await.unwrap();

        mock.assert_async().await;
        assert_eq!(completion.tokens, 42);
        assert_eq!(completion.text, "最终评分\n3\nok");
    }

    #[tokio::test]
    async fn test_invoke_upstream_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .with_body("rate limited")
            .create_async()
            .await;

        let agent = test_agent(server.url(), "sk-test");
        let err = agent
            .invoke(&Invocation::from_segments(vec!["q".to_string()]))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert_eq!(
            err,
            AgentError::Upstream {
                status: 429,
                message: "rate limited".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_invoke_without_choices_is_invalid() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let agent = test_agent(server.url(), "sk-test");
        let err = agent
            .invoke(&Invocation::from_segments(vec!["q".to_string()]))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_generic_agent_sends_no_auth() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"hi"}}]}"#)
            .create_async()
            .await;

        let agent = OpenAIAgent::generic(
            "local-0".to_string(),
            "Local".to_string(),
            server.url(),
            "llama3".to_string(),
            Arc::new(Client::new()),
        );
        let completion = agent
            .invoke(&Invocation::from_segments(vec!["q".to_string()]))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(completion.tokens, 0);
        assert_eq!(agent.profile().backend_type, "generic");
    }

    #[tokio::test]
    async fn test_network_error() {
        let agent = test_agent("http://invalid:9999".to_string(), "sk-test");
        let result = agent
            .invoke(&Invocation::from_segments(vec!["q".to_string()]))
            .await;

        assert!(matches!(result, Err(AgentError::Network(_))));
    }
}
