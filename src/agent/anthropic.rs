//! Anthropic Claude agent implementation.
//!
//! Sends the input segments as text blocks of a single user turn through the
//! Messages API.

use super::{AgentError, AgentProfile, Completion, CompletionAgent, Invocation};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;
const MESSAGES_TIMEOUT_MS: u64 = 120_000;

/// Anthropic agent implementation.
///
/// Handles Anthropic Claude API calls with API key authentication via the
/// `x-api-key` header against POST /v1/messages.
pub struct AnthropicAgent {
    /// Unique agent ID
    id: String,
    /// Human-readable name
    name: String,
    /// Base URL (e.g., "https://api.anthropic.com")
    base_url: String,
    /// Claude model identifier
    model: String,
    /// API key for x-api-key authentication
    api_key: String,
    /// Shared HTTP client for connection pooling
    client: Arc<Client>,
}

impl AnthropicAgent {
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
            api_key,
            client,
        }
    }

    fn translate_request(&self, invocation: &Invocation) -> AnthropicRequest {
        let content = invocation
            .segments
            .iter()
            .map(|text| AnthropicContent {
                content_type: "text".to_string(),
                text: text.clone(),
            })
            .collect();

        AnthropicRequest {
            model: self.model.clone(),
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content,
            }],
            system: invocation.system_prompt.clone(),
            max_tokens: invocation.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: invocation.temperature,
        }
    }

    fn translate_response(response: AnthropicResponse) -> Completion {
        let text = response
            .content
            .into_iter()
            .filter(|c| c.content_type == "text")
            .map(|c| c.text)
            .collect::<Vec<_>>()
            .join("");

        Completion {
            tokens: u32::try_from(
                response
                    .usage
                    .input_tokens
                    .saturating_add(response.usage.output_tokens),
            )
            .unwrap_or(u32::MAX),
            text,
        }
    }
}

/// Anthropic request format
#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Serialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    content_type: String,
    text: String,
}

/// Anthropic response format
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentResponse>,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
struct AnthropicContentResponse {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u64,
    output_tokens: u64,
}

#[async_trait]
impl CompletionAgent for AnthropicAgent {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn profile(&self) -> AgentProfile {
        AgentProfile {
            backend_type: "anthropic".to_string(),
            model: self.model.clone(),
        }
    }

    async fn invoke(&self, invocation: &Invocation) -> Result<Completion, AgentError> {
        let url = format!("{}/v1/messages", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&self.translate_request(invocation))
            .timeout(Duration::from_millis(MESSAGES_TIMEOUT_MS))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AgentError::Timeout(MESSAGES_TIMEOUT_MS)
                } else {
                    AgentError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status.as_u16() == 401 || status.as_u16() == 403 {
                tracing::warn!(agent = %self.id, status = %status, "Anthropic authentication failed");
            }
            return Err(AgentError::Upstream {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: AnthropicResponse = response.json().await.map_err(|e| {
            AgentError::InvalidResponse(format!("Failed to parse Anthropic response: {}", e))
        })?;

        Ok(Self::translate_response(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn test_agent(base_url: String) -> AnthropicAgent {
        AnthropicAgent::new(
            "claude-0".to_string(),
            "Claude #0".to_string(),
            base_url,
            "claude-3-haiku-20240307".to_string(),
            "sk-ant-test".to_string(),
            Arc::new(Client::new()),
        )
    }

    #[test]
    fn test_translate_request_packs_segments_into_one_turn() {
        let agent = test_agent("http://unused".to_string());
        let invocation = Invocation {
            segments: vec!["title".to_string(), "answer".to_string()],
            system_prompt: Some("be strict".to_string()),
            max_tokens: None,
            temperature: Some(0.2),
        };

        let request = agent.translate_request(&invocation);

        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].content.len(), 2);
        assert_eq!(request.system.as_deref(), Some("be strict"));
        assert_eq!(request.max_tokens, DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn test_translate_response_saturates_usage() {
        let response: AnthropicResponse = serde_json::from_str(
            r#"{"content":[{"type":"text","text":"ok"}],"usage":{"input_tokens":4294967295,"output_tokens":10}}"#,
        )
        .unwrap();

        let completion = AnthropicAgent::translate_response(response);

        assert_eq!(completion.tokens, u32::MAX);
        assert_eq!(completion.text, "ok");
    }

    #[tokio::test]
    async fn test_invoke_sums_usage() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "sk-ant-test")
            .match_header("anthropic-version", ANTHROPIC_VERSION)
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "claude-3-haiku-20240307"
            })))
            .with_status(200)
            .with_body(r#"{"id":"msg_1","type":"message","role":"assistant","model":"claude-3-haiku-20240307","content":[{"type":"text","text":"最终评分\n7\n"}],"stop_reason":"end_turn","usage":{"input_tokens":30,"output_tokens":5}}"#)
            .create_async()
            .await;

        let agent = test_agent(server.url());
        let completion = agent
            .invoke(&Invocation::from_segments(vec!["q".to_string()]))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(completion.tokens, 35);
        assert_eq!(completion.text, "最终评分\n7\n");
    }

    #[tokio::test]
    async fn test_invoke_auth_failure_is_upstream_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/messages")
            .with_status(401)
            .with_body("invalid x-api-key")
            .create_async()
            .await;

        let agent = test_agent(server.url());
        let err = agent
            .invoke(&Invocation::from_segments(vec!["q".to_string()]))
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::Upstream { status: 401, .. }));
    }
}
