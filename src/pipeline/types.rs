//! Request, response and context types flowing through the pipeline.

use crate::agent::AgentError;
use crate::pipeline::PipelineError;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Selects which assembled pipeline handles a request.
///
/// Known businesses are variants; anything else is carried as `Custom` so a
/// new business can be wired up from configuration alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BusinessKey {
    /// Grading a user's answer to an interview question
    QuestionExamine,
    /// Business registered outside this crate
    Custom(String),
}

impl BusinessKey {
    pub fn as_str(&self) -> &str {
        match self {
            BusinessKey::QuestionExamine => "question_examine",
            BusinessKey::Custom(key) => key,
        }
    }
}

impl From<String> for BusinessKey {
    fn from(key: String) -> Self {
        match key.as_str() {
            "question_examine" => BusinessKey::QuestionExamine,
            _ => BusinessKey::Custom(key),
        }
    }
}

impl From<BusinessKey> for String {
    fn from(key: BusinessKey) -> Self {
        key.as_str().to_string()
    }
}

impl FromStr for BusinessKey {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(BusinessKey::from(s.to_string()))
    }
}

impl std::fmt::Display for BusinessKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-business knobs injected by the configuration stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// One grading call. Stages that change it pass a modified copy downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingRequest {
    pub user_id: i64,
    /// Fresh per invocation; idempotency key for billing and records
    pub trial_id: String,
    pub business: BusinessKey,
    pub inputs: Vec<String>,
    #[serde(default)]
    pub parameters: RequestParameters,
}

impl GradingRequest {
    pub fn new(
        user_id: i64,
        trial_id: impl Into<String>,
        business: BusinessKey,
        inputs: Vec<String>,
    ) -> Self {
        Self {
            user_id,
            trial_id: trial_id.into(),
            business,
            inputs,
            parameters: RequestParameters::default(),
        }
    }
}

/// Result of a successful pipeline run.
///
/// The cost is always `tokens * unit_price` of the platform that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradingResponse {
    tokens: u32,
    cost: i64,
    answer: String,
}

impl GradingResponse {
    pub fn priced(tokens: u32, answer: String, unit_price: i64) -> Self {
        Self {
            tokens,
            cost: i64::from(tokens).saturating_mul(unit_price),
            answer,
        }
    }

    pub fn tokens(&self) -> u32 {
        self.tokens
    }

    pub fn cost(&self) -> i64 {
        self.cost
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn into_answer(self) -> String {
        self.answer
    }
}

/// Caller-supplied deadline and cancellation signal, shared by every stage.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    deadline: Option<(Instant, Duration)>,
    cancel: CancellationToken,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context whose backend call must finish within `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some((Instant::now() + timeout, timeout)),
            cancel: CancellationToken::new(),
        }
    }

    /// Attach a cancellation token owned by the caller.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline.map(|(at, _)| at)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Run a backend call under this context's deadline and cancellation.
    ///
    /// Expiry surfaces as `AgentError::Timeout` so upstream stages treat it
    /// like any other backend failure; cancellation as `PipelineError::Cancelled`.
    /// Either way the call future is dropped, aborting the request.
    pub async fn guard<F, T>(&self, call: F) -> Result<T, PipelineError>
    where
        F: Future<Output = Result<T, AgentError>>,
    {
        let bounded = async {
            match self.deadline {
                Some((at, timeout)) => match tokio::time::timeout_at(at, call).await {
                    Ok(result) => result,
                    Err(_) => Err(AgentError::Timeout(timeout.as_millis() as u64)),
                },
                None => call.await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(PipelineError::Cancelled),
            result = bounded => result.map_err(PipelineError::Backend),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_key_known_and_custom() {
        assert_eq!(
            "question_examine".parse::<BusinessKey>().unwrap(),
            BusinessKey::QuestionExamine
        );
        assert_eq!(
            "resume_review".parse::<BusinessKey>().unwrap(),
            BusinessKey::Custom("resume_review".to_string())
        );
        assert_eq!(BusinessKey::QuestionExamine.to_string(), "question_examine");
    }

    #[test]
    fn business_key_serde_as_string() {
        let json = serde_json::to_string(&BusinessKey::QuestionExamine).unwrap();
        assert_eq!(json, "\"question_examine\"");
        let key: BusinessKey = serde_json::from_str("\"other\"").unwrap();
        assert_eq!(key, BusinessKey::Custom("other".to_string()));
    }

    #[test]
    fn response_cost_is_derived() {
        let response = GradingResponse::priced(120, "ok".to_string(), 3);
        assert_eq!(response.tokens(), 120);
        assert_eq!(response.cost(), 360);
    }

    #[test]
    fn response_cost_saturates_at_i64_max() {
        let response = GradingResponse::priced(u32::MAX, "ok".to_string(), i64::MAX / 2);
        assert_eq!(response.cost(), i64::MAX);
    }

    #[tokio::test]
    async fn guard_passes_through_success() {
        let ctx = RequestContext::new();
        let value = ctx.guard(async { Ok::<_, AgentError>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn guard_maps_deadline_to_backend_timeout() {
        let ctx = RequestContext::with_timeout(Duration::from_millis(20));
        let result = ctx
            .guard(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, AgentError>(())
            })
            .await;

        assert!(matches!(
            result,
            Err(PipelineError::Backend(AgentError::Timeout(20)))
        ));
    }

    #[tokio::test]
    async fn guard_observes_cancellation() {
        let token = CancellationToken::new();
        let ctx = RequestContext::new().with_cancellation(token.clone());
        token.cancel();

        let result = ctx
            .guard(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, AgentError>(())
            })
            .await;

        assert!(matches!(result, Err(PipelineError::Cancelled)));
        assert!(ctx.is_cancelled());
    }
}
