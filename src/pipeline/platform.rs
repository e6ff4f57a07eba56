//! Terminal stage: one round-robin adapter call, priced.

use super::{GradingRequest, GradingResponse, Handler, PipelineError, RequestContext};
use crate::agent::Invocation;
use crate::routing::BackendPool;
use async_trait::async_trait;
use std::time::Instant;

/// Calls the next adapter of its pool and prices the result.
///
/// Errors from the adapter are returned unchanged; there is no retry here.
#[derive(Debug)]
pub struct PlatformHandler {
    pool: BackendPool,
    /// Cost per token in the smallest currency unit
    unit_price: i64,
}

impl PlatformHandler {
    pub fn new(pool: BackendPool, unit_price: i64) -> Self {
        Self { pool, unit_price }
    }

    pub fn unit_price(&self) -> i64 {
        self.unit_price
    }

    pub fn provider(&self) -> &str {
        self.pool.provider()
    }
}

#[async_trait]
impl Handler for PlatformHandler {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: GradingRequest,
    ) -> Result<GradingResponse, PipelineError> {
        let agent = self.pool.select();
        let invocation = Invocation {
            segments: request.inputs,
            system_prompt: request.parameters.system_prompt,
            max_tokens: request.parameters.max_tokens,
            temperature: request.parameters.temperature,
        };

        let start = Instant::now();
        let completion = ctx.guard(agent.invoke(&invocation)).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match completion {
            Ok(completion) => {
                tracing::debug!(
                    trial_id = %request.trial_id,
                    agent = %agent.id(),
                    tokens = completion.tokens,
                    latency_ms,
                    "Backend call completed"
                );
                Ok(GradingResponse::priced(
                    completion.tokens,
                    completion.text,
                    self.unit_price,
                ))
            }
            Err(err) => {
                tracing::debug!(
                    trial_id = %request.trial_id,
                    agent = %agent.id(),
                    error = %err,
                    latency_ms,
                    "Backend call failed"
                );
                Err(err)
            }
        }
    }
}
