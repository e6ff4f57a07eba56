//! Credit stage: admission control before the call, idempotent debit after.

use crate::agent::heuristic_tokens;
use crate::config::CreditConfig;
use crate::ledger::{CreditLedger, DebitOutcome, LedgerError};
use crate::pipeline::{
    GradingRequest, GradingResponse, Handler, PipelineError, RequestContext, StageBuilder,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Pricing knobs for admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditPolicy {
    /// Same unit price as the terminal platform handler
    pub unit_price: i64,
    /// Floor the balance must reach whatever the estimate
    pub minimum_balance: i64,
    /// Output tokens assumed per 100 prompt tokens
    pub output_ratio: u32,
}

impl CreditPolicy {
    pub fn from_config(config: &CreditConfig, unit_price: i64) -> Self {
        Self {
            unit_price,
            minimum_balance: config.minimum_balance,
            output_ratio: config.estimate_output_ratio,
        }
    }

    /// Estimated cost of running `inputs` through the backend.
    pub fn estimate(&self, inputs: &[String]) -> i64 {
        let prompt_tokens = i64::from(heuristic_tokens(inputs));
        let total_tokens = prompt_tokens * (100 + i64::from(self.output_ratio)) / 100;
        total_tokens.saturating_mul(self.unit_price)
    }

    /// Balance needed to admit a request with the given inputs.
    pub fn required(&self, inputs: &[String]) -> i64 {
        self.estimate(inputs).max(self.minimum_balance)
    }
}

/// Builds the credit stage around a shared ledger.
#[derive(Clone)]
pub struct CreditStageBuilder {
    ledger: Arc<dyn CreditLedger>,
    policy: CreditPolicy,
}

impl CreditStageBuilder {
    pub fn new(ledger: Arc<dyn CreditLedger>, policy: CreditPolicy) -> Self {
        Self { ledger, policy }
    }
}

impl StageBuilder for CreditStageBuilder {
    fn name(&self) -> &str {
        "credit"
    }

    fn build(&self, next: Arc<dyn Handler>) -> Arc<dyn Handler> {
        Arc::new(CreditStage {
            ledger: Arc::clone(&self.ledger),
            policy: self.policy,
            next,
        })
    }
}

struct CreditStage {
    ledger: Arc<dyn CreditLedger>,
    policy: CreditPolicy,
    next: Arc<dyn Handler>,
}

impl CreditStage {
    /// Settle a completed call. The work is done, so settlement problems are
    /// logged and never turn a successful response into an error.
    async fn settle(&self, request_user: i64, trial_id: &str, cost: i64) {
        match self.ledger.debit(request_user, trial_id, cost).await {
            Ok(DebitOutcome::Applied { remaining }) => {
                debug!(
                    trial_id,
                    user_id = request_user,
                    cost,
                    remaining,
                    "Debit applied"
                );
            }
            Ok(DebitOutcome::AlreadyApplied) => {
                debug!(trial_id, user_id = request_user, "Debit already applied");
            }
            Err(LedgerError::InsufficientBalance {
                available,
                required,
            }) => {
                warn!(
                    trial_id,
                    user_id = request_user,
                    available,
                    required,
                    "Ledger refused settlement of a completed call"
                );
            }
            Err(e) => {
                warn!(
                    trial_id,
                    user_id = request_user,
                    cost,
                    error = %e,
                    "Settlement failed"
                );
            }
        }
    }
}

#[async_trait]
impl Handler for CreditStage {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: GradingRequest,
    ) -> Result<GradingResponse, PipelineError> {
        if self.ledger.is_applied(&request.trial_id).await? {
            warn!(
                trial_id = %request.trial_id,
                user_id = request.user_id,
                "Replayed trial rejected"
            );
            return Err(PipelineError::DuplicateTrial(request.trial_id));
        }

        let required = self.policy.required(&request.inputs);
        let available = self.ledger.balance(request.user_id).await?;
        if available < required {
            debug!(
                trial_id = %request.trial_id,
                user_id = request.user_id,
                available,
                required,
                "Admission refused"
            );
            return Err(PipelineError::InsufficientCredit {
                available,
                required,
            });
        }

        let user_id = request.user_id;
        let trial_id = request.trial_id.clone();
        let response = self.next.handle(ctx, request).await?;

        self.settle(user_id, &trial_id, response.cost()).await;
        Ok(response)
    }
}
