//! Record stage: persist each successful invocation once.

use crate::pipeline::{
    GradingRequest, GradingResponse, Handler, PipelineError, RequestContext, StageBuilder,
};
use crate::store::{InvocationRecord, RecordStore};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

/// Builds the stage writing an [`InvocationRecord`] keyed by trial id.
#[derive(Clone)]
pub struct RecordStageBuilder {
    store: Arc<dyn RecordStore>,
}

impl RecordStageBuilder {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

impl StageBuilder for RecordStageBuilder {
    fn name(&self) -> &str {
        "record"
    }

    fn build(&self, next: Arc<dyn Handler>) -> Arc<dyn Handler> {
        Arc::new(RecordStage {
            store: Arc::clone(&self.store),
            next,
        })
    }
}

struct RecordStage {
    store: Arc<dyn RecordStore>,
    next: Arc<dyn Handler>,
}

#[async_trait]
impl Handler for RecordStage {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: GradingRequest,
    ) -> Result<GradingResponse, PipelineError> {
        let trial_id = request.trial_id.clone();
        let user_id = request.user_id;
        let business = request.business.to_string();

        let response = self.next.handle(ctx, request).await?;

        let record = InvocationRecord {
            trial_id: trial_id.clone(),
            user_id,
            business,
            tokens: response.tokens(),
            cost: response.cost(),
            answer: response.answer().to_string(),
            created_at: Utc::now(),
        };

        // The call completed and will be billed; a lost record must not
        // discard the response.
        match self.store.insert_record_if_absent(record).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(trial_id = %trial_id, "Invocation record already present");
            }
            Err(e) => {
                tracing::warn!(
                    trial_id = %trial_id,
                    user_id,
                    error = %e,
                    "Failed to persist invocation record"
                );
            }
        }

        Ok(response)
    }
}
