//! Logging stage: one inbound and one outbound event per request.

use crate::logging::{extract_status, truncate_inputs};
use crate::pipeline::{
    GradingRequest, GradingResponse, Handler, PipelineError, RequestContext, StageBuilder,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Builds the outermost observability stage.
///
/// The stage never alters the request or the result and never short-circuits.
#[derive(Debug, Clone, Default)]
pub struct LoggingStageBuilder {
    enable_content_logging: bool,
    preview_chars: usize,
}

impl LoggingStageBuilder {
    pub fn new(enable_content_logging: bool, preview_chars: usize) -> Self {
        Self {
            enable_content_logging,
            preview_chars,
        }
    }
}

impl StageBuilder for LoggingStageBuilder {
    fn name(&self) -> &str {
        "logging"
    }

    fn build(&self, next: Arc<dyn Handler>) -> Arc<dyn Handler> {
        Arc::new(LoggingStage {
            enable_content_logging: self.enable_content_logging,
            preview_chars: self.preview_chars,
            next,
        })
    }
}

struct LoggingStage {
    enable_content_logging: bool,
    preview_chars: usize,
    next: Arc<dyn Handler>,
}

#[async_trait]
impl Handler for LoggingStage {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: GradingRequest,
    ) -> Result<GradingResponse, PipelineError> {
        let start = Instant::now();
        let trial_id = request.trial_id.clone();
        let user_id = request.user_id;
        let business = request.business.to_string();
        let preview = truncate_inputs(
            &request.inputs,
            self.enable_content_logging,
            self.preview_chars,
        );

        info!(
            trial_id = %trial_id,
            user_id,
            business = %business,
            segments = request.inputs.len(),
            answer_preview = preview.as_deref(),
            "Pipeline request received"
        );

        let result = self.next.handle(ctx, request).await;

        let elapsed = start.elapsed();
        let latency_ms = elapsed.as_millis() as u64;
        let (status, error_message) = extract_status(&result);

        metrics::counter!("examen_pipeline_requests_total",
            "business" => business.clone(),
            "status" => status
        )
        .increment(1);

        metrics::histogram!("examen_pipeline_duration_seconds",
            "business" => business.clone()
        )
        .record(elapsed.as_secs_f64());

        match &result {
            Ok(response) => {
                info!(
                    trial_id = %trial_id,
                    user_id,
                    business = %business,
                    tokens = response.tokens(),
                    cost = response.cost(),
                    latency_ms,
                    status,
                    "Pipeline request completed"
                );
            }
            Err(_) => {
                metrics::counter!("examen_pipeline_errors_total",
                    "business" => business.clone(),
                    "error_type" => status
                )
                .increment(1);

                warn!(
                    trial_id = %trial_id,
                    user_id,
                    business = %business,
                    latency_ms,
                    status,
                    error_message = error_message.as_deref(),
                    "Pipeline request failed"
                );
            }
        }

        result
    }
}
