//! Business-keyed dispatch across assembled pipelines.

use super::{BusinessKey, GradingRequest, GradingResponse, Handler, PipelineError, RequestContext};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Single entry point for callers; routes by `request.business`.
#[derive(Default)]
pub struct FacadeDispatcher {
    routes: HashMap<BusinessKey, Arc<dyn Handler>>,
}

impl FacadeDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the pipeline for a business key, replacing any previous one.
    pub fn register(mut self, business: BusinessKey, handler: Arc<dyn Handler>) -> Self {
        self.routes.insert(business, handler);
        self
    }

    /// Registered business keys, sorted
    pub fn businesses(&self) -> Vec<&BusinessKey> {
        let mut keys: Vec<&BusinessKey> = self.routes.keys().collect();
        keys.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        keys
    }

    /// Route a request to its business pipeline.
    ///
    /// An unknown business key is a wiring defect: it is logged at error
    /// level and returned as `PipelineError::UnknownBusiness`.
    pub async fn dispatch(
        &self,
        ctx: &RequestContext,
        request: GradingRequest,
    ) -> Result<GradingResponse, PipelineError> {
        match self.routes.get(&request.business) {
            Some(handler) => handler.handle(ctx, request).await,
            None => {
                tracing::error!(
                    business = %request.business,
                    trial_id = %request.trial_id,
                    "No pipeline registered for business key"
                );
                Err(PipelineError::UnknownBusiness(request.business.to_string()))
            }
        }
    }
}

#[async_trait]
impl Handler for FacadeDispatcher {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: GradingRequest,
    ) -> Result<GradingResponse, PipelineError> {
        self.dispatch(ctx, request).await
    }
}
