//! Configuration stage: per-business parameter injection.

use crate::config::BusinessConfig;
use crate::pipeline::{
    BusinessKey, GradingRequest, GradingResponse, Handler, PipelineError, RequestContext,
    StageBuilder,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Builds the stage that fills in parameters from `[businesses.<key>]`.
///
/// Values already present on the request win over configured defaults.
/// A configured `route_as` rewrites the request's business key.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationStageBuilder {
    businesses: Arc<HashMap<BusinessKey, BusinessConfig>>,
}

impl ConfigurationStageBuilder {
    pub fn new(businesses: HashMap<BusinessKey, BusinessConfig>) -> Self {
        Self {
            businesses: Arc::new(businesses),
        }
    }

    /// Build from the string-keyed map found in configuration files.
    pub fn from_config(businesses: &HashMap<String, BusinessConfig>) -> Self {
        Self::new(
            businesses
                .iter()
                .map(|(key, settings)| (BusinessKey::from(key.clone()), settings.clone()))
                .collect(),
        )
    }
}

impl StageBuilder for ConfigurationStageBuilder {
    fn name(&self) -> &str {
        "configuration"
    }

    fn build(&self, next: Arc<dyn Handler>) -> Arc<dyn Handler> {
        Arc::new(ConfigurationStage {
            businesses: Arc::clone(&self.businesses),
            next,
        })
    }
}

struct ConfigurationStage {
    businesses: Arc<HashMap<BusinessKey, BusinessConfig>>,
    next: Arc<dyn Handler>,
}

/// Fill parameters the request does not carry yet from `settings`.
fn fill_missing(request: &mut GradingRequest, settings: &BusinessConfig) {
    let defaults = settings.parameters();
    let params = &mut request.parameters;
    params.system_prompt = params.system_prompt.take().or(defaults.system_prompt);
    params.prompt_template = params.prompt_template.take().or(defaults.prompt_template);
    params.max_tokens = params.max_tokens.or(defaults.max_tokens);
    params.temperature = params.temperature.or(defaults.temperature);
}

#[async_trait]
impl Handler for ConfigurationStage {
    async fn handle(
        &self,
        ctx: &RequestContext,
        mut request: GradingRequest,
    ) -> Result<GradingResponse, PipelineError> {
        if let Some(settings) = self.businesses.get(&request.business) {
            fill_missing(&mut request, settings);

            if let Some(target) = &settings.route_as {
                tracing::debug!(
                    trial_id = %request.trial_id,
                    from = %request.business,
                    to = %target,
                    "Business key overridden"
                );
                request.business = target.clone();

                // Alias settings win; the target fills the rest. One hop only.
                if let Some(target_settings) = self.businesses.get(target) {
                    fill_missing(&mut request, target_settings);
                }
            }
        }

        self.next.handle(ctx, request).await
    }
}
