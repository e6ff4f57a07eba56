//! Wiring of the examine pipeline from configuration.

use super::stages::{
    ConfigurationStageBuilder, CreditPolicy, CreditStageBuilder, LoggingStageBuilder,
    QuestionExamineStageBuilder, RecordStageBuilder,
};
use super::{BusinessKey, Composition, CompositionBuilder, FacadeDispatcher, PlatformHandler};
use crate::config::ExamenConfig;
use crate::ledger::CreditLedger;
use crate::routing::BackendPool;
use crate::store::RecordStore;
use std::sync::Arc;

/// Assemble Logging → Configuration → Credit → Record → QuestionExamine
/// around a platform handler over `pool`.
pub fn build_examine_pipeline(
    config: &ExamenConfig,
    pool: BackendPool,
    ledger: Arc<dyn CreditLedger>,
    records: Arc<dyn RecordStore>,
) -> Composition {
    let unit_price = config.pipeline.unit_price;
    let platform = Arc::new(PlatformHandler::new(pool, unit_price));

    CompositionBuilder::new()
        .add(Arc::new(LoggingStageBuilder::new(
            config.logging.enable_content_logging,
            config.logging.preview_chars,
        )))
        .add(Arc::new(ConfigurationStageBuilder::from_config(
            &config.businesses,
        )))
        .add(Arc::new(CreditStageBuilder::new(
            ledger,
            CreditPolicy::from_config(&config.credit, unit_price),
        )))
        .add(Arc::new(RecordStageBuilder::new(records)))
        .add(Arc::new(QuestionExamineStageBuilder::new()))
        .build(platform)
}

/// Facade with the examine pipeline registered under `question_examine`
/// and under every configured business that routes to it.
pub fn build_facade(
    config: &ExamenConfig,
    pool: BackendPool,
    ledger: Arc<dyn CreditLedger>,
    records: Arc<dyn RecordStore>,
) -> FacadeDispatcher {
    let examine = Arc::new(build_examine_pipeline(config, pool, ledger, records));
    tracing::debug!(stages = ?examine.list_stages(), "Examine pipeline assembled");

    let mut facade = FacadeDispatcher::new().register(BusinessKey::QuestionExamine, examine.clone());
    for (key, settings) in &config.businesses {
        if settings.route_as == Some(BusinessKey::QuestionExamine) {
            facade = facade.register(BusinessKey::from(key.clone()), examine.clone());
        }
    }
    facade
}
