//! Middleware stages
//!
//! Each stage is produced by a [`StageBuilder`](super::StageBuilder) and
//! wraps the next handler in the chain.

mod configuration;
mod credit;
mod examine;
mod logging;
mod record;

pub use configuration::ConfigurationStageBuilder;
pub use credit::{CreditPolicy, CreditStageBuilder};
pub use examine::{render_prompt, QuestionExamineStageBuilder, DEFAULT_EXAMINE_TEMPLATE};
pub use logging::LoggingStageBuilder;
pub use record::RecordStageBuilder;
