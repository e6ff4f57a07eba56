//! Error types for pipeline execution

use crate::agent::AgentError;
use crate::ledger::LedgerError;
use crate::store::StoreError;
use thiserror::Error;

/// Errors a pipeline run can end with.
///
/// Stages pass errors from the stage they wrap through unchanged; only the
/// stage that detects a condition creates the matching variant.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    /// Admission control refused the request before any billable work
    #[error("Insufficient credit: {available} available, {required} required")]
    InsufficientCredit { available: i64, required: i64 },

    /// The trial id was already settled; the request was not re-run
    #[error("Trial '{0}' was already processed")]
    DuplicateTrial(String),

    /// Failure reported by the backend adapter, including deadline expiry
    #[error("Backend call failed: {0}")]
    Backend(#[from] AgentError),

    /// The caller cancelled the request
    #[error("Request cancelled")]
    Cancelled,

    /// No pipeline is registered for the business key (wiring defect)
    #[error("No pipeline registered for business '{0}'")]
    UnknownBusiness(String),

    /// A stage received a request it cannot process
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl PipelineError {
    pub fn is_insufficient_credit(&self) -> bool {
        matches!(self, PipelineError::InsufficientCredit { .. })
    }

    /// Deployment or wiring defect rather than a request failure.
    pub fn is_configuration(&self) -> bool {
        matches!(self, PipelineError::UnknownBusiness(_))
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::InsufficientCredit { .. } => "insufficient_credit",
            PipelineError::DuplicateTrial(_) => "duplicate_trial",
            PipelineError::Backend(AgentError::Timeout(_)) => "timeout",
            PipelineError::Backend(_) => "backend",
            PipelineError::Cancelled => "cancelled",
            PipelineError::UnknownBusiness(_) => "configuration",
            PipelineError::InvalidRequest(_) => "invalid_request",
            PipelineError::Ledger(_) => "ledger",
            PipelineError::Store(_) => "store",
        }
    }
}
