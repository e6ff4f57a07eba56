//! Error types for backend pool construction

use thiserror::Error;

/// Errors raised while assembling a backend pool
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    /// A pool needs at least one adapter; selection never fails afterwards
    #[error("Backend pool '{provider}' has no adapters")]
    Empty { provider: String },
}
