//! Examination errors and their public form

use crate::pipeline::PipelineError;
use crate::store::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message shown for every failure that is not the caller's to fix.
pub const SYSTEM_ERROR_MESSAGE: &str = "The examination could not be completed, please try again later";

/// Errors returned by [`ExaminationService`](super::ExaminationService)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExamError {
    /// The question does not exist or is not published; nothing was billed
    #[error("Question {0} not found")]
    NotFound(i64),

    /// Admission control refused the request; nothing was billed or stored
    #[error("Insufficient credit: {available} available, {required} required")]
    InsufficientCredit { available: i64, required: i64 },

    #[error("Pipeline error: {0}")]
    Pipeline(PipelineError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<PipelineError> for ExamError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InsufficientCredit {
                available,
                required,
            } => ExamError::InsufficientCredit {
                available,
                required,
            },
            other => ExamError::Pipeline(other),
        }
    }
}

/// Error body safe to hand to end users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicError {
    /// Stable machine-readable code
    pub code: String,
    pub message: String,
}

impl ExamError {
    pub fn is_insufficient_credit(&self) -> bool {
        matches!(self, ExamError::InsufficientCredit { .. })
    }

    /// Stable public code: `insufficient_credit`, `question_not_found` or
    /// `system_error`.
    pub fn code(&self) -> &'static str {
        match self {
            ExamError::InsufficientCredit { .. } => "insufficient_credit",
            ExamError::NotFound(_) => "question_not_found",
            ExamError::Pipeline(_) | ExamError::Store(_) => "system_error",
        }
    }

    /// Public form of this error. Internal details never leak into it.
    pub fn public_error(&self) -> PublicError {
        let message = match self {
            ExamError::InsufficientCredit { .. } => {
                "Your balance is too low for this examination, please top up".to_string()
            }
            ExamError::NotFound(id) => format!("Question {} not found", id),
            ExamError::Pipeline(_) | ExamError::Store(_) => SYSTEM_ERROR_MESSAGE.to_string(),
        };

        PublicError {
            code: self.code().to_string(),
            message,
        }
    }
}
