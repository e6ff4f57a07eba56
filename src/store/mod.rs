//! Storage seams
//!
//! Questions, per-invocation records and examination trials live behind
//! traits so the pipeline can run against a database or the in-memory
//! implementations in [`memory`].

use crate::grading::GradeOutcome;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

pub mod memory;

pub use memory::{InMemoryQuestions, InMemoryRecords, InMemoryTrials};

/// Storage failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The storage backend could not be reached or rejected the write
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// A stored value could not be encoded or decoded
    #[error("Storage encoding error: {0}")]
    Encoding(String),
}

/// Reference answer split by depth tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalAnswer {
    /// Key points and common pitfalls
    pub analysis: String,
    /// What a 15K-tier answer must cover
    pub basic: String,
    /// What a 25K-tier answer adds
    pub intermediate: String,
    /// What a 35K-tier answer adds
    pub advanced: String,
}

/// A published interview question with its canonical answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub title: String,
    pub answer: CanonicalAnswer,
}

/// One successful pipeline invocation, written by the record stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationRecord {
    pub trial_id: String,
    pub user_id: i64,
    pub business: String,
    pub tokens: u32,
    pub cost: i64,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

/// One graded examination attempt. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub trial_id: String,
    pub user_id: i64,
    pub question_id: i64,
    pub outcome: GradeOutcome,
    pub raw_answer: String,
    pub tokens: u32,
    pub cost: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Read access to published questions.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// `Ok(None)` when the question does not exist or is not published.
    async fn published_question(&self, question_id: i64) -> Result<Option<Question>, StoreError>;
}

/// Invocation records keyed by trial id.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert unless a record with the same trial id exists.
    /// Returns `true` when the record was inserted.
    async fn insert_record_if_absent(&self, record: InvocationRecord) -> Result<bool, StoreError>;
}

/// Trials and per-question best results.
#[async_trait]
pub trait TrialStore: Send + Sync {
    /// Insert unless a trial with the same id exists.
    /// Returns `true` when the trial was inserted.
    async fn insert_trial_if_absent(&self, trial: TrialRecord) -> Result<bool, StoreError>;

    /// Keep the higher of the stored and the new outcome; returns the stored best.
    async fn upsert_best_result(
        &self,
        user_id: i64,
        question_id: i64,
        outcome: GradeOutcome,
    ) -> Result<GradeOutcome, StoreError>;

    /// Replace the stored best unconditionally.
    async fn overwrite_best_result(
        &self,
        user_id: i64,
        question_id: i64,
        outcome: GradeOutcome,
    ) -> Result<(), StoreError>;

    /// Best results for the given questions; questions never attempted are absent.
    async fn best_results(
        &self,
        user_id: i64,
        question_ids: &[i64],
    ) -> Result<HashMap<i64, GradeOutcome>, StoreError>;
}
