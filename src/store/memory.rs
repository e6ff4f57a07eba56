//! In-memory store implementations backed by `DashMap`.
//!
//! Writes are atomic per key (shard-level locking), which is all the
//! insert-if-absent and keep-higher semantics need.

use super::{
    InvocationRecord, Question, QuestionRepository, RecordStore, StoreError, TrialRecord,
    TrialStore,
};
use crate::grading::GradeOutcome;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashMap;

/// Published questions by id.
#[derive(Debug, Default)]
pub struct InMemoryQuestions {
    questions: DashMap<i64, Question>,
}

impl InMemoryQuestions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish (or republish) a question.
    pub fn publish(&self, question: Question) {
        self.questions.insert(question.id, question);
    }

    /// Withdraw a question; later lookups report it missing.
    pub fn unpublish(&self, question_id: i64) -> Option<Question> {
        self.questions.remove(&question_id).map(|(_, q)| q)
    }
}

#[async_trait]
impl QuestionRepository for InMemoryQuestions {
    async fn published_question(&self, question_id: i64) -> Result<Option<Question>, StoreError> {
        Ok(self.questions.get(&question_id).map(|q| q.value().clone()))
    }
}

/// Invocation records by trial id.
#[derive(Debug, Default)]
pub struct InMemoryRecords {
    records: DashMap<String, InvocationRecord>,
}

impl InMemoryRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, trial_id: &str) -> Option<InvocationRecord> {
        self.records.get(trial_id).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecords {
    async fn insert_record_if_absent(&self, record: InvocationRecord) -> Result<bool, StoreError> {
        match self.records.entry(record.trial_id.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(true)
            }
        }
    }
}

/// Trials by id and best results by (user, question).
#[derive(Debug, Default)]
pub struct InMemoryTrials {
    trials: DashMap<String, TrialRecord>,
    best: DashMap<(i64, i64), GradeOutcome>,
}

impl InMemoryTrials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trial(&self, trial_id: &str) -> Option<TrialRecord> {
        self.trials.get(trial_id).map(|t| t.value().clone())
    }

    /// All trials of a user for a question, oldest first.
    pub fn trials_for(&self, user_id: i64, question_id: i64) -> Vec<TrialRecord> {
        let mut trials: Vec<TrialRecord> = self
            .trials
            .iter()
            .filter(|t| t.user_id == user_id && t.question_id == question_id)
            .map(|t| t.value().clone())
            .collect();
        trials.sort_by_key(|t| t.created_at);
        trials
    }

    pub fn trial_count(&self) -> usize {
        self.trials.len()
    }

    pub fn best(&self, user_id: i64, question_id: i64) -> Option<GradeOutcome> {
        self.best.get(&(user_id, question_id)).map(|b| *b)
    }
}

#[async_trait]
impl TrialStore for InMemoryTrials {
    async fn insert_trial_if_absent(&self, trial: TrialRecord) -> Result<bool, StoreError> {
        match self.trials.entry(trial.trial_id.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(trial);
                Ok(true)
            }
        }
    }

    async fn upsert_best_result(
        &self,
        user_id: i64,
        question_id: i64,
        outcome: GradeOutcome,
    ) -> Result<GradeOutcome, StoreError> {
        let mut best = self.best.entry((user_id, question_id)).or_insert(outcome);
        if outcome > *best {
            *best = outcome;
        }
        Ok(*best)
    }

    async fn overwrite_best_result(
        &self,
        user_id: i64,
        question_id: i64,
        outcome: GradeOutcome,
    ) -> Result<(), StoreError> {
        self.best.insert((user_id, question_id), outcome);
        Ok(())
    }

    async fn best_results(
        &self,
        user_id: i64,
        question_ids: &[i64],
    ) -> Result<HashMap<i64, GradeOutcome>, StoreError> {
        Ok(question_ids
            .iter()
            .filter_map(|&qid| self.best(user_id, qid).map(|outcome| (qid, outcome)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CanonicalAnswer;
    use chrono::Utc;

    fn trial(trial_id: &str, outcome: GradeOutcome) -> TrialRecord {
        let now = Utc::now();
        TrialRecord {
            trial_id: trial_id.to_string(),
            user_id: 1,
            question_id: 10,
            outcome,
            raw_answer: "最终评分\n1".to_string(),
            tokens: 12,
            cost: 24,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_question_lookup() {
        let questions = InMemoryQuestions::new();
        questions.publish(Question {
            id: 3,
            title: "What is a mutex?".to_string(),
            answer: CanonicalAnswer::default(),
        });

        assert!(questions.published_question(3).await.unwrap().is_some());
        assert!(questions.published_question(4).await.unwrap().is_none());

        questions.unpublish(3);
        assert!(questions.published_question(3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_trial_insert_is_idempotent() {
        let trials = InMemoryTrials::new();

        assert!(trials
            .insert_trial_if_absent(trial("t1", GradeOutcome::Basic))
            .await
            .unwrap());
        assert!(!trials
            .insert_trial_if_absent(trial("t1", GradeOutcome::Advanced))
            .await
            .unwrap());

        assert_eq!(trials.trial_count(), 1);
        assert_eq!(trials.trial("t1").unwrap().outcome, GradeOutcome::Basic);
    }

    #[tokio::test]
    async fn test_best_result_keeps_highest() {
        let trials = InMemoryTrials::new();

        for outcome in [
            GradeOutcome::Basic,
            GradeOutcome::Failed,
            GradeOutcome::Advanced,
            GradeOutcome::Intermediate,
        ] {
            trials.upsert_best_result(1, 10, outcome).await.unwrap();
        }

        assert_eq!(trials.best(1, 10), Some(GradeOutcome::Advanced));
    }

    #[tokio::test]
    async fn test_overwrite_ignores_monotonicity() {
        let trials = InMemoryTrials::new();
        trials
            .upsert_best_result(1, 10, GradeOutcome::Advanced)
            .await
            .unwrap();

        trials
            .overwrite_best_result(1, 10, GradeOutcome::Failed)
            .await
            .unwrap();

        assert_eq!(trials.best(1, 10), Some(GradeOutcome::Failed));
    }

    #[tokio::test]
    async fn test_best_results_skips_unattempted() {
        let trials = InMemoryTrials::new();
        trials
            .upsert_best_result(1, 10, GradeOutcome::Basic)
            .await
            .unwrap();
        trials
            .upsert_best_result(2, 11, GradeOutcome::Advanced)
            .await
            .unwrap();

        let results = trials.best_results(1, &[10, 11, 12]).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results.get(&10), Some(&GradeOutcome::Basic));
    }

    #[tokio::test]
    async fn test_record_insert_if_absent() {
        let records = InMemoryRecords::new();
        let record = InvocationRecord {
            trial_id: "t1".to_string(),
            user_id: 1,
            business: "question_examine".to_string(),
            tokens: 10,
            cost: 20,
            answer: "ok".to_string(),
            created_at: Utc::now(),
        };

        assert!(records.insert_record_if_absent(record.clone()).await.unwrap());
        assert!(!records.insert_record_if_absent(record).await.unwrap());
        assert_eq!(records.len(), 1);
    }
}
