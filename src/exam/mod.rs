//! Examination service
//!
//! Orchestrates one examination: look up the question, run the answer
//! through the `question_examine` pipeline, decode the verdict, then persist
//! the trial and the per-question best result.

mod error;

pub use error::{ExamError, PublicError, SYSTEM_ERROR_MESSAGE};

use crate::grading::{decode, GradeOutcome};
use crate::logging::generate_trial_id;
use crate::pipeline::{BusinessKey, GradingRequest, Handler, RequestContext};
use crate::store::{QuestionRepository, StoreError, TrialRecord, TrialStore};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Result of one successful examination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Examination {
    pub trial_id: String,
    pub outcome: GradeOutcome,
    /// Verdict text exactly as the model returned it
    pub raw_answer: String,
    pub tokens: u32,
    pub cost: i64,
    /// Best outcome for this question after this trial
    pub best: GradeOutcome,
}

pub struct ExaminationService {
    questions: Arc<dyn QuestionRepository>,
    trials: Arc<dyn TrialStore>,
    pipeline: Arc<dyn Handler>,
    timeout: Option<Duration>,
}

impl ExaminationService {
    /// `pipeline` is normally the facade dispatcher, but any handler that
    /// serves `question_examine` works.
    pub fn new(
        questions: Arc<dyn QuestionRepository>,
        trials: Arc<dyn TrialStore>,
        pipeline: Arc<dyn Handler>,
    ) -> Self {
        Self {
            questions,
            trials,
            pipeline,
            timeout: None,
        }
    }

    /// Deadline applied by [`examine`](Self::examine).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub async fn examine(
        &self,
        user_id: i64,
        question_id: i64,
        answer: &str,
    ) -> Result<Examination, ExamError> {
        let ctx = match self.timeout {
            Some(timeout) => RequestContext::with_timeout(timeout),
            None => RequestContext::new(),
        };
        self.examine_with(&ctx, user_id, question_id, answer).await
    }

    /// Examine under a caller-supplied deadline and cancellation token.
    pub async fn examine_with(
        &self,
        ctx: &RequestContext,
        user_id: i64,
        question_id: i64,
        answer: &str,
    ) -> Result<Examination, ExamError> {
        let question = self
            .questions
            .published_question(question_id)
            .await?
            .ok_or(ExamError::NotFound(question_id))?;

        let canonical = serde_json::to_string(&question.answer)
            .map_err(|e| StoreError::Encoding(e.to_string()))?;

        let trial_id = generate_trial_id();
        let request = GradingRequest::new(
            user_id,
            trial_id.clone(),
            BusinessKey::QuestionExamine,
            vec![question.title, canonical, answer.to_string()],
        );

        let response = self.pipeline.handle(ctx, request).await?;
        let outcome = decode(response.answer());

        let now = Utc::now();
        let trial = TrialRecord {
            trial_id: trial_id.clone(),
            user_id,
            question_id,
            outcome,
            raw_answer: response.answer().to_string(),
            tokens: response.tokens(),
            cost: response.cost(),
            created_at: now,
            updated_at: now,
        };

        // Billing already happened: persistence failures are logged, the
        // graded result is still returned.
        if let Err(e) = self.trials.insert_trial_if_absent(trial).await {
            error!(trial_id = %trial_id, user_id, question_id, error = %e, "Failed to persist trial");
        }
        let best = match self
            .trials
            .upsert_best_result(user_id, question_id, outcome)
            .await
        {
            Ok(best) => best,
            Err(e) => {
                error!(trial_id = %trial_id, user_id, question_id, error = %e, "Failed to update best result");
                outcome
            }
        };

        info!(
            trial_id = %trial_id,
            user_id,
            question_id,
            outcome = %outcome,
            best = %best,
            tokens = response.tokens(),
            cost = response.cost(),
            "Examination graded"
        );

        Ok(Examination {
            trial_id,
            outcome,
            tokens: response.tokens(),
            cost: response.cost(),
            raw_answer: response.into_answer(),
            best,
        })
    }

    /// Overwrite the best result for a question. No trial, no billing.
    pub async fn correct(
        &self,
        user_id: i64,
        question_id: i64,
        outcome: GradeOutcome,
    ) -> Result<(), ExamError> {
        self.trials
            .overwrite_best_result(user_id, question_id, outcome)
            .await?;
        info!(user_id, question_id, outcome = %outcome, "Best result corrected");
        Ok(())
    }

    /// Best results for `question_ids`; unattempted questions are absent.
    pub async fn results_for_questions(
        &self,
        user_id: i64,
        question_ids: &[i64],
    ) -> Result<HashMap<i64, GradeOutcome>, ExamError> {
        Ok(self.trials.best_results(user_id, question_ids).await?)
    }
}
