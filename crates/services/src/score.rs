//! Hand-off of finished attempts to whatever records scores.

use std::sync::Mutex;

use quiz_core::model::{Attempt, Question, QuizResult};
use tracing::{info, warn};

/// Consumer of finished attempts. Called once per attempt, right after it finishes.
pub trait ScoreReporter: Send + Sync {
    fn report(&self, attempt: &Attempt, questions: &[Question]);
}

/// Grades the attempt and logs the result.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingScoreReporter;

impl ScoreReporter for TracingScoreReporter {
    fn report(&self, attempt: &Attempt, questions: &[Question]) {
        match QuizResult::grade(attempt, questions) {
            Ok(result) => info!(
                quiz_id = %result.quiz_id,
                attempt_id = %result.attempt_id,
                score = result.score,
                valid = result.valid_questions,
                timed_out = result.timed_out,
                "quiz finished"
            ),
            Err(err) => warn!(attempt_id = %attempt.id(), error = %err, "could not grade attempt"),
        }
    }
}

/// Keeps graded results in memory.
#[derive(Debug, Default)]
pub struct CollectingScoreReporter {
    results: Mutex<Vec<QuizResult>>,
}

impl CollectingScoreReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn results(&self) -> Vec<QuizResult> {
        self.results
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl ScoreReporter for CollectingScoreReporter {
    fn report(&self, attempt: &Attempt, questions: &[Question]) {
        let result = match QuizResult::grade(attempt, questions) {
            Ok(result) => result,
            Err(err) => {
                warn!(attempt_id = %attempt.id(), error = %err, "could not grade attempt");
                return;
            }
        };
        match self.results.lock() {
            Ok(mut guard) => guard.push(result),
            Err(err) => warn!(error = %err, "score collector lock poisoned"),
        }
    }
}
