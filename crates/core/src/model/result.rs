use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::attempt::Attempt;
use crate::model::ids::{AttemptId, QuizId};
use crate::model::question::Question;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizResultError {
    #[error("attempt is not finished")]
    NotFinished,

    #[error("attempt covers {attempt} questions but {loaded} were supplied")]
    QuestionCountMismatch { attempt: usize, loaded: usize },
}

/// Score summary of a finished attempt.
///
/// Placeholders (questions that failed to load) are neither correct nor
/// incorrect and do not count towards `valid_questions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    pub attempt_id: AttemptId,
    pub quiz_id: QuizId,
    pub score: usize,
    pub total_questions: usize,
    pub valid_questions: usize,
    pub answers: BTreeMap<usize, String>,
    pub correct_indices: Vec<usize>,
    pub incorrect_indices: Vec<usize>,
    pub timed_out: bool,
    pub finished_at: DateTime<Utc>,
}

impl QuizResult {
    /// Grades a finished attempt against its question set.
    ///
    /// # Errors
    ///
    /// Returns `QuizResultError::NotFinished` for an unfinished attempt, or
    /// `QuestionCountMismatch` if the question set does not match the attempt.
    pub fn grade(attempt: &Attempt, questions: &[Question]) -> Result<Self, QuizResultError> {
        let Some(finished_at) = attempt.finished_at() else {
            return Err(QuizResultError::NotFinished);
        };
        if questions.len() != attempt.question_count() {
            return Err(QuizResultError::QuestionCountMismatch {
                attempt: attempt.question_count(),
                loaded: questions.len(),
            });
        }

        let mut correct_indices = Vec::new();
        let mut incorrect_indices = Vec::new();
        for (idx, question) in questions.iter().enumerate() {
            if question.is_placeholder() {
                continue;
            }
            match (question.correct_label(), attempt.answer(idx)) {
                (Some(correct), Some(given)) if correct == given => correct_indices.push(idx),
                _ => incorrect_indices.push(idx),
            }
        }

        Ok(Self {
            attempt_id: attempt.id(),
            quiz_id: attempt.quiz_id().clone(),
            score: correct_indices.len(),
            total_questions: questions.len(),
            valid_questions: correct_indices.len() + incorrect_indices.len(),
            answers: attempt.submitted_answers().clone(),
            correct_indices,
            incorrect_indices,
            timed_out: attempt.timed_out(),
            finished_at,
        })
    }

    /// Score as a whole percentage of valid questions.
    #[must_use]
    pub fn percentage(&self) -> u32 {
        if self.valid_questions == 0 {
            return 0;
        }
        let pct = (self.score * 100 + self.valid_questions / 2) / self.valid_questions;
        u32::try_from(pct).unwrap_or(100)
    }
}
