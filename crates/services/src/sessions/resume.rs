//! Decision point between a stored attempt and a fresh start.

use std::sync::Arc;

use quiz_core::model::{Attempt, AttemptStatus, QuizContent, QuizMetadata};

/// Outcome of inspecting what storage holds for a quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Nothing worth resuming; start immediately.
    NoPriorAttempt,
    /// An in-progress attempt exists; the user has to choose.
    PriorAttempt(Attempt),
}

/// The two ways out of the resume prompt. There is no cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeChoice {
    Resume,
    StartOver,
}

pub struct ResumeGate;

impl ResumeGate {
    /// Only an in-progress attempt that matches the loaded quiz is offered for resumption.
    ///
    /// Finished and never-started attempts lead straight to a fresh start, as
    /// does an attempt whose question count or section no longer matches the content.
    #[must_use]
    pub fn evaluate(stored: Option<Attempt>, content: &QuizContent) -> GateDecision {
        match stored {
            Some(attempt)
                if attempt.status() == AttemptStatus::InProgress
                    && attempt.question_count() == content.question_count()
                    && attempt.section_type() == content.section_type =>
            {
                GateDecision::PriorAttempt(attempt)
            }
            _ => GateDecision::NoPriorAttempt,
        }
    }
}

/// Pending resume decision, carrying everything needed to act on either choice.
#[derive(Debug, Clone)]
pub struct ResumePrompt {
    pub(crate) content: Arc<QuizContent>,
    pub(crate) attempt: Attempt,
}

impl ResumePrompt {
    #[must_use]
    pub fn attempt(&self) -> &Attempt {
        &self.attempt
    }

    #[must_use]
    pub fn metadata(&self) -> &QuizMetadata {
        &self.content.metadata
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.attempt.submitted_answers().len()
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.attempt.question_count()
    }

    /// 1-based number of the question the attempt stopped on.
    #[must_use]
    pub fn resume_question_number(&self) -> usize {
        self.attempt.current_index() + 1
    }
}
