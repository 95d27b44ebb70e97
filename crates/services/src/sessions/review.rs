use std::fmt;

use super::engine::QuizSessionEngine;
use crate::error::ReviewError;

/// One line of the review grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewRow {
    pub index: usize,
    pub answered: bool,
    pub marked: bool,
    pub is_current: bool,
}

impl ReviewRow {
    /// 1-based number shown to the user.
    #[must_use]
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReviewCounts {
    pub answered: usize,
    pub unanswered: usize,
    pub marked: usize,
    /// Questions that failed to load and are left out of the grid.
    pub errors: usize,
}

/// How the panel closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDismissal {
    /// Closed without action; the session continues where it was.
    Closed,
    /// Closed after jumping to a question.
    Jumped(usize),
    /// Closed after finishing the attempt.
    Finished,
}

/// Read-only overview of the attempt with jump and early-finish actions.
///
/// Opening the panel pauses the per-question clock; every way of closing it
/// resumes the clock or ends the attempt.
pub struct ReviewPanel<'a> {
    engine: &'a mut QuizSessionEngine,
}

impl fmt::Debug for ReviewPanel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReviewPanel")
            .field("quiz_id", self.engine.attempt().quiz_id())
            .field("current_index", &self.engine.current_index())
            .finish_non_exhaustive()
    }
}

impl<'a> ReviewPanel<'a> {
    /// # Errors
    ///
    /// Propagates errors from pausing the question clock.
    pub fn open(engine: &'a mut QuizSessionEngine) -> Result<Self, ReviewError> {
        engine.pause_question_clock()?;
        Ok(Self { engine })
    }

    /// Rows for every question that loaded; placeholders are left out.
    #[must_use]
    pub fn rows(&self) -> Vec<ReviewRow> {
        let attempt = self.engine.attempt();
        self.engine
            .questions()
            .iter()
            .enumerate()
            .filter(|(_, q)| !q.is_placeholder())
            .map(|(index, _)| ReviewRow {
                index,
                answered: attempt.is_answered(index),
                marked: attempt.is_marked(index),
                is_current: attempt.current_index() == index,
            })
            .collect()
    }

    /// Indices of questions that failed to load.
    #[must_use]
    pub fn error_indices(&self) -> Vec<usize> {
        self.engine
            .questions()
            .iter()
            .enumerate()
            .filter(|(_, q)| q.is_placeholder())
            .map(|(index, _)| index)
            .collect()
    }

    #[must_use]
    pub fn counts(&self) -> ReviewCounts {
        let rows = self.rows();
        let answered = rows.iter().filter(|r| r.answered).count();
        ReviewCounts {
            answered,
            unanswered: rows.len() - answered,
            marked: rows.iter().filter(|r| r.marked).count(),
            errors: self.engine.question_count() - rows.len(),
        }
    }

    /// Navigates to `index` and closes the panel.
    ///
    /// # Errors
    ///
    /// `InvalidQuestionIndex` or `Finished`, leaving the panel open.
    pub fn jump_to(self, index: usize) -> Result<ReviewDismissal, (Self, ReviewError)> {
        match self.engine.go_to(index) {
            Ok(index) => {
                self.engine.resume_question_clock();
                Ok(ReviewDismissal::Jumped(index))
            }
            Err(err) => Err((self, err.into())),
        }
    }

    /// Finishes the attempt, then closes the panel.
    ///
    /// # Errors
    ///
    /// Propagates finish errors, leaving the panel open.
    pub fn finish_now(self) -> Result<ReviewDismissal, (Self, ReviewError)> {
        match self.engine.finish(false) {
            Ok(_) => Ok(ReviewDismissal::Finished),
            Err(err) => Err((self, err.into())),
        }
    }

    /// Starts reviewing from the first question.
    ///
    /// # Errors
    ///
    /// Same as [`jump_to`](Self::jump_to).
    pub fn review_all(self) -> Result<ReviewDismissal, (Self, ReviewError)> {
        self.jump_to(0)
    }

    /// Jumps to the first marked question that is still unanswered, else the first marked one.
    ///
    /// # Errors
    ///
    /// `NothingMarked` when no question is marked.
    pub fn review_marked(self) -> Result<ReviewDismissal, (Self, ReviewError)> {
        let rows = self.rows();
        let target = rows
            .iter()
            .find(|r| r.marked && !r.answered)
            .or_else(|| rows.iter().find(|r| r.marked))
            .map(|r| r.index);
        match target {
            Some(index) => self.jump_to(index),
            None => Err((self, ReviewError::NothingMarked)),
        }
    }

    /// Jumps to the first unanswered question.
    ///
    /// # Errors
    ///
    /// `AllAnswered` when every loaded question has an answer.
    pub fn review_incomplete(self) -> Result<ReviewDismissal, (Self, ReviewError)> {
        let target = self.rows().iter().find(|r| !r.answered).map(|r| r.index);
        match target {
            Some(index) => self.jump_to(index),
            None => Err((self, ReviewError::AllAnswered)),
        }
    }

    /// Closes the panel without acting.
    #[must_use]
    pub fn close(self) -> ReviewDismissal {
        self.engine.resume_question_clock();
        ReviewDismissal::Closed
    }
}
