//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{AppSettingsError, AttemptError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use storage::CatalogError;

/// Errors emitted by the quiz session engine and workflow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("question index {index} is out of range for {count} questions")]
    InvalidQuestionIndex { index: usize, count: usize },
    #[error("attempt is already finished")]
    Finished,
    #[error("question {index} has no option {label}")]
    UnknownOption { index: usize, label: String },
    #[error("no solution is available for question {index}")]
    SolutionUnavailable { index: usize },
    #[error("no exhibit is available for question {index}")]
    ExhibitUnavailable { index: usize },
    #[error("quiz has no questions")]
    Empty,
    #[error(transparent)]
    Attempt(AttemptError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<AttemptError> for SessionError {
    fn from(err: AttemptError) -> Self {
        match err {
            AttemptError::InvalidQuestionIndex { index, count } => {
                SessionError::InvalidQuestionIndex { index, count }
            }
            AttemptError::Finished => SessionError::Finished,
            AttemptError::EmptyQuiz => SessionError::Empty,
            other => SessionError::Attempt(other),
        }
    }
}

/// Errors emitted by the review panel's navigation helpers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReviewError {
    #[error("no questions are marked for review")]
    NothingMarked,
    #[error("every question is answered")]
    AllAnswered,
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Errors emitted by `AppSettingsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppSettingsServiceError {
    #[error(transparent)]
    Validation(#[from] AppSettingsError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempt_errors_map_to_session_variants() {
        let err: SessionError = AttemptError::InvalidQuestionIndex { index: 4, count: 3 }.into();
        assert!(matches!(
            err,
            SessionError::InvalidQuestionIndex { index: 4, count: 3 }
        ));
        assert!(matches!(
            SessionError::from(AttemptError::Finished),
            SessionError::Finished
        ));
        assert!(matches!(
            SessionError::from(AttemptError::InvalidPersistedState("x".into())),
            SessionError::Attempt(_)
        ));
    }
}
