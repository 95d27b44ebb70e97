use dioxus::prelude::*;
use services::SessionError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewError {
    /// The quiz has no questions to show.
    EmptyQuiz,
    /// The item or quiz is missing from the catalog.
    NotFound,
    /// The requested question does not exist.
    InvalidQuestion,
    /// The attempt is finished and can no longer change.
    AttemptFinished,
    Unknown,
}

impl ViewError {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            ViewError::EmptyQuiz => "This quiz has no questions yet.",
            ViewError::NotFound => "This quiz could not be found.",
            ViewError::InvalidQuestion => "That question does not exist.",
            ViewError::AttemptFinished => "This attempt is already finished.",
            ViewError::Unknown => "Something went wrong. Please try again.",
        }
    }
}

impl From<&SessionError> for ViewError {
    fn from(err: &SessionError) -> Self {
        match err {
            SessionError::Empty => ViewError::EmptyQuiz,
            SessionError::InvalidQuestionIndex { .. } => ViewError::InvalidQuestion,
            SessionError::Finished => ViewError::AttemptFinished,
            SessionError::Storage(services::StorageError::NotFound) => ViewError::NotFound,
            _ => ViewError::Unknown,
        }
    }
}

impl From<SessionError> for ViewError {
    fn from(err: SessionError) -> Self {
        ViewError::from(&err)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ViewState<T> {
    Idle,
    Loading,
    Ready(T),
    Error(ViewError),
}

#[must_use]
pub fn view_state_from_resource<T: Clone>(
    resource: Resource<Result<T, ViewError>>,
) -> ViewState<T> {
    match resource.state().cloned() {
        UseResourceState::Pending => ViewState::Loading,
        UseResourceState::Ready => match resource.value().read().as_ref() {
            Some(Ok(data)) => ViewState::Ready(data.clone()),
            Some(Err(err)) => ViewState::Error(*err),
            None => ViewState::Error(ViewError::Unknown),
        },
        UseResourceState::Paused | UseResourceState::Stopped => ViewState::Idle,
    }
}
