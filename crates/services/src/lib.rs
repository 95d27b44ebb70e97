#![forbid(unsafe_code)]

pub mod app_services;
pub mod app_settings_service;
pub mod error;
pub mod score;
pub mod sessions;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use app_settings_service::AppSettingsService;
pub use error::{AppServicesError, AppSettingsServiceError, ReviewError, SessionError};
pub use storage::StorageError;
pub use score::{CollectingScoreReporter, ScoreReporter, TracingScoreReporter};

pub use sessions::{
    AttemptSaver, QuizSessionEngine, QuizSessionService, ResumeChoice, ResumePrompt, ReviewPanel,
    SaveState, SaveStatus, StartOutcome, StartedSession, TickOutcome, Ticker,
};
