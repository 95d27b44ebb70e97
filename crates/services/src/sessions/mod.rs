mod autosave;
mod engine;
mod resume;
mod review;
mod timer;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::{ReviewError, SessionError};
pub use autosave::{AttemptSaver, RetryPolicy, SaveState, SaveStatus};
pub use engine::{QuizSessionEngine, TickOutcome};
pub use resume::{GateDecision, ResumeChoice, ResumeGate, ResumePrompt};
pub use review::{ReviewCounts, ReviewDismissal, ReviewPanel, ReviewRow};
pub use timer::{ExpiryToken, QuizTimer, Ticker, TimerTick};
pub use workflow::{QuizSessionService, StartOutcome, StartedSession, UPGRADE_NOTICE, UpgradeNotice};
