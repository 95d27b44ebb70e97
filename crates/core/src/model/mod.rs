mod app_settings;
mod attempt;
mod content;
mod ids;
mod profile;
mod question;
mod result;

pub use app_settings::{
    AppSettings, AppSettingsDraft, AppSettingsError, DEFAULT_AUTOSAVE_INTERVAL_SECS, Theme,
};
pub use attempt::{
    Attempt, AttemptError, AttemptParts, AttemptStatus, BASE_PRACTICE_TEST_MINUTES, HighlightTarget,
    PracticeTestSettings, TimerMode, TimerSnapshot,
};
pub use content::{
    ListItem, ParseSectionTypeError, QuestionBankGroup, QuizContent, QuizMetadata, SectionType,
    TopicStructure,
};
pub use ids::{AttemptId, ParseIdError, QuizId, TopicId};
pub use profile::{UserProfile, UserTier};
pub use question::{AnswerOption, Question, QuestionError};
pub use result::{QuizResult, QuizResultError};
