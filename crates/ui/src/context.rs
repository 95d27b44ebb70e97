use std::sync::Arc;

use quiz_core::model::{AppSettings, Theme, TopicId, UserProfile};
use services::QuizSessionService;

pub trait UiApp: Send + Sync {
    fn topic_id(&self) -> TopicId;
    fn settings(&self) -> AppSettings;
    fn profile(&self) -> Option<UserProfile>;

    fn sessions(&self) -> Arc<QuizSessionService>;
}

/// Process-wide UI state, built once at startup and passed down explicitly.
#[derive(Clone)]
pub struct AppContext {
    topic_id: TopicId,
    settings: AppSettings,
    profile: Option<UserProfile>,
    sessions: Arc<QuizSessionService>,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            topic_id: app.topic_id(),
            settings: app.settings(),
            profile: app.profile(),
            sessions: app.sessions(),
        }
    }

    /// Topic whose lists the app opens on.
    #[must_use]
    pub fn topic_id(&self) -> &TopicId {
        &self.topic_id
    }

    #[must_use]
    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    #[must_use]
    pub fn theme(&self) -> Theme {
        self.settings.theme()
    }

    #[must_use]
    pub fn sidebar_collapsed(&self) -> bool {
        self.settings.sidebar_collapsed()
    }

    /// The signed-in profile. `None` means every item is locked.
    #[must_use]
    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    #[must_use]
    pub fn sessions(&self) -> Arc<QuizSessionService> {
        Arc::clone(&self.sessions)
    }
}

// This context is provided by the application composition root (e.g. `crates/app`).

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}
