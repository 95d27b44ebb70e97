//! Desktop front end over the same services as the terminal commands.

use std::sync::Arc;

use dioxus::LaunchBuilder;
use dioxus::desktop::{Config as DesktopConfig, WindowBuilder};
use quiz_core::model::{AppSettings, TopicId, UserProfile};
use services::{AppServices, QuizSessionService};
use tracing::info;
use ui::{App, UiApp, build_app_context};

struct DesktopApp {
    topic_id: TopicId,
    settings: AppSettings,
    profile: Option<UserProfile>,
    sessions: Arc<QuizSessionService>,
}

impl UiApp for DesktopApp {
    fn topic_id(&self) -> TopicId {
        self.topic_id.clone()
    }

    fn settings(&self) -> AppSettings {
        self.settings.clone()
    }

    fn profile(&self) -> Option<UserProfile> {
        self.profile.clone()
    }

    fn sessions(&self) -> Arc<QuizSessionService> {
        Arc::clone(&self.sessions)
    }
}

pub async fn launch(services: &AppServices, topic: &str, profile: Option<UserProfile>) {
    let settings = services.app_settings().load_or_default().await;
    info!(topic, theme = settings.theme().as_str(), "launching desktop window");
    let app: Arc<dyn UiApp> = Arc::new(DesktopApp {
        topic_id: TopicId::new(topic),
        settings,
        profile,
        sessions: services.sessions(),
    });
    let context = build_app_context(&app);

    // tao can default to an always-on-top window on macOS.
    let desktop_cfg = DesktopConfig::new().with_window(
        WindowBuilder::new()
            .with_title("Practice Exams")
            .with_always_on_top(false),
    );

    LaunchBuilder::desktop()
        .with_cfg(desktop_cfg)
        .with_context(context)
        .launch(App);
}
