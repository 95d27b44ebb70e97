use std::sync::Arc;

use dioxus::core::NoOpMutations;
use dioxus::prelude::*;
use dioxus_router::{Routable, Router};
use quiz_core::model::{
    AnswerOption, AppSettings, ListItem, Question, QuestionBankGroup, QuizContent, QuizId,
    QuizMetadata, SectionType, TopicId, TopicStructure, UserProfile, UserTier,
};
use quiz_core::time::fixed_now;
use services::{Clock, QuizSessionService};
use storage::{ContentRepository, InMemoryRepository, JsonCatalog};

use super::topic::TopicTestHandles;
use crate::context::{UiApp, build_app_context};
use crate::views::TopicView;

pub const TOPIC_ID: &str = "bio";

struct TestApp {
    profile: UserProfile,
    sessions: Arc<QuizSessionService>,
}

impl UiApp for TestApp {
    fn topic_id(&self) -> TopicId {
        TopicId::new(TOPIC_ID)
    }

    fn settings(&self) -> AppSettings {
        AppSettings::default()
    }

    fn profile(&self) -> Option<UserProfile> {
        Some(self.profile.clone())
    }

    fn sessions(&self) -> Arc<QuizSessionService> {
        Arc::clone(&self.sessions)
    }
}

#[derive(Props, Clone)]
struct ViewHarnessProps {
    app: Arc<TestApp>,
    handles: TopicTestHandles,
}

impl PartialEq for ViewHarnessProps {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for ViewHarnessProps {}

#[component]
fn ViewRouterHarness(props: ViewHarnessProps) -> Element {
    let app: Arc<dyn UiApp> = props.app.clone();
    use_context_provider(|| build_app_context(&app));
    use_context_provider(|| props.handles.clone());
    rsx! { Router::<TestRoute> {} }
}

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum TestRoute {
    #[route("/")]
    Root {},
}

#[component]
fn Root() -> Element {
    rsx! { TopicView {} }
}

pub struct ViewHarness {
    pub dom: VirtualDom,
    pub repo: Arc<InMemoryRepository>,
    pub handles: TopicTestHandles,
}

impl ViewHarness {
    pub fn rebuild(&mut self) {
        self.dom.rebuild_in_place();
        drive_dom(&mut self.dom);
    }

    pub async fn drive_async(&mut self) {
        let _ = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            self.dom.wait_for_work(),
        )
        .await;
        self.dom.render_immediate(&mut NoOpMutations);
        self.dom.process_events();
    }

    /// Drives until spawned work (catalog reads, session starts) has landed.
    pub async fn settle(&mut self) {
        for _ in 0..4 {
            self.drive_async().await;
        }
    }

    /// Invokes a component callback the way an event handler would.
    pub fn call<T: 'static>(&mut self, callback: Callback<T>, value: T) {
        self.dom.in_runtime(|| callback.call(value));
        drive_dom(&mut self.dom);
    }

    pub fn render(&self) -> String {
        dioxus_ssr::render(&self.dom)
    }
}

pub fn drive_dom(dom: &mut VirtualDom) {
    dom.process_events();
    dom.render_immediate(&mut NoOpMutations);
    dom.process_events();
}

fn question(prompt: &str, correct: &str, wrong: &str) -> Question {
    Question::new(
        prompt,
        vec![
            AnswerOption::new("A", correct, true),
            AnswerOption::new("B", wrong, false),
        ],
    )
    .expect("valid question")
    .with_solution("<p>Because the surge comes first.</p>")
}

fn quiz(id: &str, section_type: SectionType, name: &str) -> QuizContent {
    QuizContent {
        id: QuizId::new(id),
        section_type,
        metadata: QuizMetadata {
            name: name.to_string(),
            topic_name: "Biology".into(),
            full_name_for_display: format!("Biology {name}"),
        },
        questions: vec![
            question("<p>Which hormone surges before ovulation?</p>", "<p>LH</p>", "<p>FSH</p>"),
            question("<p>Where is bile made?</p>", "<p>Liver</p>", "<p>Pancreas</p>"),
            question("<p>What carries oxygen?</p>", "<p>Hemoglobin</p>", "<p>Insulin</p>"),
        ],
    }
}

pub fn topic(with_banks: bool) -> TopicStructure {
    let question_banks = if with_banks {
        vec![QuestionBankGroup {
            category: "Cells".into(),
            banks: vec![ListItem::new("qb-1", "Cell Biology", 0, SectionType::Qbank)],
        }]
    } else {
        Vec::new()
    };
    TopicStructure {
        id: TopicId::new(TOPIC_ID),
        name: "Biology".into(),
        practice_tests: vec![
            ListItem::new("pt-1", "Practice Test 1", 0, SectionType::Practice),
            ListItem::new("pt-2", "Practice Test 2", 1, SectionType::Practice),
        ],
        question_banks,
    }
}

pub fn catalog(with_banks: bool) -> JsonCatalog {
    JsonCatalog::from_parts(
        vec![topic(with_banks)],
        vec![
            quiz("pt-1", SectionType::Practice, "Practice Test 1"),
            quiz("pt-2", SectionType::Practice, "Practice Test 2"),
            quiz("qb-1", SectionType::Qbank, "Cell Biology"),
        ],
    )
    .expect("valid catalog")
}

pub async fn setup_view_harness(tier: UserTier) -> ViewHarness {
    setup_view_harness_with_content(tier, Arc::new(catalog(true))).await
}

pub async fn setup_view_harness_with_content(
    tier: UserTier,
    content: Arc<dyn ContentRepository>,
) -> ViewHarness {
    let repo = Arc::new(InMemoryRepository::new());
    let sessions = QuizSessionService::new(Clock::fixed(fixed_now()), content, repo.clone());
    let app = Arc::new(TestApp {
        profile: UserProfile::new("student", tier),
        sessions: Arc::new(sessions),
    });
    let handles = TopicTestHandles::default();
    let dom = VirtualDom::new_with_props(
        ViewRouterHarness,
        ViewHarnessProps {
            app,
            handles: handles.clone(),
        },
    );

    let mut harness = ViewHarness { dom, repo, handles };
    harness.rebuild();
    harness.settle().await;
    harness
}
