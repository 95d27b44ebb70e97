use std::sync::Arc;

use quiz_core::model::{
    AnswerOption, AppSettings, ListItem, PracticeTestSettings, Question, QuizContent, QuizId,
    QuizMetadata, SectionType, Theme, TopicId, TopicStructure, UserProfile, UserTier,
};
use quiz_core::time::fixed_now;
use services::sessions::ReviewDismissal;
use services::{Clock, QuizSessionService, ResumeChoice, ReviewPanel};
use storage::{InMemoryRepository, JsonCatalog};
use ui::vm::{
    ContentListController, Interaction, ListAction, OpenQuiz, ReviewIntent, RowTarget,
    SessionIntent, SessionOutcome, apply_review_intent, open_quiz, resolve_resume, review_grid,
};
use ui::{AppContext, UiApp, build_app_context};

fn topic() -> TopicStructure {
    TopicStructure {
        id: TopicId::new("bio"),
        name: "Biology".into(),
        practice_tests: vec![
            ListItem::new("pt-1", "Practice Test 1", 0, SectionType::Practice),
            ListItem::new("pt-2", "Practice Test 2", 1, SectionType::Practice),
        ],
        question_banks: Vec::new(),
    }
}

fn quiz(id: &str) -> QuizContent {
    let q = |a: &str, b: &str| {
        Question::new(
            "<p>Pick</p>",
            vec![AnswerOption::new(a, a, true), AnswerOption::new(b, b, false)],
        )
        .unwrap()
    };
    QuizContent {
        id: QuizId::new(id),
        section_type: SectionType::Practice,
        metadata: QuizMetadata::default(),
        questions: vec![q("Burst", "Drop"), q("LH", "FSH"), q("A", "B")],
    }
}

struct TestApp {
    sessions: Arc<QuizSessionService>,
    profile: UserProfile,
}

impl UiApp for TestApp {
    fn topic_id(&self) -> TopicId {
        TopicId::new("bio")
    }

    fn settings(&self) -> AppSettings {
        AppSettings::default().with_theme(Theme::Dark)
    }

    fn profile(&self) -> Option<UserProfile> {
        Some(self.profile.clone())
    }

    fn sessions(&self) -> Arc<QuizSessionService> {
        Arc::clone(&self.sessions)
    }
}

fn context(tier: UserTier) -> AppContext {
    let catalog = JsonCatalog::from_parts(vec![topic()], vec![quiz("pt-1"), quiz("pt-2")]).unwrap();
    let repo = InMemoryRepository::new();
    let sessions = QuizSessionService::new(
        Clock::fixed(fixed_now()),
        Arc::new(catalog),
        Arc::new(repo),
    );
    let app: Arc<dyn UiApp> = Arc::new(TestApp {
        sessions: Arc::new(sessions),
        profile: UserProfile::new("u", tier),
    });
    build_app_context(&app)
}

#[tokio::test]
async fn select_start_answer_and_finish_from_review() {
    let ctx = context(UserTier::Free);
    assert_eq!(ctx.theme(), Theme::Dark);
    let items = ctx
        .sessions()
        .topic_structure(ctx.topic_id())
        .await
        .unwrap()
        .practice_tests;
    assert_eq!(items, topic().practice_tests);
    let controller = ContentListController::new(&items, ctx.profile());

    assert_eq!(
        controller.interact(&items[1].id, Interaction::DoubleClick, None),
        Some(ListAction::LockedItemClicked)
    );

    let Some(ListAction::Select { id, .. }) =
        controller.interact(&items[0].id, Interaction::Click(RowTarget::Name), None)
    else {
        panic!("first click selects");
    };
    let Some(ListAction::StartQuiz { id, section_type }) =
        controller.interact(&id, Interaction::Click(RowTarget::Name), Some(&id))
    else {
        panic!("second click starts");
    };

    let sessions = ctx.sessions();
    let opened = open_quiz(
        &sessions,
        &TopicId::new("bio"),
        &id,
        section_type,
        ctx.profile(),
        PracticeTestSettings::default(),
    )
    .await
    .unwrap();
    let OpenQuiz::Session { mut vm, load_degraded } = opened else {
        panic!("no stored attempt, session starts directly");
    };
    assert!(!load_degraded);

    vm.apply(SessionIntent::Select("Burst".into())).unwrap();
    vm.apply(SessionIntent::Next).unwrap();
    vm.apply(SessionIntent::Select("LH".into())).unwrap();
    vm.apply(SessionIntent::Next).unwrap();

    let panel = ReviewPanel::open(vm.engine_mut()).unwrap();
    let grid = review_grid(&panel);
    assert_eq!(
        grid.cells.iter().map(|c| c.answered).collect::<Vec<_>>(),
        vec![true, true, false]
    );
    assert!(grid.cells.iter().all(|c| !c.marked));
    assert_eq!(
        apply_review_intent(panel, ReviewIntent::FinishNow).ok(),
        Some(ReviewDismissal::Finished)
    );
    assert!(vm.is_finished());
    assert_eq!(
        vm.apply(SessionIntent::Previous).unwrap_err(),
        ui::ViewError::AttemptFinished
    );
    vm.into_engine().close().await;
}

#[tokio::test]
async fn locked_item_opens_upgrade_prompt() {
    let ctx = context(UserTier::Free);
    let opened = open_quiz(
        &ctx.sessions(),
        &TopicId::new("bio"),
        &QuizId::new("pt-2"),
        SectionType::Practice,
        ctx.profile(),
        PracticeTestSettings::default(),
    )
    .await
    .unwrap();
    let OpenQuiz::Upgrade(modal) = opened else {
        panic!("second item is locked for free tier");
    };
    assert_eq!(modal.cta_label, "View Plans");
}

async fn open_second(sessions: &QuizSessionService, ctx: &AppContext) -> OpenQuiz {
    open_quiz(
        sessions,
        &TopicId::new("bio"),
        &QuizId::new("pt-2"),
        SectionType::Practice,
        ctx.profile(),
        PracticeTestSettings::default(),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn reopening_offers_resume() {
    let ctx = context(UserTier::Pro);
    let sessions = ctx.sessions();
    let OpenQuiz::Session { mut vm, .. } = open_second(&sessions, &ctx).await else {
        panic!("fresh start expected");
    };
    vm.apply(SessionIntent::Select("Drop".into())).unwrap();
    vm.apply(SessionIntent::GoTo(2)).unwrap();
    vm.into_engine().close().await;

    let OpenQuiz::Resume { modal, prompt } = open_second(&sessions, &ctx).await else {
        panic!("in-progress attempt should prompt");
    };
    assert_eq!(modal.progress_label, "1 of 3 answered, stopped at question 3");
    assert_eq!(modal.buttons[1].action, ResumeChoice::Resume);

    let vm = resolve_resume(&sessions, prompt, ResumeChoice::Resume)
        .await
        .unwrap();
    assert_eq!(vm.engine().current_index(), 2);
    assert_eq!(vm.engine().attempt().answer(0), Some("Drop"));
    assert_eq!(vm.current_question().header, "Question 3 of 3");
    vm.into_engine().close().await;
}

#[test]
fn session_outcome_is_comparable() {
    assert_ne!(SessionOutcome::Continue, SessionOutcome::Finished { timed_out: false });
}
