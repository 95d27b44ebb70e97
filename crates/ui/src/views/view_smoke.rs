use std::sync::Arc;

use quiz_core::model::{
    Attempt, HighlightTarget, PracticeTestSettings, QuizContent, QuizId, SectionType, TopicId,
    TopicStructure, UserTier,
};
use quiz_core::time::fixed_now;
use services::sessions::UPGRADE_NOTICE;
use services::{ResumeChoice, StorageError};
use storage::{AttemptRepository, ContentRepository};

use super::test_harness::{ViewHarness, setup_view_harness, setup_view_harness_with_content};
use crate::vm::{
    EMPTY_LIST_MESSAGE, HitRegion, Interaction, ReviewIntent, RowTarget, SessionIntent,
};

async fn start_quiz(harness: &mut ViewHarness, list: &str, id: &str) {
    let route = harness.handles.route(list);
    harness.call(route, (QuizId::new(id), Interaction::DoubleClick));
    harness.settle().await;
}

#[tokio::test(flavor = "current_thread")]
async fn topic_view_smoke_renders_lists_with_lock_markers() {
    let harness = setup_view_harness(UserTier::Free).await;
    let html = harness.render();
    for expected in ["Biology", "Practice Test 1", "Practice Test 2", "Cells", "Cell Biology"] {
        assert!(html.contains(expected), "missing {expected} in {html}");
    }
    assert!(html.contains("content-row--locked"), "missing lock row in {html}");
    assert!(html.contains("Locked"), "missing lock marker in {html}");
    assert!(html.contains("Start"), "missing start marker in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn topic_view_smoke_selects_on_first_click() {
    let mut harness = setup_view_harness(UserTier::Free).await;
    let route = harness.handles.route("Practice Tests");
    harness.call(route, (QuizId::new("pt-1"), Interaction::Click(RowTarget::Name)));
    let html = harness.render();
    assert!(html.contains("content-row--selected"), "missing selection in {html}");
    assert!(!html.contains("Question 1 of 3"), "first click must not start in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn upgrade_modal_closes_from_backdrop_only() {
    let mut harness = setup_view_harness(UserTier::Free).await;
    let route = harness.handles.route("Practice Tests");
    harness.call(route, (QuizId::new("pt-2"), Interaction::Click(RowTarget::Name)));
    let html = harness.render();
    assert!(html.contains(UPGRADE_NOTICE.title), "missing upgrade title in {html}");
    assert!(html.contains("View Plans"), "missing upgrade cta in {html}");

    let callbacks = harness.handles.callbacks();
    harness.call(callbacks.modal_click, HitRegion::Content);
    let html = harness.render();
    assert!(html.contains(UPGRADE_NOTICE.title), "content click closed the modal: {html}");

    harness.call(callbacks.modal_click, HitRegion::Backdrop);
    let html = harness.render();
    assert!(!html.contains(UPGRADE_NOTICE.title), "backdrop click kept the modal: {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn resume_modal_survives_backdrop_and_resumes_in_place() {
    let mut harness = setup_view_harness(UserTier::Free).await;
    let now = fixed_now();
    let mut attempt = Attempt::new(
        QuizId::new("pt-1"),
        SectionType::Practice,
        3,
        PracticeTestSettings::default(),
        now,
    )
    .unwrap();
    attempt.start(now).unwrap();
    attempt.select_option(0, "A").unwrap();
    attempt.move_to(1).unwrap();
    harness.repo.save_attempt(&attempt).await.expect("seed attempt");

    start_quiz(&mut harness, "Practice Tests", "pt-1").await;
    let html = harness.render();
    assert!(html.contains("Welcome Back!"), "missing resume title in {html}");
    assert!(
        html.contains("1 of 3 answered, stopped at question 2"),
        "missing progress in {html}"
    );

    let callbacks = harness.handles.callbacks();
    harness.call(callbacks.modal_click, HitRegion::Backdrop);
    let html = harness.render();
    assert!(html.contains("Welcome Back!"), "backdrop dismissed the resume prompt: {html}");

    harness.call(callbacks.resume, ResumeChoice::Resume);
    harness.settle().await;
    let html = harness.render();
    assert!(!html.contains("Welcome Back!"), "resume prompt still open: {html}");
    assert!(html.contains("Question 2 of 3"), "missing resumed question in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn session_view_smoke_answers_and_highlights() {
    let mut harness = setup_view_harness(UserTier::Free).await;
    start_quiz(&mut harness, "Practice Tests", "pt-1").await;
    let html = harness.render();
    assert!(html.contains("Biology Practice Test 1"), "missing quiz title in {html}");
    assert!(html.contains("Question 1 of 3"), "missing header in {html}");
    assert!(html.contains("Which hormone surges"), "missing prompt in {html}");

    let callbacks = harness.handles.callbacks();
    harness.call(callbacks.intent, SessionIntent::Select("A".into()));
    let html = harness.render();
    assert!(html.contains("question-option--selected"), "missing selection in {html}");

    harness.call(
        callbacks.intent,
        SessionIntent::Highlight {
            target: HighlightTarget::Prompt(0),
            html: "<p>Which <mark>hormone</mark> surges before ovulation?</p>".into(),
        },
    );
    let html = harness.render();
    assert!(html.contains("<mark>hormone</mark>"), "missing highlight in {html}");
    assert!(html.contains("1 highlighted"), "missing highlight count in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn review_grid_smoke_jumps_and_finishes() {
    let mut harness = setup_view_harness(UserTier::Free).await;
    start_quiz(&mut harness, "Practice Tests", "pt-1").await;
    let callbacks = harness.handles.callbacks();

    harness.call(callbacks.open_review, ());
    harness.call(callbacks.review, ReviewIntent::ReviewMarked);
    let html = harness.render();
    assert!(
        html.contains("No questions are marked for review."),
        "missing review message in {html}"
    );

    harness.call(callbacks.review, ReviewIntent::Close);
    harness.call(callbacks.intent, SessionIntent::Select("A".into()));
    harness.call(callbacks.intent, SessionIntent::Next);
    harness.call(callbacks.intent, SessionIntent::ToggleMark);
    harness.call(callbacks.intent, SessionIntent::Next);

    harness.call(callbacks.open_review, ());
    let html = harness.render();
    assert!(
        html.contains("1 answered, 2 unanswered, 1 marked"),
        "missing review summary in {html}"
    );
    assert!(html.contains("review-cell--marked"), "missing marked cell in {html}");
    assert!(html.contains("review-cell--current"), "missing current cell in {html}");

    harness.call(callbacks.review, ReviewIntent::ReviewMarked);
    let html = harness.render();
    assert!(!html.contains("review-summary"), "review still open: {html}");
    assert!(html.contains("Question 2 of 3"), "did not jump to marked: {html}");

    harness.call(callbacks.open_review, ());
    harness.call(callbacks.review, ReviewIntent::FinishNow);
    let html = harness.render();
    assert!(html.contains("Score: 1/3 (33%)"), "missing score in {html}");
    assert!(html.contains("Back to List"), "missing leave button in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn leaving_a_session_returns_to_the_lists() {
    let mut harness = setup_view_harness(UserTier::Free).await;
    start_quiz(&mut harness, "Practice Tests", "pt-1").await;
    let callbacks = harness.handles.callbacks();
    harness.call(callbacks.intent, SessionIntent::Select("A".into()));

    harness.call(callbacks.leave, ());
    harness.settle().await;
    let html = harness.render();
    assert!(!html.contains("Question 1 of 3"), "session still shown: {html}");
    assert!(html.contains("Practice Test 2"), "missing lists in {html}");

    let stored = harness
        .repo
        .load_attempt(&QuizId::new("pt-1"))
        .await
        .expect("load attempt")
        .expect("attempt saved on leave");
    assert_eq!(stored.answer(0), Some("A"));
}

#[tokio::test(flavor = "current_thread")]
async fn topic_view_smoke_renders_empty_bank_list() {
    let content = Arc::new(super::test_harness::catalog(false));
    let harness = setup_view_harness_with_content(UserTier::Pro, content).await;
    let html = harness.render();
    assert!(html.contains("Question Banks"), "missing bank title in {html}");
    assert!(html.contains(EMPTY_LIST_MESSAGE), "missing empty message in {html}");
    assert!(!html.contains("Locked"), "paid tier sees locks in {html}");
}

struct FailingContentRepo;

#[async_trait::async_trait]
impl ContentRepository for FailingContentRepo {
    async fn topic_structure(&self, _topic_id: &TopicId) -> Result<TopicStructure, StorageError> {
        Err(StorageError::Connection("fail".to_string()))
    }

    async fn load_quiz(&self, _quiz_id: &QuizId) -> Result<QuizContent, StorageError> {
        Err(StorageError::Connection("fail".to_string()))
    }
}

#[tokio::test(flavor = "current_thread")]
async fn topic_view_smoke_renders_error_state() {
    let harness =
        setup_view_harness_with_content(UserTier::Free, Arc::new(FailingContentRepo)).await;
    let html = harness.render();
    assert!(html.contains("Something went wrong"), "missing error in {html}");
    assert!(html.contains("Retry"), "missing retry in {html}");
}
