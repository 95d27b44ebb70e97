use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use quiz_core::model::{
    AnswerOption, Attempt, AttemptStatus, ListItem, PracticeTestSettings, Question,
    QuestionBankGroup, QuizContent, QuizId, QuizMetadata, SectionType, TopicId, TopicStructure,
    UserProfile, UserTier,
};
use quiz_core::time::fixed_now;
use services::sessions::{ReviewCounts, ReviewDismissal};
use services::{
    Clock, CollectingScoreReporter, QuizSessionService, ResumeChoice, ReviewPanel, StartOutcome,
    TickOutcome, Ticker,
};
use storage::repository::{
    AttemptRepository, InMemoryRepository, SaveAck, Storage, StorageError,
};
use storage::JsonCatalog;
use tokio::sync::Notify;

fn question(prompt: &str, labels: &[&str], correct: &str) -> Question {
    let options = labels
        .iter()
        .map(|label| AnswerOption::new(*label, format!("<p>{label}</p>"), *label == correct))
        .collect();
    Question::new(prompt, options).unwrap()
}

fn catalog() -> JsonCatalog {
    let topic = TopicStructure {
        id: TopicId::new("bio"),
        name: "Biology".into(),
        practice_tests: (0..3)
            .map(|p| {
                ListItem::new(
                    format!("bio-pt-{}", p + 1).as_str(),
                    format!("Practice Test {}", p + 1),
                    p,
                    SectionType::Practice,
                )
            })
            .collect(),
        question_banks: vec![QuestionBankGroup {
            category: "Endocrinology".into(),
            banks: vec![ListItem::new("bio-qb-1", "Hormones", 0, SectionType::Qbank)],
        }],
    };
    let questions = vec![
        question("Ovulation is triggered by an LH...", &["Burst", "Drop"], "Burst"),
        question("Which hormone peaks mid-cycle?", &["LH", "FSH", "TSH"], "LH"),
        question("Pick one", &["A", "B"], "A"),
    ];
    let quizzes = ["bio-pt-1", "bio-pt-2", "bio-pt-3"]
        .into_iter()
        .map(|id| QuizContent {
            id: QuizId::new(id),
            section_type: SectionType::Practice,
            metadata: QuizMetadata {
                name: id.into(),
                topic_name: "Biology".into(),
                full_name_for_display: format!("Biology {id}"),
            },
            questions: questions.clone(),
        })
        .chain(std::iter::once(QuizContent {
            id: QuizId::new("bio-qb-1"),
            section_type: SectionType::Qbank,
            metadata: QuizMetadata::default(),
            questions: questions.clone(),
        }))
        .collect();
    JsonCatalog::from_parts(vec![topic], quizzes).unwrap()
}

fn service(repo: &InMemoryRepository) -> QuizSessionService {
    QuizSessionService::new(
        Clock::fixed(fixed_now()),
        Arc::new(catalog()),
        Arc::new(repo.clone()),
    )
}

fn pro() -> UserProfile {
    UserProfile::new("u-1", UserTier::Pro)
}

async fn start_fresh(
    service: &QuizSessionService,
    quiz: &str,
    profile: &UserProfile,
) -> services::QuizSessionEngine {
    match service
        .start_or_resume(
            &TopicId::new("bio"),
            &QuizId::new(quiz),
            SectionType::Practice,
            Some(profile),
            PracticeTestSettings::default(),
        )
        .await
        .unwrap()
    {
        StartOutcome::Started(started) => {
            assert!(!started.load_degraded);
            started.engine
        }
        StartOutcome::ResumePrompt(_) => panic!("expected a fresh start, got a resume prompt"),
        StartOutcome::Locked => panic!("expected a fresh start, item is locked"),
    }
}

#[tokio::test]
async fn answer_two_of_three_then_finish_from_review() {
    let repo = InMemoryRepository::new();
    let reporter = Arc::new(CollectingScoreReporter::new());
    let svc = service(&repo).with_reporter(reporter.clone());
    let mut engine = start_fresh(&svc, "bio-pt-1", &pro()).await;

    engine.select_option(0, "Burst").unwrap();
    engine.next().unwrap();
    engine.select_option(1, "LH").unwrap();
    engine.next().unwrap();
    assert_eq!(engine.current_index(), 2);

    let panel = ReviewPanel::open(&mut engine).unwrap();
    let rows = panel.rows();
    assert_eq!(
        rows.iter().map(|r| r.answered).collect::<Vec<_>>(),
        vec![true, true, false]
    );
    assert!(rows.iter().all(|r| !r.marked));
    assert_eq!(
        panel.counts(),
        ReviewCounts {
            answered: 2,
            unanswered: 1,
            marked: 0,
            errors: 0
        }
    );
    assert_eq!(panel.finish_now().unwrap(), ReviewDismissal::Finished);

    assert_eq!(engine.status(), AttemptStatus::Finished);
    assert!(!engine.attempt().timed_out());
    let finished = engine.attempt().clone();

    let results = reporter.results();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].score, 2);
    assert_eq!(results[0].total_questions, 3);

    engine.close().await;
    let stored = repo
        .load_attempt(&QuizId::new("bio-pt-1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored, finished);
}

#[tokio::test]
async fn timer_expiry_after_explicit_finish_changes_nothing() {
    let repo = InMemoryRepository::new();
    let reporter = Arc::new(CollectingScoreReporter::new());
    let svc = service(&repo).with_reporter(reporter.clone());
    let mut engine = start_fresh(&svc, "bio-pt-1", &pro()).await;

    let duration = PracticeTestSettings::default().duration_secs();
    let TickOutcome::Expired(token) = engine.tick(duration) else {
        panic!("countdown should expire");
    };

    // The user finishes before the expiry is handled.
    assert!(engine.finish(false).unwrap());
    let finished_at = engine.attempt().finished_at();
    let revision = engine.attempt().revision();

    assert!(!engine.finish_on_timeout(token).unwrap());
    assert!(!engine.finish(true).unwrap());
    assert_eq!(engine.attempt().finished_at(), finished_at);
    assert!(!engine.attempt().timed_out());
    assert_eq!(engine.attempt().revision(), revision);
    assert_eq!(reporter.results().len(), 1);
    engine.close().await;
}

#[tokio::test(start_paused = true)]
async fn ticker_drives_countdown_to_auto_finish() {
    let repo = InMemoryRepository::new();
    let svc = service(&repo);
    let mut engine = start_fresh(&svc, "bio-pt-2", &pro()).await;

    let (ticker, mut ticks) = Ticker::spawn(Duration::from_secs(60));
    while let Some(secs) = ticks.recv().await {
        match engine.tick(secs) {
            TickOutcome::Running { .. } => {}
            TickOutcome::Expired(token) => {
                assert!(engine.finish_on_timeout(token).unwrap());
                break;
            }
            TickOutcome::Idle => panic!("timer went idle before expiring"),
        }
    }
    ticker.stop();

    assert!(engine.attempt().is_finished());
    assert!(engine.attempt().timed_out());
    assert_eq!(engine.timer().value_secs(), 0);
    assert!(matches!(engine.tick(60), TickOutcome::Idle));
    engine.close().await;
}

#[tokio::test]
async fn resume_restores_answers_and_position() {
    let repo = InMemoryRepository::new();
    let mut stored = Attempt::new(
        QuizId::new("bio-pt-1"),
        SectionType::Practice,
        3,
        PracticeTestSettings::default(),
        fixed_now(),
    )
    .unwrap();
    stored.start(fixed_now()).unwrap();
    stored.select_option(0, "Burst").unwrap();
    stored.select_option(2, "A").unwrap();
    stored.move_to(2).unwrap();
    stored
        .update_highlight("question_2", "<p><mark>Which</mark> one?</p>")
        .unwrap();
    assert_eq!(repo.save_attempt(&stored).await.unwrap(), SaveAck::Stored);

    let svc = service(&repo);
    let outcome = svc
        .start_or_resume(
            &TopicId::new("bio"),
            &QuizId::new("bio-pt-1"),
            SectionType::Practice,
            Some(&pro()),
            PracticeTestSettings::default(),
        )
        .await
        .unwrap();
    let StartOutcome::ResumePrompt(prompt) = outcome else {
        panic!("an in-progress attempt should prompt");
    };
    assert_eq!(prompt.answered_count(), 2);
    assert_eq!(prompt.resume_question_number(), 3);
    assert_eq!(prompt.metadata().full_name_for_display, "Biology bio-pt-1");

    let engine = svc.resolve_prompt(prompt, ResumeChoice::Resume).await.unwrap();
    let expected: BTreeMap<usize, String> =
        [(0, "Burst".to_string()), (2, "A".to_string())].into();
    assert_eq!(engine.attempt().submitted_answers(), &expected);
    assert_eq!(engine.current_index(), 2);
    assert_eq!(engine.attempt().id(), stored.id());
    assert_eq!(engine.status(), AttemptStatus::InProgress);
    assert_eq!(engine.attempt().highlights(), stored.highlights());
    engine.close().await;
}

#[tokio::test]
async fn start_over_discards_the_stored_attempt() {
    let repo = InMemoryRepository::new();
    let svc = service(&repo);
    let mut first = start_fresh(&svc, "bio-pt-1", &pro()).await;
    first.select_option(0, "Drop").unwrap();
    let old_id = first.attempt().id();
    first.close().await;

    let outcome = svc
        .start_or_resume(
            &TopicId::new("bio"),
            &QuizId::new("bio-pt-1"),
            SectionType::Practice,
            Some(&pro()),
            PracticeTestSettings {
                additional_time: true,
                prometric_delay: false,
            },
        )
        .await
        .unwrap();
    let StartOutcome::ResumePrompt(prompt) = outcome else {
        panic!("expected a resume prompt");
    };
    let engine = svc
        .resolve_prompt(prompt, ResumeChoice::StartOver)
        .await
        .unwrap();

    assert_ne!(engine.attempt().id(), old_id);
    assert!(engine.attempt().submitted_answers().is_empty());
    assert_eq!(engine.current_index(), 0);
    assert_eq!(engine.status(), AttemptStatus::InProgress);
    engine.close().await;

    let stored = repo
        .load_attempt(&QuizId::new("bio-pt-1"))
        .await
        .unwrap()
        .unwrap();
    assert_ne!(stored.id(), old_id);
}

#[tokio::test]
async fn free_tier_only_opens_the_first_item() {
    let repo = InMemoryRepository::new();
    let svc = service(&repo);
    let free = UserProfile::new("u-2", UserTier::Free);

    for (quiz, locked) in [("bio-pt-1", false), ("bio-pt-2", true), ("bio-pt-3", true)] {
        let outcome = svc
            .start_or_resume(
                &TopicId::new("bio"),
                &QuizId::new(quiz),
                SectionType::Practice,
                Some(&free),
                PracticeTestSettings::default(),
            )
            .await
            .unwrap();
        assert_eq!(matches!(outcome, StartOutcome::Locked), locked, "{quiz}");
        if let StartOutcome::Started(started) = outcome {
            started.engine.close().await;
        }
    }
    assert!(repo.load_attempt(&QuizId::new("bio-pt-2")).await.unwrap().is_none());

    // No profile at all locks everything.
    let outcome = svc
        .start_or_resume(
            &TopicId::new("bio"),
            &QuizId::new("bio-qb-1"),
            SectionType::Qbank,
            None,
            PracticeTestSettings::default(),
        )
        .await
        .unwrap();
    assert!(matches!(outcome, StartOutcome::Locked));
    assert!(!svc.locked_item_tapped().message.is_empty());
}

#[tokio::test]
async fn unknown_item_is_a_storage_error() {
    let repo = InMemoryRepository::new();
    let err = service(&repo)
        .start_or_resume(
            &TopicId::new("bio"),
            &QuizId::new("missing"),
            SectionType::Practice,
            Some(&pro()),
            PracticeTestSettings::default(),
        )
        .await
        .err()
        .unwrap();
    assert!(matches!(
        err,
        services::SessionError::Storage(StorageError::NotFound)
    ));
}

/// Loads always fail; saves go to memory.
struct UnreadableRepo(InMemoryRepository);

#[async_trait]
impl AttemptRepository for UnreadableRepo {
    async fn load_attempt(&self, _quiz_id: &QuizId) -> Result<Option<Attempt>, StorageError> {
        Err(StorageError::Connection("offline".into()))
    }

    async fn save_attempt(&self, attempt: &Attempt) -> Result<SaveAck, StorageError> {
        self.0.save_attempt(attempt).await
    }

    async fn delete_attempt(&self, quiz_id: &QuizId) -> Result<(), StorageError> {
        self.0.delete_attempt(quiz_id).await
    }
}

#[tokio::test]
async fn unreadable_attempt_degrades_to_fresh_start() {
    let svc = QuizSessionService::new(
        Clock::fixed(fixed_now()),
        Arc::new(catalog()),
        Arc::new(UnreadableRepo(InMemoryRepository::new())),
    );
    let outcome = svc
        .start_or_resume(
            &TopicId::new("bio"),
            &QuizId::new("bio-pt-1"),
            SectionType::Practice,
            Some(&pro()),
            PracticeTestSettings::default(),
        )
        .await
        .unwrap();
    let StartOutcome::Started(started) = outcome else {
        panic!("a failed load should not block the session");
    };
    assert!(started.load_degraded);
    assert_eq!(started.engine.status(), AttemptStatus::InProgress);
    started.engine.close().await;
}

/// Holds the first save open until released; every later save goes straight to memory.
struct GatedRepo {
    inner: InMemoryRepository,
    gate_first: AtomicBool,
    entered: Notify,
    release: Notify,
}

impl GatedRepo {
    fn new() -> Self {
        Self {
            inner: InMemoryRepository::new(),
            gate_first: AtomicBool::new(true),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl AttemptRepository for GatedRepo {
    async fn load_attempt(&self, quiz_id: &QuizId) -> Result<Option<Attempt>, StorageError> {
        self.inner.load_attempt(quiz_id).await
    }

    async fn save_attempt(&self, attempt: &Attempt) -> Result<SaveAck, StorageError> {
        if self.gate_first.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.inner.save_attempt(attempt).await
    }

    async fn delete_attempt(&self, quiz_id: &QuizId) -> Result<(), StorageError> {
        self.inner.delete_attempt(quiz_id).await
    }
}

#[tokio::test]
async fn finish_wins_over_a_save_still_in_flight() {
    let repo = Arc::new(GatedRepo::new());
    let svc = QuizSessionService::new(
        Clock::fixed(fixed_now()),
        Arc::new(catalog()),
        Arc::clone(&repo) as Arc<dyn AttemptRepository>,
    );

    let mut engine = start_fresh(&svc, "bio-pt-1", &pro()).await;
    // The InProgress snapshot from start() is now blocked inside the repository.
    repo.entered.notified().await;

    engine.select_option(0, "Burst").unwrap();
    assert!(engine.finish(false).unwrap());
    let finished_revision = engine.attempt().revision();
    repo.release.notify_one();

    let state = engine.close().await.unwrap();
    assert_eq!(state.settled_revision, Some(finished_revision));
    assert!(state.last_error.is_none());

    let stored = repo
        .inner
        .load_attempt(&QuizId::new("bio-pt-1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status(), AttemptStatus::Finished);
    assert_eq!(stored.revision(), finished_revision);
    assert_eq!(stored.answer(0), Some("Burst"));
}

#[tokio::test]
async fn sqlite_backed_session_survives_restart() {
    let url = "sqlite:file:session_flow_restart?mode=memory&cache=shared";
    let storage = Storage::sqlite(url).await.unwrap();
    let svc = QuizSessionService::new(
        Clock::fixed(fixed_now()),
        Arc::new(catalog()),
        Arc::clone(&storage.attempts),
    );

    let mut engine = start_fresh(&svc, "bio-pt-3", &pro()).await;
    engine.select_option(1, "FSH").unwrap();
    engine.toggle_mark(1).unwrap();
    engine.toggle_cross_off(0, "Drop").unwrap();
    engine.go_to(1).unwrap();
    let state = engine.close().await.unwrap();
    assert!(state.last_error.is_none());

    let outcome = svc
        .start_or_resume(
            &TopicId::new("bio"),
            &QuizId::new("bio-pt-3"),
            SectionType::Practice,
            Some(&pro()),
            PracticeTestSettings::default(),
        )
        .await
        .unwrap();
    let StartOutcome::ResumePrompt(prompt) = outcome else {
        panic!("expected the stored attempt to be offered");
    };
    let attempt = prompt.attempt();
    assert_eq!(attempt.answer(1), Some("FSH"));
    assert!(attempt.is_marked(1));
    assert!(attempt.is_crossed_off(0, "Drop"));
    assert_eq!(attempt.current_index(), 1);
}
