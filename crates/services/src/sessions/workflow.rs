use std::sync::Arc;

use quiz_core::access::is_locked_for;
use quiz_core::model::{
    Attempt, PracticeTestSettings, QuizContent, QuizId, SectionType, TopicId, TopicStructure,
    UserProfile,
};
use storage::repository::{AttemptRepository, ContentRepository, StorageError};
use tracing::{debug, info, warn};

use super::autosave::{AttemptSaver, RetryPolicy};
use super::engine::QuizSessionEngine;
use super::resume::{GateDecision, ResumeChoice, ResumeGate, ResumePrompt};
use crate::Clock;
use crate::error::SessionError;
use crate::score::ScoreReporter;

/// A running session plus how it came to be.
pub struct StartedSession {
    pub engine: QuizSessionEngine,
    /// The stored attempt could not be read; this session started fresh instead.
    pub load_degraded: bool,
}

/// Result of asking to enter a quiz.
pub enum StartOutcome {
    Started(StartedSession),
    /// An in-progress attempt exists; resolve with [`QuizSessionService::resolve_prompt`].
    ResumePrompt(ResumePrompt),
    /// The item is not available on the user's tier. Nothing was loaded.
    Locked,
}

/// Message shown when a locked item is tapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeNotice {
    pub title: &'static str,
    pub message: &'static str,
}

pub const UPGRADE_NOTICE: UpgradeNotice = UpgradeNotice {
    title: "Premium content",
    message: "Upgrade your plan to unlock every practice test and question bank.",
};

/// Orchestrates access checks, resume decisions and engine construction.
#[derive(Clone)]
pub struct QuizSessionService {
    clock: Clock,
    content: Arc<dyn ContentRepository>,
    attempts: Arc<dyn AttemptRepository>,
    reporter: Option<Arc<dyn ScoreReporter>>,
    retry: RetryPolicy,
    autosave: bool,
}

impl QuizSessionService {
    #[must_use]
    pub fn new(
        clock: Clock,
        content: Arc<dyn ContentRepository>,
        attempts: Arc<dyn AttemptRepository>,
    ) -> Self {
        Self {
            clock,
            content,
            attempts,
            reporter: None,
            retry: RetryPolicy::default(),
            autosave: true,
        }
    }

    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn ScoreReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Disables the background saver; sessions then live purely in memory.
    #[must_use]
    pub fn without_autosave(mut self) -> Self {
        self.autosave = false;
        self
    }

    /// Practice tests and question banks listed under `topic_id`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when the topic is unknown or unreadable.
    pub async fn topic_structure(&self, topic_id: &TopicId) -> Result<TopicStructure, SessionError> {
        Ok(self.content.topic_structure(topic_id).await?)
    }

    #[must_use]
    pub fn locked_item_tapped(&self) -> UpgradeNotice {
        debug!("locked item tapped");
        UPGRADE_NOTICE
    }

    /// Enters a quiz listed under `topic_id`.
    ///
    /// The access policy is checked again here, so a locked item never starts
    /// even if the caller skipped its own check.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when the topic, item or quiz cannot be
    /// loaded, and `SessionError::Empty` for a quiz without questions.
    /// A failure to read the stored attempt is not an error; see
    /// [`StartedSession::load_degraded`].
    pub async fn start_or_resume(
        &self,
        topic_id: &TopicId,
        item_id: &QuizId,
        section: SectionType,
        profile: Option<&UserProfile>,
        settings: PracticeTestSettings,
    ) -> Result<StartOutcome, SessionError> {
        let topic = self.content.topic_structure(topic_id).await?;
        let item = topic
            .find_item(item_id, section)
            .ok_or(StorageError::NotFound)?;
        if is_locked_for(profile, item.position) {
            info!(quiz_id = %item_id, position = item.position, "quiz is locked for this tier");
            return Ok(StartOutcome::Locked);
        }

        let content = Arc::new(self.content.load_quiz(item_id).await?);
        if content.questions.is_empty() {
            return Err(SessionError::Empty);
        }

        let (stored, load_degraded) = match self.attempts.load_attempt(item_id).await {
            Ok(stored) => (stored, false),
            Err(err) => {
                warn!(quiz_id = %item_id, error = %err, "failed to load stored attempt, starting fresh");
                (None, true)
            }
        };

        match ResumeGate::evaluate(stored, &content) {
            GateDecision::PriorAttempt(attempt) => {
                debug!(quiz_id = %item_id, index = attempt.current_index(), "offering resume");
                Ok(StartOutcome::ResumePrompt(ResumePrompt { content, attempt }))
            }
            GateDecision::NoPriorAttempt => {
                let engine = self.fresh_engine(content, settings)?;
                Ok(StartOutcome::Started(StartedSession {
                    engine,
                    load_degraded,
                }))
            }
        }
    }

    /// Acts on the user's answer to the resume prompt.
    ///
    /// # Errors
    ///
    /// `StartOver` fails with `SessionError::Storage` if the old attempt
    /// cannot be discarded; the prompt should then stay up.
    pub async fn resolve_prompt(
        &self,
        prompt: ResumePrompt,
        choice: ResumeChoice,
    ) -> Result<QuizSessionEngine, SessionError> {
        match choice {
            ResumeChoice::Resume => self.resume(prompt),
            ResumeChoice::StartOver => self.start_over(prompt).await,
        }
    }

    /// Continues the stored attempt unchanged.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the attempt no longer fits the quiz.
    pub fn resume(&self, prompt: ResumePrompt) -> Result<QuizSessionEngine, SessionError> {
        let ResumePrompt { content, attempt } = prompt;
        debug!(quiz_id = %attempt.quiz_id(), "resuming attempt");
        let mut engine = self.attach(QuizSessionEngine::new(content, attempt, self.clock)?);
        engine.start()?;
        Ok(engine)
    }

    /// Discards the stored attempt and starts a fresh one with the same settings.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the stored attempt cannot be deleted.
    pub async fn start_over(&self, prompt: ResumePrompt) -> Result<QuizSessionEngine, SessionError> {
        let ResumePrompt { content, attempt } = prompt;
        self.attempts.delete_attempt(attempt.quiz_id()).await?;
        debug!(quiz_id = %attempt.quiz_id(), "discarded attempt, starting over");
        self.fresh_engine(content, attempt.settings())
    }

    fn fresh_engine(
        &self,
        content: Arc<QuizContent>,
        settings: PracticeTestSettings,
    ) -> Result<QuizSessionEngine, SessionError> {
        let attempt = Attempt::new(
            content.id.clone(),
            content.section_type,
            content.question_count(),
            settings,
            self.clock.now(),
        )?;
        let mut engine = self.attach(QuizSessionEngine::new(content, attempt, self.clock)?);
        engine.start()?;
        Ok(engine)
    }

    fn attach(&self, mut engine: QuizSessionEngine) -> QuizSessionEngine {
        if self.autosave {
            engine = engine.with_saver(AttemptSaver::spawn(Arc::clone(&self.attempts), self.retry));
        }
        if let Some(reporter) = &self.reporter {
            engine = engine.with_reporter(Arc::clone(reporter));
        }
        engine
    }
}
