use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use quiz_core::model::{
    Attempt, AttemptError, AttemptStatus, HighlightTarget, Question, QuizContent,
};
use quiz_core::time::elapsed_secs;
use tracing::debug;

use super::autosave::{AttemptSaver, SaveState};
use super::timer::{ExpiryToken, QuizTimer, TimerTick};
use crate::Clock;
use crate::error::SessionError;
use crate::score::ScoreReporter;

//
// ─── PRESENTATION STATE ────────────────────────────────────────────────────────
//

/// Visibility toggles that are never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Presentation {
    exhibit_visible: bool,
    solution_revealed: BTreeSet<usize>,
    explanation_shown: BTreeSet<usize>,
}

/// What happened when the clock advanced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Running { value_secs: u32 },
    /// The countdown hit zero. Pass the token to [`QuizSessionEngine::finish_on_timeout`].
    Expired(ExpiryToken),
    /// The session is finished or the timer no longer runs.
    Idle,
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// Drives one attempt at one quiz.
///
/// Every operation validates first and mutates second, so a rejected action
/// leaves the attempt untouched. Each accepted mutation hands a full snapshot
/// to the autosave worker when one is attached.
pub struct QuizSessionEngine {
    clock: Clock,
    content: Arc<QuizContent>,
    attempt: Attempt,
    timer: QuizTimer,
    /// Bumped whenever a pending expiry must stop counting.
    timer_generation: u64,
    question_started_at: Option<DateTime<Utc>>,
    presentation: Presentation,
    saver: Option<AttemptSaver>,
    reporter: Option<Arc<dyn ScoreReporter>>,
}

impl QuizSessionEngine {
    /// Wraps an attempt for the given quiz.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` for a quiz without questions, or
    /// `SessionError::Attempt` if the attempt was made for a different question set.
    pub fn new(content: Arc<QuizContent>, attempt: Attempt, clock: Clock) -> Result<Self, SessionError> {
        if content.questions.is_empty() {
            return Err(SessionError::Empty);
        }
        if attempt.quiz_id() != &content.id || attempt.question_count() != content.question_count() {
            return Err(SessionError::Attempt(AttemptError::InvalidPersistedState(format!(
                "attempt for {} with {} questions does not match quiz {} with {}",
                attempt.quiz_id(),
                attempt.question_count(),
                content.id,
                content.question_count()
            ))));
        }
        if attempt.section_type() != content.section_type {
            return Err(SessionError::Attempt(AttemptError::InvalidPersistedState(format!(
                "attempt for {} was made in the {} section, quiz is listed under {}",
                attempt.quiz_id(),
                attempt.section_type().as_str(),
                content.section_type.as_str()
            ))));
        }

        Ok(Self {
            clock,
            timer: QuizTimer::from_snapshot(attempt.timer()),
            content,
            attempt,
            timer_generation: 0,
            question_started_at: None,
            presentation: Presentation::default(),
            saver: None,
            reporter: None,
        })
    }

    #[must_use]
    pub fn with_saver(mut self, saver: AttemptSaver) -> Self {
        self.saver = Some(saver);
        self
    }

    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn ScoreReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    // ─── Read side ─────────────────────────────────────────────────────────────

    #[must_use]
    pub fn attempt(&self) -> &Attempt {
        &self.attempt
    }

    #[must_use]
    pub fn content(&self) -> &QuizContent {
        &self.content
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.content.questions
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.content.questions.len()
    }

    #[must_use]
    pub fn status(&self) -> AttemptStatus {
        self.attempt.status()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.attempt.current_index()
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.content.questions[self.attempt.current_index()]
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.content.questions.get(index)
    }

    #[must_use]
    pub fn timer(&self) -> &QuizTimer {
        &self.timer
    }

    #[must_use]
    pub fn is_exhibit_visible(&self) -> bool {
        self.presentation.exhibit_visible
    }

    #[must_use]
    pub fn is_solution_revealed(&self, index: usize) -> bool {
        self.presentation.solution_revealed.contains(&index)
    }

    #[must_use]
    pub fn is_explanation_shown(&self, index: usize) -> bool {
        self.presentation.explanation_shown.contains(&index)
    }

    /// Solutions are part of question banks, and of every quiz once it is finished.
    #[must_use]
    pub fn solution_available(&self, index: usize) -> bool {
        let Some(question) = self.question(index) else {
            return false;
        };
        let unlocked = self.attempt.section_type().offers_solutions() || self.attempt.is_finished();
        unlocked && !question.is_placeholder() && (question.correct_label().is_some() || question.has_solution())
    }

    #[must_use]
    pub fn explanation_available(&self, index: usize) -> bool {
        self.solution_available(index) && self.question(index).is_some_and(Question::has_solution)
    }

    #[must_use]
    pub fn exhibit_available(&self, index: usize) -> bool {
        self.question(index).is_some_and(Question::has_exhibit)
    }

    #[must_use]
    pub fn save_state(&self) -> Option<SaveState> {
        self.saver.as_ref().map(AttemptSaver::state)
    }

    #[must_use]
    pub fn saver(&self) -> Option<&AttemptSaver> {
        self.saver.as_ref()
    }

    /// Direct access to the clock, for time-driven tests and replays.
    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    // ─── Lifecycle ─────────────────────────────────────────────────────────────

    /// Moves `NotStarted` to `InProgress`; a resumed attempt just restarts its question clock.
    ///
    /// A countdown that already ran out finishes the attempt as timed out.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Finished` for a finished attempt.
    pub fn start(&mut self) -> Result<bool, SessionError> {
        let now = self.clock.now();
        let started = self.attempt.start(now)?;
        self.question_started_at = Some(now);
        if started {
            debug!(quiz_id = %self.attempt.quiz_id(), "attempt started");
            self.commit(now);
        }
        if self.timer.is_expired() {
            self.finish(true)?;
        }
        Ok(started)
    }

    /// Ends the attempt. Returns `false` if it was already finished.
    ///
    /// Finishing disarms any pending timer expiry and hands the attempt to the
    /// score reporter.
    ///
    /// # Errors
    ///
    /// Propagates attempt errors from the final time accounting.
    pub fn finish(&mut self, timed_out: bool) -> Result<bool, SessionError> {
        if self.attempt.is_finished() {
            return Ok(false);
        }
        let now = self.clock.now();
        self.account_question_time(now)?;
        self.attempt.sync_timer(self.timer.value_secs())?;
        self.attempt.finish(now, timed_out);
        self.timer.stop();
        self.timer_generation += 1;
        self.question_started_at = None;
        debug!(quiz_id = %self.attempt.quiz_id(), timed_out, "attempt finished");

        self.commit(now);
        if let Some(reporter) = &self.reporter {
            reporter.report(&self.attempt, &self.content.questions);
        }
        Ok(true)
    }

    /// Timer-driven finish. A stale token, or an attempt that already
    /// finished, makes this a no-op that returns `false`.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`finish`](Self::finish).
    pub fn finish_on_timeout(&mut self, token: ExpiryToken) -> Result<bool, SessionError> {
        if token.generation != self.timer_generation || self.attempt.is_finished() {
            debug!(quiz_id = %self.attempt.quiz_id(), "ignoring stale timer expiry");
            return Ok(false);
        }
        self.finish(true)
    }

    /// Advances the quiz clock by `secs`.
    pub fn tick(&mut self, secs: u32) -> TickOutcome {
        if self.attempt.status() != AttemptStatus::InProgress {
            return TickOutcome::Idle;
        }
        match self.timer.tick(secs) {
            TimerTick::Running { value_secs } => TickOutcome::Running { value_secs },
            TimerTick::Expired => TickOutcome::Expired(ExpiryToken {
                generation: self.timer_generation,
            }),
            TimerTick::Idle => TickOutcome::Idle,
        }
    }

    /// Writes the timer reading into the attempt and queues a save when it changed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Finished` for a finished attempt.
    pub fn checkpoint(&mut self) -> Result<bool, SessionError> {
        let before = self.attempt.revision();
        self.attempt.sync_timer(self.timer.value_secs())?;
        let changed = self.attempt.revision() != before;
        if changed {
            self.commit(self.clock.now());
        }
        Ok(changed)
    }

    // ─── Answering ─────────────────────────────────────────────────────────────

    /// Records (or overwrites) the answer to `index`. Does not move.
    ///
    /// # Errors
    ///
    /// `InvalidQuestionIndex`, `Finished`, or `UnknownOption` when the question
    /// does not offer `label`.
    pub fn select_option(&mut self, index: usize, label: &str) -> Result<(), SessionError> {
        self.ensure_option(index, label)?;
        self.attempt.select_option(index, label)?;
        self.commit(self.clock.now());
        Ok(())
    }

    /// Strikes out an option, or restores it. Returns the new crossed-off state.
    ///
    /// # Errors
    ///
    /// Same as [`select_option`](Self::select_option).
    pub fn toggle_cross_off(&mut self, index: usize, label: &str) -> Result<bool, SessionError> {
        self.ensure_option(index, label)?;
        let crossed = self.attempt.toggle_cross_off(index, label)?;
        self.commit(self.clock.now());
        Ok(crossed)
    }

    /// Flips the review flag of `index`. Returns the new marked state.
    ///
    /// # Errors
    ///
    /// `InvalidQuestionIndex` or `Finished`.
    pub fn toggle_mark(&mut self, index: usize) -> Result<bool, SessionError> {
        let marked = self.attempt.toggle_mark(index)?;
        self.commit(self.clock.now());
        Ok(marked)
    }

    /// Stores highlighted HTML for one piece of question content.
    ///
    /// # Errors
    ///
    /// `InvalidQuestionIndex`, `UnknownOption` or `Finished`.
    pub fn update_highlight(
        &mut self,
        target: &HighlightTarget,
        html: impl Into<String>,
    ) -> Result<(), SessionError> {
        match target {
            HighlightTarget::Option { index, label } => self.ensure_option(*index, label)?,
            HighlightTarget::Prompt(index) | HighlightTarget::Explanation(index) => {
                self.ensure_mutable()?;
                self.ensure_index(*index)?;
            }
        }
        let revision = self.attempt.revision();
        self.attempt.update_highlight(target.key(), html)?;
        if self.attempt.revision() != revision {
            self.commit(self.clock.now());
        }
        Ok(())
    }

    // ─── Navigation ────────────────────────────────────────────────────────────

    /// Moves forward one question. At the last question this is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Finished` for a finished attempt.
    pub fn next(&mut self) -> Result<usize, SessionError> {
        self.ensure_mutable()?;
        let current = self.attempt.current_index();
        if current + 1 >= self.question_count() {
            return Ok(current);
        }
        self.go_to(current + 1)
    }

    /// Moves back one question. At the first question this is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Finished` for a finished attempt.
    pub fn previous(&mut self) -> Result<usize, SessionError> {
        self.ensure_mutable()?;
        let current = self.attempt.current_index();
        if current == 0 {
            return Ok(current);
        }
        self.go_to(current - 1)
    }

    /// Jumps to `index`, booking the time spent on the question being left.
    ///
    /// # Errors
    ///
    /// `InvalidQuestionIndex` or `Finished`.
    pub fn go_to(&mut self, index: usize) -> Result<usize, SessionError> {
        self.ensure_mutable()?;
        self.ensure_index(index)?;
        if index == self.attempt.current_index() {
            return Ok(index);
        }
        let now = self.clock.now();
        self.account_question_time(now)?;
        self.attempt.move_to(index)?;
        self.question_started_at = Some(now);
        self.commit(now);
        Ok(index)
    }

    /// Books time on the current question and stops its clock, e.g. while the review panel is open.
    ///
    /// # Errors
    ///
    /// Propagates attempt errors from the time accounting.
    pub fn pause_question_clock(&mut self) -> Result<(), SessionError> {
        if self.attempt.is_finished() {
            return Ok(());
        }
        let now = self.clock.now();
        self.account_question_time(now)?;
        self.question_started_at = None;
        self.commit(now);
        Ok(())
    }

    pub fn resume_question_clock(&mut self) {
        if self.attempt.status() == AttemptStatus::InProgress && self.question_started_at.is_none() {
            self.question_started_at = Some(self.clock.now());
        }
    }

    // ─── Presentation ──────────────────────────────────────────────────────────

    /// Reveals or hides the answer key for the current question.
    ///
    /// # Errors
    ///
    /// `SolutionUnavailable` when the quiz offers no solution for it.
    pub fn toggle_solution(&mut self) -> Result<bool, SessionError> {
        let index = self.attempt.current_index();
        if !self.solution_available(index) {
            return Err(SessionError::SolutionUnavailable { index });
        }
        Ok(toggle(&mut self.presentation.solution_revealed, index))
    }

    /// Shows or hides the full written explanation for the current question.
    ///
    /// # Errors
    ///
    /// `SolutionUnavailable` when there is no explanation to show.
    pub fn toggle_explanation(&mut self) -> Result<bool, SessionError> {
        let index = self.attempt.current_index();
        if !self.explanation_available(index) {
            return Err(SessionError::SolutionUnavailable { index });
        }
        Ok(toggle(&mut self.presentation.explanation_shown, index))
    }

    /// Shows or hides the exhibit panel.
    ///
    /// # Errors
    ///
    /// `ExhibitUnavailable` when the current question has no exhibit.
    pub fn toggle_exhibit(&mut self) -> Result<bool, SessionError> {
        let index = self.attempt.current_index();
        if !self.exhibit_available(index) {
            return Err(SessionError::ExhibitUnavailable { index });
        }
        self.presentation.exhibit_visible = !self.presentation.exhibit_visible;
        Ok(self.presentation.exhibit_visible)
    }

    // ─── Shutdown ──────────────────────────────────────────────────────────────

    /// Queues a final snapshot and waits for the autosave worker to drain.
    pub async fn close(mut self) -> Option<SaveState> {
        if !self.attempt.is_finished() {
            let now = self.clock.now();
            if self.account_question_time(now).is_ok()
                && self.attempt.sync_timer(self.timer.value_secs()).is_ok()
            {
                self.commit(now);
            }
        }
        match self.saver.take() {
            Some(saver) => Some(saver.shutdown().await),
            None => None,
        }
    }

    // ─── Internals ─────────────────────────────────────────────────────────────

    fn ensure_mutable(&self) -> Result<(), SessionError> {
        if self.attempt.is_finished() {
            return Err(SessionError::Finished);
        }
        Ok(())
    }

    fn ensure_index(&self, index: usize) -> Result<(), SessionError> {
        if index >= self.question_count() {
            return Err(SessionError::InvalidQuestionIndex {
                index,
                count: self.question_count(),
            });
        }
        Ok(())
    }

    fn ensure_option(&self, index: usize, label: &str) -> Result<(), SessionError> {
        self.ensure_mutable()?;
        self.ensure_index(index)?;
        if !self.content.questions[index].has_option(label) {
            return Err(SessionError::UnknownOption {
                index,
                label: label.to_owned(),
            });
        }
        Ok(())
    }

    fn account_question_time(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        if self.attempt.status() != AttemptStatus::InProgress {
            return Ok(());
        }
        if let Some(since) = self.question_started_at {
            let secs = elapsed_secs(since, now);
            self.attempt.add_time_spent(self.attempt.current_index(), secs)?;
            self.question_started_at = Some(now);
        }
        Ok(())
    }

    fn commit(&mut self, now: DateTime<Utc>) {
        self.attempt.touch(now);
        if let Some(saver) = &self.saver {
            saver.enqueue(self.attempt.clone());
        }
    }
}

fn toggle(set: &mut BTreeSet<usize>, index: usize) -> bool {
    if set.remove(&index) {
        false
    } else {
        set.insert(index);
        true
    }
}
