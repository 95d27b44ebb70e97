use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::content::SectionType;
use crate::model::ids::{AttemptId, QuizId};

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("question index {index} is out of range for {count} questions")]
    InvalidQuestionIndex { index: usize, count: usize },

    #[error("attempt is finished")]
    Finished,

    #[error("a quiz must contain at least one question")]
    EmptyQuiz,

    #[error("invalid persisted attempt: {0}")]
    InvalidPersistedState(String),
}

//
// ─── STATUS ───────────────────────────────────────────────────────────────────
//

/// Lifecycle of an attempt. `Finished` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    NotStarted,
    InProgress,
    Finished,
}

impl AttemptStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AttemptStatus::NotStarted => "not_started",
            AttemptStatus::InProgress => "in_progress",
            AttemptStatus::Finished => "finished",
        }
    }
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttemptStatus {
    type Err = AttemptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(AttemptStatus::NotStarted),
            "in_progress" => Ok(AttemptStatus::InProgress),
            "finished" => Ok(AttemptStatus::Finished),
            other => Err(AttemptError::InvalidPersistedState(format!(
                "unknown status: {other}"
            ))),
        }
    }
}

//
// ─── TIMER & SETTINGS ─────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerMode {
    /// Counts down from a fixed duration; reaching zero ends the attempt.
    Countdown,
    /// Counts elapsed time with no limit.
    CountUp,
}

impl TimerMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TimerMode::Countdown => "countdown",
            TimerMode::CountUp => "count_up",
        }
    }
}

impl FromStr for TimerMode {
    type Err = AttemptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "countdown" => Ok(TimerMode::Countdown),
            "count_up" => Ok(TimerMode::CountUp),
            other => Err(AttemptError::InvalidPersistedState(format!(
                "unknown timer mode: {other}"
            ))),
        }
    }
}

/// Persisted clock state so a resumed attempt continues where it stopped.
///
/// `value_secs` is the remaining time for a countdown and the elapsed time
/// for a count-up timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub mode: TimerMode,
    pub initial_secs: u32,
    pub value_secs: u32,
}

impl TimerSnapshot {
    #[must_use]
    pub fn countdown(duration_secs: u32) -> Self {
        Self {
            mode: TimerMode::Countdown,
            initial_secs: duration_secs,
            value_secs: duration_secs,
        }
    }

    #[must_use]
    pub fn count_up() -> Self {
        Self {
            mode: TimerMode::CountUp,
            initial_secs: 0,
            value_secs: 0,
        }
    }

    #[must_use]
    pub fn is_countdown(&self) -> bool {
        self.mode == TimerMode::Countdown
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_countdown() && self.value_secs == 0
    }
}

/// Standard length of a full practice test.
pub const BASE_PRACTICE_TEST_MINUTES: u32 = 180;

/// Accommodations chosen before a practice test starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PracticeTestSettings {
    /// Time-and-a-half accommodation.
    pub additional_time: bool,
    /// Simulate the test-centre delay between sections.
    pub prometric_delay: bool,
}

impl PracticeTestSettings {
    #[must_use]
    pub fn duration_secs(&self) -> u32 {
        let base = BASE_PRACTICE_TEST_MINUTES * 60;
        if self.additional_time {
            base + base / 2
        } else {
            base
        }
    }

    /// Initial timer for a section: practice tests count down, banks count up.
    #[must_use]
    pub fn initial_timer(&self, section: SectionType) -> TimerSnapshot {
        match section {
            SectionType::Practice => TimerSnapshot::countdown(self.duration_secs()),
            SectionType::Qbank => TimerSnapshot::count_up(),
        }
    }
}

//
// ─── HIGHLIGHTS ───────────────────────────────────────────────────────────────
//

/// A piece of question content the user can highlight.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HighlightTarget {
    Prompt(usize),
    Option { index: usize, label: String },
    Explanation(usize),
}

impl HighlightTarget {
    /// Storage key: `question_{i}`, `option_{i}_{label}` or `explanation_{i}`.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::Prompt(index) => format!("question_{index}"),
            Self::Option { index, label } => format!("option_{index}_{label}"),
            Self::Explanation(index) => format!("explanation_{index}"),
        }
    }
}

//
// ─── PERSISTED PARTS ──────────────────────────────────────────────────────────
//

/// Flat, storage-friendly shape of an attempt.
///
/// Repositories build this from rows and hand it to [`Attempt::from_parts`],
/// which re-checks every invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptParts {
    pub id: AttemptId,
    pub quiz_id: QuizId,
    pub section_type: SectionType,
    pub status: AttemptStatus,
    pub question_count: usize,
    pub current_index: usize,
    pub submitted_answers: BTreeMap<usize, String>,
    pub marked_questions: BTreeSet<usize>,
    pub visited: BTreeSet<usize>,
    pub crossed_off: BTreeMap<usize, BTreeSet<String>>,
    pub time_spent: BTreeMap<usize, u32>,
    #[serde(default)]
    pub highlights: BTreeMap<String, String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub timed_out: bool,
    pub timer: TimerSnapshot,
    pub settings: PracticeTestSettings,
    pub revision: u64,
    pub updated_at: DateTime<Utc>,
}

//
// ─── ATTEMPT ──────────────────────────────────────────────────────────────────
//

/// One user's progress through one quiz.
///
/// Invariants held by every constructor and mutation:
/// - `current_index < question_count`
/// - every answered index has been visited
/// - a finished attempt rejects all mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    id: AttemptId,
    quiz_id: QuizId,
    section_type: SectionType,
    status: AttemptStatus,
    question_count: usize,
    current_index: usize,
    submitted_answers: BTreeMap<usize, String>,
    marked_questions: BTreeSet<usize>,
    visited: BTreeSet<usize>,
    crossed_off: BTreeMap<usize, BTreeSet<String>>,
    time_spent: BTreeMap<usize, u32>,
    highlights: BTreeMap<String, String>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    timed_out: bool,
    timer: TimerSnapshot,
    settings: PracticeTestSettings,
    revision: u64,
    updated_at: DateTime<Utc>,
}

impl Attempt {
    /// Creates a fresh, not-yet-started attempt positioned on the first question.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::EmptyQuiz` if `question_count` is zero.
    pub fn new(
        quiz_id: QuizId,
        section_type: SectionType,
        question_count: usize,
        settings: PracticeTestSettings,
        now: DateTime<Utc>,
    ) -> Result<Self, AttemptError> {
        if question_count == 0 {
            return Err(AttemptError::EmptyQuiz);
        }

        Ok(Self {
            id: AttemptId::generate(),
            quiz_id,
            section_type,
            status: AttemptStatus::NotStarted,
            question_count,
            current_index: 0,
            submitted_answers: BTreeMap::new(),
            marked_questions: BTreeSet::new(),
            visited: BTreeSet::from([0]),
            crossed_off: BTreeMap::new(),
            time_spent: BTreeMap::new(),
            highlights: BTreeMap::new(),
            started_at: None,
            finished_at: None,
            timed_out: false,
            timer: settings.initial_timer(section_type),
            settings,
            revision: 0,
            updated_at: now,
        })
    }

    /// Rehydrate an attempt from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::InvalidPersistedState` if any invariant is violated.
    pub fn from_parts(parts: AttemptParts) -> Result<Self, AttemptError> {
        let invalid = |msg: String| Err(AttemptError::InvalidPersistedState(msg));
        let count = parts.question_count;

        if count == 0 {
            return invalid("question_count is zero".into());
        }
        if parts.current_index >= count {
            return invalid(format!(
                "current_index {} out of range for {count}",
                parts.current_index
            ));
        }
        let out_of_range = parts
            .submitted_answers
            .keys()
            .chain(parts.marked_questions.iter())
            .chain(parts.visited.iter())
            .chain(parts.crossed_off.keys())
            .chain(parts.time_spent.keys())
            .find(|&&idx| idx >= count);
        if let Some(idx) = out_of_range {
            return invalid(format!("question index {idx} out of range for {count}"));
        }
        if let Some(idx) = parts
            .submitted_answers
            .keys()
            .find(|idx| !parts.visited.contains(*idx))
        {
            return invalid(format!("answered question {idx} was never visited"));
        }
        if parts.status != AttemptStatus::NotStarted && parts.started_at.is_none() {
            return invalid("started attempt without started_at".into());
        }
        if parts.status == AttemptStatus::Finished && parts.finished_at.is_none() {
            return invalid("finished attempt without finished_at".into());
        }
        if parts.status != AttemptStatus::Finished && parts.timed_out {
            return invalid("timed_out set on an unfinished attempt".into());
        }

        let mut visited = parts.visited;
        visited.insert(parts.current_index);

        Ok(Self {
            id: parts.id,
            quiz_id: parts.quiz_id,
            section_type: parts.section_type,
            status: parts.status,
            question_count: count,
            current_index: parts.current_index,
            submitted_answers: parts.submitted_answers,
            marked_questions: parts.marked_questions,
            visited,
            crossed_off: parts.crossed_off,
            time_spent: parts.time_spent,
            highlights: parts.highlights,
            started_at: parts.started_at,
            finished_at: parts.finished_at,
            timed_out: parts.timed_out,
            timer: parts.timer,
            settings: parts.settings,
            revision: parts.revision,
            updated_at: parts.updated_at,
        })
    }

    #[must_use]
    pub fn to_parts(&self) -> AttemptParts {
        AttemptParts {
            id: self.id,
            quiz_id: self.quiz_id.clone(),
            section_type: self.section_type,
            status: self.status,
            question_count: self.question_count,
            current_index: self.current_index,
            submitted_answers: self.submitted_answers.clone(),
            marked_questions: self.marked_questions.clone(),
            visited: self.visited.clone(),
            crossed_off: self.crossed_off.clone(),
            time_spent: self.time_spent.clone(),
            highlights: self.highlights.clone(),
            started_at: self.started_at,
            finished_at: self.finished_at,
            timed_out: self.timed_out,
            timer: self.timer,
            settings: self.settings,
            revision: self.revision,
            updated_at: self.updated_at,
        }
    }

    // ─── Accessors ─────────────────────────────────────────────────────────────

    #[must_use]
    pub fn id(&self) -> AttemptId {
        self.id
    }

    #[must_use]
    pub fn quiz_id(&self) -> &QuizId {
        &self.quiz_id
    }

    #[must_use]
    pub fn section_type(&self) -> SectionType {
        self.section_type
    }

    #[must_use]
    pub fn status(&self) -> AttemptStatus {
        self.status
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.status == AttemptStatus::Finished
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.question_count
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn submitted_answers(&self) -> &BTreeMap<usize, String> {
        &self.submitted_answers
    }

    #[must_use]
    pub fn answer(&self, index: usize) -> Option<&str> {
        self.submitted_answers.get(&index).map(String::as_str)
    }

    #[must_use]
    pub fn is_answered(&self, index: usize) -> bool {
        self.submitted_answers.contains_key(&index)
    }

    #[must_use]
    pub fn marked_questions(&self) -> &BTreeSet<usize> {
        &self.marked_questions
    }

    #[must_use]
    pub fn is_marked(&self, index: usize) -> bool {
        self.marked_questions.contains(&index)
    }

    #[must_use]
    pub fn visited(&self) -> &BTreeSet<usize> {
        &self.visited
    }

    #[must_use]
    pub fn is_crossed_off(&self, index: usize, label: &str) -> bool {
        self.crossed_off
            .get(&index)
            .is_some_and(|labels| labels.contains(label))
    }

    #[must_use]
    pub fn crossed_off(&self, index: usize) -> Option<&BTreeSet<String>> {
        self.crossed_off.get(&index)
    }

    #[must_use]
    pub fn time_spent(&self, index: usize) -> u32 {
        self.time_spent.get(&index).copied().unwrap_or(0)
    }

    /// Highlighted HTML keyed by [`HighlightTarget::key`].
    #[must_use]
    pub fn highlights(&self) -> &BTreeMap<String, String> {
        &self.highlights
    }

    #[must_use]
    pub fn highlight(&self, target: &HighlightTarget) -> Option<&str> {
        self.highlights.get(&target.key()).map(String::as_str)
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    #[must_use]
    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    #[must_use]
    pub fn timer(&self) -> TimerSnapshot {
        self.timer
    }

    #[must_use]
    pub fn settings(&self) -> PracticeTestSettings {
        self.settings
    }

    /// Number of mutations applied since creation; orders persisted snapshots.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // ─── Mutations ─────────────────────────────────────────────────────────────

    fn ensure_mutable(&self) -> Result<(), AttemptError> {
        if self.is_finished() {
            return Err(AttemptError::Finished);
        }
        Ok(())
    }

    fn ensure_index(&self, index: usize) -> Result<(), AttemptError> {
        if index >= self.question_count {
            return Err(AttemptError::InvalidQuestionIndex {
                index,
                count: self.question_count,
            });
        }
        Ok(())
    }

    fn bump(&mut self) {
        self.revision = self.revision.saturating_add(1);
    }

    /// Records the wall-clock time of the latest mutation.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    /// Moves `NotStarted` to `InProgress`. Returns `false` if already started.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::Finished` for a finished attempt.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<bool, AttemptError> {
        self.ensure_mutable()?;
        if self.status == AttemptStatus::InProgress {
            return Ok(false);
        }
        self.status = AttemptStatus::InProgress;
        self.started_at = Some(now);
        self.bump();
        Ok(true)
    }

    /// Records (or overwrites) the selected option for a question.
    ///
    /// Answering counts as visiting. Selecting an option that was crossed off
    /// restores it.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError` if finished or the index is out of range.
    pub fn select_option(&mut self, index: usize, label: &str) -> Result<(), AttemptError> {
        self.ensure_mutable()?;
        self.ensure_index(index)?;

        if let Some(crossed) = self.crossed_off.get_mut(&index) {
            crossed.remove(label);
            if crossed.is_empty() {
                self.crossed_off.remove(&index);
            }
        }
        self.visited.insert(index);
        self.submitted_answers.insert(index, label.to_owned());
        self.bump();
        Ok(())
    }

    /// Strikes out (or restores) an option. Returns the new crossed-off state.
    ///
    /// Crossing off the currently selected option clears the answer.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError` if finished or the index is out of range.
    pub fn toggle_cross_off(&mut self, index: usize, label: &str) -> Result<bool, AttemptError> {
        self.ensure_mutable()?;
        self.ensure_index(index)?;

        let labels = self.crossed_off.entry(index).or_default();
        let crossed = if labels.remove(label) {
            false
        } else {
            labels.insert(label.to_owned());
            true
        };
        if labels.is_empty() {
            self.crossed_off.remove(&index);
        }

        if crossed && self.answer(index) == Some(label) {
            self.submitted_answers.remove(&index);
        }
        self.bump();
        Ok(crossed)
    }

    /// Flips the review flag of a question. Returns the new marked state.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError` if finished or the index is out of range.
    pub fn toggle_mark(&mut self, index: usize) -> Result<bool, AttemptError> {
        self.ensure_mutable()?;
        self.ensure_index(index)?;

        let marked = if self.marked_questions.remove(&index) {
            false
        } else {
            self.marked_questions.insert(index);
            true
        };
        self.bump();
        Ok(marked)
    }

    /// Positions the attempt on `index` and records the visit.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError` if finished or the index is out of range.
    pub fn move_to(&mut self, index: usize) -> Result<(), AttemptError> {
        self.ensure_mutable()?;
        self.ensure_index(index)?;
        if index != self.current_index {
            self.current_index = index;
            self.visited.insert(index);
            self.bump();
        }
        Ok(())
    }

    /// Adds seconds spent on a question.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError` if finished or the index is out of range.
    pub fn add_time_spent(&mut self, index: usize, secs: u32) -> Result<(), AttemptError> {
        self.ensure_mutable()?;
        self.ensure_index(index)?;
        if secs == 0 {
            return Ok(());
        }
        let entry = self.time_spent.entry(index).or_insert(0);
        *entry = entry.saturating_add(secs);
        self.bump();
        Ok(())
    }

    /// Stores the current timer reading for later resumption.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::Finished` for a finished attempt.
    pub fn sync_timer(&mut self, value_secs: u32) -> Result<(), AttemptError> {
        self.ensure_mutable()?;
        if self.timer.value_secs != value_secs {
            self.timer.value_secs = value_secs;
            self.bump();
        }
        Ok(())
    }

    /// Replaces the highlighted HTML stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::Finished` for a finished attempt.
    pub fn update_highlight(
        &mut self,
        key: impl Into<String>,
        html: impl Into<String>,
    ) -> Result<(), AttemptError> {
        self.ensure_mutable()?;
        let html = html.into();
        let key = key.into();
        if self.highlights.get(&key) != Some(&html) {
            self.highlights.insert(key, html);
            self.bump();
        }
        Ok(())
    }

    /// Ends the attempt. Returns `false` (and changes nothing) if already finished.
    pub fn finish(&mut self, now: DateTime<Utc>, timed_out: bool) -> bool {
        if self.is_finished() {
            return false;
        }
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
        self.status = AttemptStatus::Finished;
        self.finished_at = Some(now);
        self.timed_out = timed_out;
        self.updated_at = now;
        self.bump();
        true
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
