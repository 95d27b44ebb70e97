use quiz_core::model::{
    AttemptStatus, HighlightTarget, PracticeTestSettings, QuizId, QuizResult, SectionType,
    TimerMode, TopicId, UserProfile,
};
use services::{
    QuizSessionEngine, QuizSessionService, ResumeChoice, ResumePrompt, SaveState, SaveStatus,
    StartOutcome, TickOutcome,
};

use super::html_vm::{html_to_text, sanitize_html};
use super::modal_vm::{ResumePromptVm, UpgradePromptVm, map_resume_prompt, map_upgrade_prompt};
use super::time_fmt::format_timer;
use crate::views::ViewError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionIntent {
    Select(String),
    CrossOff(String),
    ToggleMark,
    Next,
    Previous,
    GoTo(usize),
    ToggleSolution,
    ToggleExplanation,
    ToggleExhibit,
    /// Replaces the highlighted HTML of a piece of the current question.
    Highlight { target: HighlightTarget, html: String },
    Finish,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionOutcome {
    Continue,
    Finished { timed_out: bool },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionVm {
    pub label: String,
    pub text: String,
    /// Sanitized display HTML, highlighted when the user marked it.
    pub html: String,
    pub selected: bool,
    pub crossed_off: bool,
    /// Only known once the solution is revealed.
    pub correct: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionVm {
    pub index: usize,
    pub header: String,
    pub prompt: String,
    pub prompt_html: String,
    pub options: Vec<OptionVm>,
    pub marked: bool,
    pub exhibit: Option<String>,
    pub explanation: Option<String>,
    pub explanation_html: Option<String>,
    /// Number of highlighted pieces on this question.
    pub highlight_count: usize,
    /// Set when the question failed to load.
    pub load_error: Option<String>,
    pub can_toggle_solution: bool,
    pub can_toggle_exhibit: bool,
}

/// Short persistence hint shown next to the timer.
#[must_use]
pub fn save_indicator(state: Option<&SaveState>) -> Option<&'static str> {
    match state.map(|s| s.status) {
        Some(SaveStatus::Saving) => Some("Saving..."),
        Some(SaveStatus::Failed) => Some("Not saved, retrying"),
        Some(SaveStatus::Idle) | None => None,
    }
}

pub struct SessionVm {
    engine: QuizSessionEngine,
}

impl SessionVm {
    #[must_use]
    pub fn new(engine: QuizSessionEngine) -> Self {
        Self { engine }
    }

    #[must_use]
    pub fn engine(&self) -> &QuizSessionEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut QuizSessionEngine {
        &mut self.engine
    }

    #[must_use]
    pub fn into_engine(self) -> QuizSessionEngine {
        self.engine
    }

    #[must_use]
    pub fn title(&self) -> &str {
        let metadata = &self.engine.content().metadata;
        if metadata.full_name_for_display.is_empty() {
            self.engine.content().id.as_str()
        } else {
            &metadata.full_name_for_display
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.engine.status() == AttemptStatus::Finished
    }

    #[must_use]
    pub fn timer_label(&self) -> String {
        let timer = self.engine.timer();
        let prefix = match timer.mode() {
            TimerMode::Countdown => "Time left",
            TimerMode::CountUp => "Elapsed",
        };
        format!("{prefix} {}", format_timer(timer.value_secs()))
    }

    /// `Score: 7/10 (70%)`. `None` until the attempt is finished.
    #[must_use]
    pub fn score_label(&self) -> Option<String> {
        let engine = &self.engine;
        let result = QuizResult::grade(engine.attempt(), engine.questions()).ok()?;
        Some(format!(
            "Score: {}/{} ({}%)",
            result.score,
            result.valid_questions,
            result.percentage()
        ))
    }

    #[must_use]
    pub fn save_indicator(&self) -> Option<&'static str> {
        save_indicator(self.engine.save_state().as_ref())
    }

    /// Highlighted HTML for `target` when present, otherwise the question's own HTML.
    ///
    /// `None` when the target does not exist on the current question.
    #[must_use]
    pub fn display_html(&self, target: &HighlightTarget) -> Option<&str> {
        let engine = &self.engine;
        if let Some(html) = engine.attempt().highlight(target) {
            return Some(html);
        }
        let question = engine.current_question();
        let index = engine.current_index();
        match target {
            HighlightTarget::Prompt(i) if *i == index => Some(question.prompt_html.as_str()),
            HighlightTarget::Option { index: i, label } if *i == index => question
                .options
                .iter()
                .find(|option| &option.label == label)
                .map(|option| option.html_content.as_str()),
            HighlightTarget::Explanation(i) if *i == index => question.solution_html.as_deref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn current_question(&self) -> QuestionVm {
        let engine = &self.engine;
        let attempt = engine.attempt();
        let index = engine.current_index();
        let question = engine.current_question();
        let revealed = engine.is_solution_revealed(index);
        let shown = |target: HighlightTarget, source: &str| -> String {
            self.display_html(&target).unwrap_or(source).to_string()
        };

        let options = question
            .options
            .iter()
            .map(|option| {
                let html = shown(
                    HighlightTarget::Option {
                        index,
                        label: option.label.clone(),
                    },
                    &option.html_content,
                );
                OptionVm {
                    label: option.label.clone(),
                    text: html_to_text(&html).trim_end().to_string(),
                    html: sanitize_html(&html),
                    selected: attempt.answer(index) == Some(option.label.as_str()),
                    crossed_off: attempt.is_crossed_off(index, &option.label),
                    correct: revealed.then_some(option.is_correct),
                }
            })
            .collect();

        let prompt = shown(HighlightTarget::Prompt(index), &question.prompt_html);
        let explanation = question
            .solution_html
            .as_deref()
            .filter(|_| engine.is_explanation_shown(index))
            .map(|source| shown(HighlightTarget::Explanation(index), source));
        let prefixes = [
            format!("question_{index}"),
            format!("option_{index}_"),
            format!("explanation_{index}"),
        ];
        let highlight_count = attempt
            .highlights()
            .keys()
            .filter(|key| {
                key.as_str() == prefixes[0]
                    || key.as_str() == prefixes[2]
                    || key.starts_with(&prefixes[1])
            })
            .count();

        QuestionVm {
            index,
            header: format!("Question {} of {}", index + 1, engine.question_count()),
            prompt: html_to_text(&prompt),
            prompt_html: sanitize_html(&prompt),
            options,
            marked: attempt.is_marked(index),
            exhibit: question
                .exhibit_html
                .as_deref()
                .filter(|_| engine.is_exhibit_visible())
                .map(html_to_text),
            explanation: explanation.as_deref().map(html_to_text),
            explanation_html: explanation.as_deref().map(sanitize_html),
            highlight_count,
            load_error: question.load_error.clone(),
            can_toggle_solution: engine.solution_available(index),
            can_toggle_exhibit: engine.exhibit_available(index),
        }
    }

    /// # Errors
    ///
    /// Returns `ViewError` when the engine rejects the intent.
    pub fn apply(&mut self, intent: SessionIntent) -> Result<SessionOutcome, ViewError> {
        let index = self.engine.current_index();
        match intent {
            SessionIntent::Select(label) => self.engine.select_option(index, &label)?,
            SessionIntent::CrossOff(label) => {
                self.engine.toggle_cross_off(index, &label)?;
            }
            SessionIntent::ToggleMark => {
                self.engine.toggle_mark(index)?;
            }
            SessionIntent::Next => {
                self.engine.next()?;
            }
            SessionIntent::Previous => {
                self.engine.previous()?;
            }
            SessionIntent::GoTo(target) => {
                self.engine.go_to(target)?;
            }
            SessionIntent::ToggleSolution => {
                self.engine.toggle_solution()?;
            }
            SessionIntent::ToggleExplanation => {
                self.engine.toggle_explanation()?;
            }
            SessionIntent::ToggleExhibit => {
                self.engine.toggle_exhibit()?;
            }
            SessionIntent::Highlight { target, html } => {
                self.engine.update_highlight(&target, html)?;
            }
            SessionIntent::Finish => {
                self.engine.finish(false)?;
            }
        }
        Ok(self.outcome())
    }

    /// Advances the timer and finishes the attempt when the countdown runs out.
    ///
    /// # Errors
    ///
    /// Returns `ViewError` if the timed-out finish fails.
    pub fn tick(&mut self, secs: u32) -> Result<SessionOutcome, ViewError> {
        if let TickOutcome::Expired(token) = self.engine.tick(secs) {
            self.engine.finish_on_timeout(token)?;
        }
        Ok(self.outcome())
    }

    fn outcome(&self) -> SessionOutcome {
        if self.is_finished() {
            SessionOutcome::Finished {
                timed_out: self.engine.attempt().timed_out(),
            }
        } else {
            SessionOutcome::Continue
        }
    }
}

/// Result of trying to enter a quiz from a list.
pub enum OpenQuiz {
    Session { vm: SessionVm, load_degraded: bool },
    Resume { modal: ResumePromptVm, prompt: ResumePrompt },
    Upgrade(UpgradePromptVm),
}

/// # Errors
///
/// Returns `ViewError::EmptyQuiz` when the quiz has no questions,
/// `ViewError::NotFound` when it is missing, `ViewError::Unknown` otherwise.
pub async fn open_quiz(
    sessions: &QuizSessionService,
    topic_id: &TopicId,
    item_id: &QuizId,
    section: SectionType,
    profile: Option<&UserProfile>,
    settings: PracticeTestSettings,
) -> Result<OpenQuiz, ViewError> {
    let outcome = sessions
        .start_or_resume(topic_id, item_id, section, profile, settings)
        .await?;
    Ok(match outcome {
        StartOutcome::Started(started) => OpenQuiz::Session {
            vm: SessionVm::new(started.engine),
            load_degraded: started.load_degraded,
        },
        StartOutcome::ResumePrompt(prompt) => OpenQuiz::Resume {
            modal: map_resume_prompt(&prompt),
            prompt,
        },
        StartOutcome::Locked => OpenQuiz::Upgrade(map_upgrade_prompt(&sessions.locked_item_tapped())),
    })
}

/// # Errors
///
/// Returns `ViewError` when the choice cannot be carried out.
pub async fn resolve_resume(
    sessions: &QuizSessionService,
    prompt: ResumePrompt,
    choice: ResumeChoice,
) -> Result<SessionVm, ViewError> {
    let engine = sessions.resolve_prompt(prompt, choice).await?;
    Ok(SessionVm::new(engine))
}
