use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question has no answer options")]
    NoOptions,

    #[error("duplicate option label: {0}")]
    DuplicateOption(String),

    #[error("option label cannot be empty")]
    EmptyOptionLabel,
}

//
// ─── OPTIONS ──────────────────────────────────────────────────────────────────
//

/// A single answer choice, e.g. label `"B"` with its HTML body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub label: String,
    pub html_content: String,
    #[serde(default)]
    pub is_correct: bool,
}

impl AnswerOption {
    #[must_use]
    pub fn new(label: impl Into<String>, html_content: impl Into<String>, is_correct: bool) -> Self {
        Self {
            label: label.into(),
            html_content: html_content.into(),
            is_correct,
        }
    }
}

//
// ─── QUESTION ─────────────────────────────────────────────────────────────────
//

/// One question of a loaded quiz. Immutable once the quiz is loaded.
///
/// A question whose content failed to load upstream is kept in place as a
/// placeholder (`load_error` set) so indices stay aligned with the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(default)]
    pub id: Option<String>,
    pub prompt_html: String,
    #[serde(default)]
    pub options: Vec<AnswerOption>,
    /// Full explanation shown in solution mode.
    #[serde(default)]
    pub solution_html: Option<String>,
    /// Reading passage or figure accompanying the question.
    #[serde(default)]
    pub exhibit_html: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub load_error: Option<String>,
}

impl Question {
    /// Builds a question after checking its option labels are non-empty and unique.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when options are missing or labels collide.
    pub fn new(
        prompt_html: impl Into<String>,
        options: Vec<AnswerOption>,
    ) -> Result<Self, QuestionError> {
        validate_options(&options)?;

        Ok(Self {
            id: None,
            prompt_html: prompt_html.into(),
            options,
            solution_html: None,
            exhibit_html: None,
            category: None,
            load_error: None,
        })
    }

    /// A placeholder standing in for a question that could not be loaded.
    #[must_use]
    pub fn placeholder(error: impl Into<String>) -> Self {
        Self {
            id: None,
            prompt_html: String::new(),
            options: Vec::new(),
            solution_html: None,
            exhibit_html: None,
            category: None,
            load_error: Some(error.into()),
        }
    }

    /// Re-checks a question that arrived through deserialization.
    ///
    /// Placeholders are always valid.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when options are missing or labels collide.
    pub fn validate(&self) -> Result<(), QuestionError> {
        if self.is_placeholder() {
            return Ok(());
        }
        validate_options(&self.options)
    }

    #[must_use]
    pub fn with_solution(mut self, html: impl Into<String>) -> Self {
        self.solution_html = Some(html.into());
        self
    }

    #[must_use]
    pub fn with_exhibit(mut self, html: impl Into<String>) -> Self {
        self.exhibit_html = Some(html.into());
        self
    }

    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.load_error.is_some()
    }

    #[must_use]
    pub fn has_option(&self, label: &str) -> bool {
        self.options.iter().any(|option| option.label == label)
    }

    #[must_use]
    pub fn correct_label(&self) -> Option<&str> {
        self.options
            .iter()
            .find(|option| option.is_correct)
            .map(|option| option.label.as_str())
    }

    #[must_use]
    pub fn has_solution(&self) -> bool {
        self.solution_html.as_deref().is_some_and(|s| !s.trim().is_empty())
    }

    #[must_use]
    pub fn has_exhibit(&self) -> bool {
        self.exhibit_html.as_deref().is_some_and(|s| !s.trim().is_empty())
    }
}

fn validate_options(options: &[AnswerOption]) -> Result<(), QuestionError> {
    if options.is_empty() {
        return Err(QuestionError::NoOptions);
    }
    let mut seen = HashSet::new();
    for option in options {
        if option.label.trim().is_empty() {
            return Err(QuestionError::EmptyOptionLabel);
        }
        if !seen.insert(option.label.as_str()) {
            return Err(QuestionError::DuplicateOption(option.label.clone()));
        }
    }
    Ok(())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
