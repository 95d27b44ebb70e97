use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::ids::{QuizId, TopicId};
use crate::model::question::Question;

//
// ─── SECTION TYPE ──────────────────────────────────────────────────────────────
//

/// Kind of list a content item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    /// Timed full-length practice test.
    Practice,
    /// Untimed question-bank drill.
    Qbank,
}

impl SectionType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SectionType::Practice => "practice",
            SectionType::Qbank => "qbank",
        }
    }

    /// Question banks reveal solutions while answering; practice tests do not.
    #[must_use]
    pub fn offers_solutions(self) -> bool {
        matches!(self, SectionType::Qbank)
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSectionTypeError(pub String);

impl fmt::Display for ParseSectionTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown section type: {}", self.0)
    }
}

impl std::error::Error for ParseSectionTypeError {}

impl FromStr for SectionType {
    type Err = ParseSectionTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "practice" => Ok(SectionType::Practice),
            "qbank" => Ok(SectionType::Qbank),
            other => Err(ParseSectionTypeError(other.to_string())),
        }
    }
}

//
// ─── LIST ITEMS ────────────────────────────────────────────────────────────────
//

/// An entry in a content list. Lock state is derived from the position, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    pub id: QuizId,
    pub name: String,
    /// Ordinal within its own list (0-based).
    pub position: usize,
    pub section_type: SectionType,
}

impl ListItem {
    #[must_use]
    pub fn new(
        id: impl Into<QuizId>,
        name: impl Into<String>,
        position: usize,
        section_type: SectionType,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            position,
            section_type,
        }
    }
}

/// Question banks grouped under a sub-category (e.g. "General Chemistry").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionBankGroup {
    pub category: String,
    pub banks: Vec<ListItem>,
}

/// Everything listed under a topic. Each list restarts positions at 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicStructure {
    pub id: TopicId,
    pub name: String,
    pub practice_tests: Vec<ListItem>,
    pub question_banks: Vec<QuestionBankGroup>,
}

impl TopicStructure {
    /// Finds an item by id within the list of the given section.
    #[must_use]
    pub fn find_item(&self, id: &QuizId, section: SectionType) -> Option<&ListItem> {
        match section {
            SectionType::Practice => self.practice_tests.iter().find(|item| &item.id == id),
            SectionType::Qbank => self
                .question_banks
                .iter()
                .flat_map(|group| group.banks.iter())
                .find(|item| &item.id == id),
        }
    }
}

/// Display metadata of a loaded quiz.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuizMetadata {
    pub name: String,
    pub topic_name: String,
    pub full_name_for_display: String,
}

/// A loaded quiz: metadata plus its questions in source order.
///
/// Questions that failed to load stay in place as placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizContent {
    pub id: QuizId,
    pub section_type: SectionType,
    #[serde(default)]
    pub metadata: QuizMetadata,
    pub questions: Vec<Question>,
}

impl QuizContent {
    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Number of questions that loaded successfully.
    #[must_use]
    pub fn valid_question_count(&self) -> usize {
        self.questions.iter().filter(|q| !q.is_placeholder()).count()
    }
}
