//! Read-only content catalog backed by a JSON document.
//!
//! ```json
//! {
//!   "topics":  [{ "id": "bio", "name": "Biology", "practice_tests": [...], "question_banks": [...] }],
//!   "quizzes": [{ "id": "bio-pt-1", "section_type": "practice", "metadata": {...}, "questions": [...] }]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use quiz_core::model::{
    ListItem, Question, QuizContent, QuizId, SectionType, TopicId, TopicStructure,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::repository::{ContentRepository, StorageError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed catalog: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate topic id: {0}")]
    DuplicateTopic(TopicId),

    #[error("duplicate quiz id: {0}")]
    DuplicateQuiz(QuizId),

    #[error("item {id} is listed at position {found}, expected {expected}")]
    PositionMismatch {
        id: QuizId,
        expected: usize,
        found: usize,
    },

    #[error("item {id} is listed under the wrong section")]
    SectionMismatch { id: QuizId },
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    topics: Vec<TopicStructure>,
    #[serde(default)]
    quizzes: Vec<QuizContent>,
}

/// In-memory snapshot of topics and quizzes.
#[derive(Debug, Clone, Default)]
pub struct JsonCatalog {
    topics: HashMap<TopicId, TopicStructure>,
    quizzes: HashMap<QuizId, QuizContent>,
}

impl JsonCatalog {
    /// Build a catalog from already-parsed parts.
    ///
    /// Questions that fail validation are replaced by placeholders so question
    /// indices keep matching the source.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` for duplicate ids or list positions that do not
    /// match list order.
    pub fn from_parts(
        topics: Vec<TopicStructure>,
        quizzes: Vec<QuizContent>,
    ) -> Result<Self, CatalogError> {
        let mut catalog = Self::default();

        for topic in topics {
            check_list(&topic.practice_tests, SectionType::Practice)?;
            for group in &topic.question_banks {
                check_list(&group.banks, SectionType::Qbank)?;
            }
            if catalog.topics.contains_key(&topic.id) {
                return Err(CatalogError::DuplicateTopic(topic.id));
            }
            catalog.topics.insert(topic.id.clone(), topic);
        }

        for mut quiz in quizzes {
            for (idx, question) in quiz.questions.iter_mut().enumerate() {
                if let Err(err) = question.validate() {
                    warn!(quiz_id = %quiz.id, index = idx, error = %err, "replacing invalid question with placeholder");
                    *question = Question::placeholder(err.to_string());
                }
            }
            if catalog.quizzes.contains_key(&quiz.id) {
                return Err(CatalogError::DuplicateQuiz(quiz.id));
            }
            catalog.quizzes.insert(quiz.id.clone(), quiz);
        }

        Ok(catalog)
    }

    /// # Errors
    ///
    /// Returns `CatalogError` if the document is malformed or inconsistent.
    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let doc: CatalogDocument = serde_json::from_str(raw)?;
        Self::from_parts(doc.topics, doc.quizzes)
    }

    /// # Errors
    ///
    /// Returns `CatalogError` if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    #[must_use]
    pub fn topic_ids(&self) -> Vec<TopicId> {
        let mut ids: Vec<_> = self.topics.keys().cloned().collect();
        ids.sort();
        ids
    }
}

fn check_list(items: &[ListItem], section: SectionType) -> Result<(), CatalogError> {
    for (expected, item) in items.iter().enumerate() {
        if item.section_type != section {
            return Err(CatalogError::SectionMismatch {
                id: item.id.clone(),
            });
        }
        if item.position != expected {
            return Err(CatalogError::PositionMismatch {
                id: item.id.clone(),
                expected,
                found: item.position,
            });
        }
    }
    Ok(())
}

#[async_trait]
impl ContentRepository for JsonCatalog {
    async fn topic_structure(&self, topic_id: &TopicId) -> Result<TopicStructure, StorageError> {
        self.topics
            .get(topic_id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn load_quiz(&self, quiz_id: &QuizId) -> Result<QuizContent, StorageError> {
        self.quizzes
            .get(quiz_id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }
}
