use async_trait::async_trait;
use quiz_core::model::{
    AppSettings, Attempt, AttemptId, QuizContent, QuizId, TopicId, TopicStructure,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Outcome of persisting an attempt snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveAck {
    /// The snapshot is now the stored state.
    Stored,
    /// A newer revision of the same attempt was already stored; nothing changed.
    Superseded,
}

/// Persistence of attempts, keyed by quiz. At most one attempt is kept per quiz.
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Fetch the stored attempt for a quiz, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails or the stored row is corrupt.
    async fn load_attempt(&self, quiz_id: &QuizId) -> Result<Option<Attempt>, StorageError>;

    /// Persist a snapshot, replacing whatever is stored for the same quiz.
    ///
    /// A snapshot of the same attempt with a lower revision than the stored one
    /// is ignored and reported as `SaveAck::Superseded`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be written.
    async fn save_attempt(&self, attempt: &Attempt) -> Result<SaveAck, StorageError>;

    /// Remove the stored attempt for a quiz. Missing attempts are not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    async fn delete_attempt(&self, quiz_id: &QuizId) -> Result<(), StorageError>;
}

/// Read-only access to topics and quiz content.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown topic.
    async fn topic_structure(&self, topic_id: &TopicId) -> Result<TopicStructure, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown quiz.
    async fn load_quiz(&self, quiz_id: &QuizId) -> Result<QuizContent, StorageError>;
}

#[async_trait]
pub trait AppSettingsRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the settings row cannot be read or no longer validates.
    async fn get_settings(&self) -> Result<Option<AppSettings>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the settings cannot be written.
    async fn save_settings(&self, settings: &AppSettings) -> Result<(), StorageError>;
}

/// Decides whether `incoming` may replace `stored`.
pub(crate) fn accepts(stored: Option<(AttemptId, u64)>, incoming: &Attempt) -> bool {
    match stored {
        Some((attempt_id, revision)) if attempt_id == incoming.id() => {
            incoming.revision() >= revision
        }
        _ => true,
    }
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    attempts: Arc<Mutex<HashMap<QuizId, Attempt>>>,
    settings: Arc<Mutex<Option<AppSettings>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AttemptRepository for InMemoryRepository {
    async fn load_attempt(&self, quiz_id: &QuizId) -> Result<Option<Attempt>, StorageError> {
        let guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(quiz_id).cloned())
    }

    async fn save_attempt(&self, attempt: &Attempt) -> Result<SaveAck, StorageError> {
        let mut guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let stored = guard.get(attempt.quiz_id()).map(|a| (a.id(), a.revision()));
        if !accepts(stored, attempt) {
            return Ok(SaveAck::Superseded);
        }
        guard.insert(attempt.quiz_id().clone(), attempt.clone());
        Ok(SaveAck::Stored)
    }

    async fn delete_attempt(&self, quiz_id: &QuizId) -> Result<(), StorageError> {
        let mut guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(quiz_id);
        Ok(())
    }
}

#[async_trait]
impl AppSettingsRepository for InMemoryRepository {
    async fn get_settings(&self) -> Result<Option<AppSettings>, StorageError> {
        let guard = self
            .settings
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn save_settings(&self, settings: &AppSettings) -> Result<(), StorageError> {
        let mut guard = self
            .settings
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(settings.clone());
        Ok(())
    }
}

/// Aggregates the writable repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub attempts: Arc<dyn AttemptRepository>,
    pub settings: Arc<dyn AppSettingsRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let attempts: Arc<dyn AttemptRepository> = Arc::new(repo.clone());
        let settings: Arc<dyn AppSettingsRepository> = Arc::new(repo);
        Self { attempts, settings }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{PracticeTestSettings, SectionType, Theme};
    use quiz_core::time::fixed_now;

    fn build_attempt(quiz: &str) -> Attempt {
        Attempt::new(
            QuizId::new(quiz),
            SectionType::Practice,
            3,
            PracticeTestSettings::default(),
            fixed_now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn save_then_load_returns_snapshot() {
        let repo = InMemoryRepository::new();
        let mut attempt = build_attempt("pt-1");
        attempt.start(fixed_now()).unwrap();
        attempt.select_option(0, "B").unwrap();

        assert_eq!(repo.save_attempt(&attempt).await.unwrap(), SaveAck::Stored);
        let loaded = repo.load_attempt(attempt.quiz_id()).await.unwrap();
        assert_eq!(loaded, Some(attempt));
    }

    #[tokio::test]
    async fn older_revision_of_same_attempt_is_superseded() {
        let repo = InMemoryRepository::new();
        let mut attempt = build_attempt("pt-1");
        attempt.start(fixed_now()).unwrap();
        let stale = attempt.clone();
        attempt.finish(fixed_now(), false);

        repo.save_attempt(&attempt).await.unwrap();
        assert_eq!(
            repo.save_attempt(&stale).await.unwrap(),
            SaveAck::Superseded
        );
        let loaded = repo.load_attempt(attempt.quiz_id()).await.unwrap().unwrap();
        assert!(loaded.is_finished());
    }

    #[tokio::test]
    async fn fresh_attempt_replaces_other_attempt_regardless_of_revision() {
        let repo = InMemoryRepository::new();
        let mut old = build_attempt("pt-1");
        old.start(fixed_now()).unwrap();
        old.select_option(1, "A").unwrap();
        repo.save_attempt(&old).await.unwrap();

        let fresh = build_attempt("pt-1");
        assert_eq!(repo.save_attempt(&fresh).await.unwrap(), SaveAck::Stored);
        let loaded = repo.load_attempt(fresh.quiz_id()).await.unwrap().unwrap();
        assert_eq!(loaded.id(), fresh.id());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let repo = InMemoryRepository::new();
        let attempt = build_attempt("pt-1");
        repo.save_attempt(&attempt).await.unwrap();
        repo.delete_attempt(attempt.quiz_id()).await.unwrap();
        repo.delete_attempt(attempt.quiz_id()).await.unwrap();
        assert!(repo.load_attempt(attempt.quiz_id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn settings_round_trip() {
        let storage = Storage::in_memory();
        assert!(storage.settings.get_settings().await.unwrap().is_none());
        let settings = AppSettings::default().with_theme(Theme::Dark);
        storage.settings.save_settings(&settings).await.unwrap();
        assert_eq!(storage.settings.get_settings().await.unwrap(), Some(settings));
    }
}
