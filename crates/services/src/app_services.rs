use std::path::Path;
use std::sync::Arc;

use storage::repository::{ContentRepository, Storage};
use storage::JsonCatalog;
use tracing::info;

use crate::app_settings_service::AppSettingsService;
use crate::error::AppServicesError;
use crate::score::{ScoreReporter, TracingScoreReporter};
use crate::sessions::QuizSessionService;
use crate::Clock;

/// Assembles app-facing services over one storage backend and one content catalog.
#[derive(Clone)]
pub struct AppServices {
    catalog: Arc<JsonCatalog>,
    sessions: Arc<QuizSessionService>,
    app_settings: Arc<AppSettingsService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and a JSON catalog file.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails or the catalog cannot be read.
    pub async fn new_sqlite(
        db_url: &str,
        catalog_path: impl AsRef<Path>,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let catalog = JsonCatalog::from_path(catalog_path.as_ref())?;
        info!(topics = catalog.topic_ids().len(), "catalog loaded");
        Ok(Self::from_parts(storage, catalog, clock))
    }

    /// Build services from already-constructed storage, e.g. [`Storage::in_memory`].
    #[must_use]
    pub fn from_parts(storage: Storage, catalog: JsonCatalog, clock: Clock) -> Self {
        let catalog = Arc::new(catalog);
        let content: Arc<dyn ContentRepository> = catalog.clone();
        let reporter: Arc<dyn ScoreReporter> = Arc::new(TracingScoreReporter);
        let sessions = Arc::new(
            QuizSessionService::new(clock, content, Arc::clone(&storage.attempts))
                .with_reporter(reporter),
        );
        let app_settings = Arc::new(AppSettingsService::new(Arc::clone(&storage.settings)));

        Self {
            catalog,
            sessions,
            app_settings,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<JsonCatalog> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn sessions(&self) -> Arc<QuizSessionService> {
        Arc::clone(&self.sessions)
    }

    #[must_use]
    pub fn app_settings(&self) -> Arc<AppSettingsService> {
        Arc::clone(&self.app_settings)
    }
}
