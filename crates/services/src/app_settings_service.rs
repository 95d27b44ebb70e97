use std::sync::Arc;

use quiz_core::model::{AppSettings, AppSettingsDraft};
use storage::repository::AppSettingsRepository;
use tracing::warn;

use crate::error::AppSettingsServiceError;

#[derive(Clone)]
pub struct AppSettingsService {
    repo: Arc<dyn AppSettingsRepository>,
}

impl AppSettingsService {
    #[must_use]
    pub fn new(repo: Arc<dyn AppSettingsRepository>) -> Self {
        Self { repo }
    }

    /// Load persisted settings (or defaults if missing).
    ///
    /// # Errors
    ///
    /// Returns `AppSettingsServiceError` on storage failures.
    pub async fn load(&self) -> Result<AppSettings, AppSettingsServiceError> {
        let settings = self.repo.get_settings().await?;
        Ok(settings.unwrap_or_default())
    }

    /// Like [`load`](Self::load), but falls back to defaults on any failure.
    pub async fn load_or_default(&self) -> AppSettings {
        match self.load().await {
            Ok(settings) => settings,
            Err(err) => {
                warn!(error = %err, "failed to load app settings, using defaults");
                AppSettings::default()
            }
        }
    }

    /// Validate and persist new settings.
    ///
    /// # Errors
    ///
    /// Returns `AppSettingsServiceError` if validation fails or persistence fails.
    pub async fn save(
        &self,
        draft: AppSettingsDraft,
    ) -> Result<AppSettings, AppSettingsServiceError> {
        let settings = draft.validate()?;
        self.repo.save_settings(&settings).await?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::Theme;
    use storage::repository::InMemoryRepository;

    #[tokio::test]
    async fn missing_settings_load_as_defaults() {
        let service = AppSettingsService::new(Arc::new(InMemoryRepository::new()));
        assert_eq!(service.load().await.unwrap(), AppSettings::default());
    }

    #[tokio::test]
    async fn saved_settings_are_loaded_back() {
        let service = AppSettingsService::new(Arc::new(InMemoryRepository::new()));
        let saved = service
            .save(AppSettingsDraft {
                theme: Some("dark".into()),
                sidebar_collapsed: Some(true),
                autosave_interval_secs: Some(30),
            })
            .await
            .unwrap();
        assert_eq!(saved.theme(), Theme::Dark);
        assert_eq!(service.load().await.unwrap(), saved);
    }

    #[tokio::test]
    async fn invalid_draft_is_not_persisted() {
        let service = AppSettingsService::new(Arc::new(InMemoryRepository::new()));
        let err = service
            .save(AppSettingsDraft {
                theme: Some("sepia".into()),
                ..AppSettingsDraft::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppSettingsServiceError::Validation(_)));
        assert_eq!(service.load().await.unwrap(), AppSettings::default());
    }
}
