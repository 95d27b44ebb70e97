use async_trait::async_trait;
use sqlx::Row;

use crate::repository::{AppSettingsRepository, StorageError};
use quiz_core::model::{AppSettings, AppSettingsDraft};

use super::SqliteRepository;
use super::mapping::{conn, ser};

#[async_trait]
impl AppSettingsRepository for SqliteRepository {
    async fn get_settings(&self) -> Result<Option<AppSettings>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT theme, sidebar_collapsed, autosave_interval_secs
            FROM app_settings
            WHERE id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let theme: Option<String> = row.try_get("theme").map_err(ser)?;
        let sidebar_collapsed: bool = row.try_get("sidebar_collapsed").map_err(ser)?;
        let autosave_interval_secs: Option<i64> =
            row.try_get("autosave_interval_secs").map_err(ser)?;

        AppSettings::from_persisted(AppSettingsDraft {
            theme,
            sidebar_collapsed: Some(sidebar_collapsed),
            autosave_interval_secs: autosave_interval_secs.and_then(|val| u32::try_from(val).ok()),
        })
        .map(Some)
        .map_err(ser)
    }

    async fn save_settings(&self, settings: &AppSettings) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO app_settings (id, theme, sidebar_collapsed, autosave_interval_secs)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                theme = excluded.theme,
                sidebar_collapsed = excluded.sidebar_collapsed,
                autosave_interval_secs = excluded.autosave_interval_secs
            ",
        )
        .bind(1_i64)
        .bind(settings.theme().as_str())
        .bind(settings.sidebar_collapsed())
        .bind(i64::from(settings.autosave_interval_secs()))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }
}
