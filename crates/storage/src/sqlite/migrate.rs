use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Applies pending schema versions in order, each inside its own transaction.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: attempts and their per-question state.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS attempts (
                    quiz_id TEXT PRIMARY KEY,
                    attempt_id TEXT NOT NULL,
                    section_type TEXT NOT NULL,
                    status TEXT NOT NULL,
                    question_count INTEGER NOT NULL CHECK (question_count > 0),
                    current_index INTEGER NOT NULL CHECK (current_index >= 0),
                    started_at TEXT,
                    finished_at TEXT,
                    timed_out INTEGER NOT NULL DEFAULT 0,
                    timer_mode TEXT NOT NULL,
                    timer_initial_secs INTEGER NOT NULL CHECK (timer_initial_secs >= 0),
                    timer_value_secs INTEGER NOT NULL CHECK (timer_value_secs >= 0),
                    additional_time INTEGER NOT NULL DEFAULT 0,
                    prometric_delay INTEGER NOT NULL DEFAULT 0,
                    revision INTEGER NOT NULL CHECK (revision >= 0),
                    updated_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS attempt_questions (
                    quiz_id TEXT NOT NULL,
                    question_index INTEGER NOT NULL CHECK (question_index >= 0),
                    answer TEXT,
                    marked INTEGER NOT NULL DEFAULT 0,
                    visited INTEGER NOT NULL DEFAULT 0,
                    time_spent_secs INTEGER NOT NULL DEFAULT 0 CHECK (time_spent_secs >= 0),
                    crossed_off TEXT NOT NULL DEFAULT '[]',
                    PRIMARY KEY (quiz_id, question_index),
                    FOREIGN KEY (quiz_id) REFERENCES attempts(quiz_id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_attempts_status_updated
                    ON attempts (status, updated_at);
            ",
        )
        .execute(&mut *tx)
        .await?;

        mark_applied(&mut tx, 1).await?;
        tx.commit().await?;
    }

    // Version 2: single-row app settings.
    if !is_applied(pool, 2).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS app_settings (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    theme TEXT,
                    sidebar_collapsed INTEGER NOT NULL DEFAULT 0,
                    autosave_interval_secs INTEGER
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        mark_applied(&mut tx, 2).await?;
        tx.commit().await?;
    }

    // Version 3: highlighted question content, stored as a JSON object per attempt.
    if !is_applied(pool, 3).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                ALTER TABLE attempts
                    ADD COLUMN highlights TEXT NOT NULL DEFAULT '{}';
            ",
        )
        .execute(&mut *tx)
        .await?;

        mark_applied(&mut tx, 3).await?;
        tx.commit().await?;
    }

    Ok(())
}

async fn mark_applied(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    version: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
            INSERT INTO schema_migrations (version, applied_at)
            VALUES (?1, ?2)
            ON CONFLICT(version) DO NOTHING
        ",
    )
    .bind(version)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;
    Ok(())
}
