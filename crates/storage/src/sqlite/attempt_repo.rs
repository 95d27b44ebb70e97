use async_trait::async_trait;
use quiz_core::model::{Attempt, QuizId};
use sqlx::Row;
use tracing::debug;

use super::SqliteRepository;
use super::mapping::{
    conn, highlights_json, i64_to_u64, map_attempt_row, map_question_row, parse_attempt_id, question_rows, ser,
    u64_to_i64, usize_to_i64,
};
use crate::repository::{AttemptRepository, SaveAck, StorageError, accepts};

#[async_trait]
impl AttemptRepository for SqliteRepository {
    async fn load_attempt(&self, quiz_id: &QuizId) -> Result<Option<Attempt>, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let row = sqlx::query(
            r"
            SELECT
                quiz_id, attempt_id, section_type, status, question_count, current_index,
                started_at, finished_at, timed_out, timer_mode, timer_initial_secs,
                timer_value_secs, additional_time, prometric_delay, highlights, revision,
                updated_at
            FROM attempts
            WHERE quiz_id = ?1
            ",
        )
        .bind(quiz_id.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let question_rows = sqlx::query(
            r"
            SELECT question_index, answer, marked, visited, time_spent_secs, crossed_off
            FROM attempt_questions
            WHERE quiz_id = ?1
            ORDER BY question_index
            ",
        )
        .bind(quiz_id.as_str())
        .fetch_all(&mut *tx)
        .await
        .map_err(conn)?;

        tx.commit().await.map_err(conn)?;

        let questions = question_rows
            .iter()
            .map(map_question_row)
            .collect::<Result<Vec<_>, _>>()?;
        map_attempt_row(&row, questions).map(Some)
    }

    async fn save_attempt(&self, attempt: &Attempt) -> Result<SaveAck, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let stored = sqlx::query("SELECT attempt_id, revision FROM attempts WHERE quiz_id = ?1")
            .bind(attempt.quiz_id().as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(conn)?;
        let stored = stored
            .map(|row| -> Result<_, StorageError> {
                let id: String = row.try_get("attempt_id").map_err(ser)?;
                let revision: i64 = row.try_get("revision").map_err(ser)?;
                Ok((parse_attempt_id(&id)?, i64_to_u64("revision", revision)?))
            })
            .transpose()?;

        if !accepts(stored, attempt) {
            tx.rollback().await.map_err(conn)?;
            debug!(
                quiz_id = %attempt.quiz_id(),
                revision = attempt.revision(),
                "ignoring superseded attempt snapshot"
            );
            return Ok(SaveAck::Superseded);
        }

        let timer = attempt.timer();
        let settings = attempt.settings();
        sqlx::query(
            r"
            INSERT INTO attempts (
                quiz_id, attempt_id, section_type, status, question_count, current_index,
                started_at, finished_at, timed_out, timer_mode, timer_initial_secs,
                timer_value_secs, additional_time, prometric_delay, highlights, revision,
                updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            ON CONFLICT(quiz_id) DO UPDATE SET
                attempt_id = excluded.attempt_id,
                section_type = excluded.section_type,
                status = excluded.status,
                question_count = excluded.question_count,
                current_index = excluded.current_index,
                started_at = excluded.started_at,
                finished_at = excluded.finished_at,
                timed_out = excluded.timed_out,
                timer_mode = excluded.timer_mode,
                timer_initial_secs = excluded.timer_initial_secs,
                timer_value_secs = excluded.timer_value_secs,
                additional_time = excluded.additional_time,
                prometric_delay = excluded.prometric_delay,
                highlights = excluded.highlights,
                revision = excluded.revision,
                updated_at = excluded.updated_at
            ",
        )
        .bind(attempt.quiz_id().as_str())
        .bind(attempt.id().to_string())
        .bind(attempt.section_type().as_str())
        .bind(attempt.status().as_str())
        .bind(usize_to_i64("question_count", attempt.question_count())?)
        .bind(usize_to_i64("current_index", attempt.current_index())?)
        .bind(attempt.started_at())
        .bind(attempt.finished_at())
        .bind(attempt.timed_out())
        .bind(timer.mode.as_str())
        .bind(i64::from(timer.initial_secs))
        .bind(i64::from(timer.value_secs))
        .bind(settings.additional_time)
        .bind(settings.prometric_delay)
        .bind(highlights_json(attempt)?)
        .bind(u64_to_i64("revision", attempt.revision())?)
        .bind(attempt.updated_at())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        sqlx::query("DELETE FROM attempt_questions WHERE quiz_id = ?1")
            .bind(attempt.quiz_id().as_str())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for row in question_rows(attempt) {
            sqlx::query(
                r"
                INSERT INTO attempt_questions (
                    quiz_id, question_index, answer, marked, visited, time_spent_secs, crossed_off
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ",
            )
            .bind(attempt.quiz_id().as_str())
            .bind(usize_to_i64("question_index", row.index)?)
            .bind(row.answer.as_deref())
            .bind(row.marked)
            .bind(row.visited)
            .bind(i64::from(row.time_spent_secs))
            .bind(row.crossed_off_json()?)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(SaveAck::Stored)
    }

    async fn delete_attempt(&self, quiz_id: &QuizId) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query("DELETE FROM attempt_questions WHERE quiz_id = ?1")
            .bind(quiz_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        sqlx::query("DELETE FROM attempts WHERE quiz_id = ?1")
            .bind(quiz_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        tx.commit().await.map_err(conn)?;
        Ok(())
    }
}
