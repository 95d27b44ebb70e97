use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use quiz_core::model::{
    Attempt, AttemptId, AttemptParts, AttemptStatus, PracticeTestSettings, QuizId, SectionType,
    TimerMode, TimerSnapshot,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn usize_to_i64(field: &'static str, v: usize) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn u64_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

fn i64_to_usize(field: &'static str, v: i64) -> Result<usize, StorageError> {
    usize::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn highlights_json(attempt: &Attempt) -> Result<String, StorageError> {
    serde_json::to_string(attempt.highlights()).map_err(ser)
}

pub(crate) fn parse_attempt_id(raw: &str) -> Result<AttemptId, StorageError> {
    raw.parse().map_err(ser)
}

/// Per-question state flattened for the `attempt_questions` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct QuestionRow {
    pub index: usize,
    pub answer: Option<String>,
    pub marked: bool,
    pub visited: bool,
    pub time_spent_secs: u32,
    pub crossed_off: BTreeSet<String>,
}

impl QuestionRow {
    pub(crate) fn crossed_off_json(&self) -> Result<String, StorageError> {
        serde_json::to_string(&self.crossed_off).map_err(ser)
    }
}

/// One row per question that carries any state; untouched questions are omitted.
pub(crate) fn question_rows(attempt: &Attempt) -> Vec<QuestionRow> {
    let indices: BTreeSet<usize> = attempt
        .submitted_answers()
        .keys()
        .chain(attempt.marked_questions())
        .chain(attempt.visited())
        .copied()
        .chain((0..attempt.question_count()).filter(|&idx| {
            attempt.time_spent(idx) > 0 || attempt.crossed_off(idx).is_some()
        }))
        .collect();

    indices
        .into_iter()
        .map(|index| QuestionRow {
            index,
            answer: attempt.answer(index).map(str::to_owned),
            marked: attempt.is_marked(index),
            visited: attempt.visited().contains(&index),
            time_spent_secs: attempt.time_spent(index),
            crossed_off: attempt.crossed_off(index).cloned().unwrap_or_default(),
        })
        .collect()
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<QuestionRow, StorageError> {
    let crossed_raw: String = row.try_get("crossed_off").map_err(ser)?;
    Ok(QuestionRow {
        index: i64_to_usize("question_index", row.try_get("question_index").map_err(ser)?)?,
        answer: row.try_get("answer").map_err(ser)?,
        marked: row.try_get("marked").map_err(ser)?,
        visited: row.try_get("visited").map_err(ser)?,
        time_spent_secs: i64_to_u32(
            "time_spent_secs",
            row.try_get("time_spent_secs").map_err(ser)?,
        )?,
        crossed_off: serde_json::from_str(&crossed_raw).map_err(ser)?,
    })
}

pub(crate) fn map_attempt_row(
    row: &SqliteRow,
    questions: Vec<QuestionRow>,
) -> Result<Attempt, StorageError> {
    let attempt_id: String = row.try_get("attempt_id").map_err(ser)?;
    let quiz_id: String = row.try_get("quiz_id").map_err(ser)?;
    let section: String = row.try_get("section_type").map_err(ser)?;
    let status: String = row.try_get("status").map_err(ser)?;
    let timer_mode: String = row.try_get("timer_mode").map_err(ser)?;
    let highlights_raw: String = row.try_get("highlights").map_err(ser)?;

    let mut submitted_answers = BTreeMap::new();
    let mut marked_questions = BTreeSet::new();
    let mut visited = BTreeSet::new();
    let mut crossed_off = BTreeMap::new();
    let mut time_spent = BTreeMap::new();
    for q in questions {
        if let Some(answer) = q.answer {
            submitted_answers.insert(q.index, answer);
        }
        if q.marked {
            marked_questions.insert(q.index);
        }
        if q.visited {
            visited.insert(q.index);
        }
        if !q.crossed_off.is_empty() {
            crossed_off.insert(q.index, q.crossed_off);
        }
        if q.time_spent_secs > 0 {
            time_spent.insert(q.index, q.time_spent_secs);
        }
    }

    let parts = AttemptParts {
        id: parse_attempt_id(&attempt_id)?,
        quiz_id: QuizId::new(quiz_id),
        section_type: section.parse::<SectionType>().map_err(ser)?,
        status: status.parse::<AttemptStatus>().map_err(ser)?,
        question_count: i64_to_usize("question_count", row.try_get("question_count").map_err(ser)?)?,
        current_index: i64_to_usize("current_index", row.try_get("current_index").map_err(ser)?)?,
        submitted_answers,
        marked_questions,
        visited,
        crossed_off,
        time_spent,
        highlights: serde_json::from_str(&highlights_raw).map_err(ser)?,
        started_at: row
            .try_get::<Option<DateTime<Utc>>, _>("started_at")
            .map_err(ser)?,
        finished_at: row
            .try_get::<Option<DateTime<Utc>>, _>("finished_at")
            .map_err(ser)?,
        timed_out: row.try_get("timed_out").map_err(ser)?,
        timer: TimerSnapshot {
            mode: timer_mode.parse::<TimerMode>().map_err(ser)?,
            initial_secs: i64_to_u32(
                "timer_initial_secs",
                row.try_get("timer_initial_secs").map_err(ser)?,
            )?,
            value_secs: i64_to_u32(
                "timer_value_secs",
                row.try_get("timer_value_secs").map_err(ser)?,
            )?,
        },
        settings: PracticeTestSettings {
            additional_time: row.try_get("additional_time").map_err(ser)?,
            prometric_delay: row.try_get("prometric_delay").map_err(ser)?,
        },
        revision: i64_to_u64("revision", row.try_get("revision").map_err(ser)?)?,
        updated_at: row.try_get("updated_at").map_err(ser)?,
    };

    Attempt::from_parts(parts).map_err(ser)
}
