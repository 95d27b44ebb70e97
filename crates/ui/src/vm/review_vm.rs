use services::ReviewError;
use services::sessions::{ReviewCounts, ReviewDismissal, ReviewPanel, ReviewRow};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReviewCellVm {
    pub index: usize,
    pub label: String,
    pub answered: bool,
    pub marked: bool,
    pub is_current: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReviewGridVm {
    pub cells: Vec<ReviewCellVm>,
    pub summary_label: String,
    /// Present when some questions failed to load.
    pub error_label: Option<String>,
}

fn map_cell(row: &ReviewRow) -> ReviewCellVm {
    ReviewCellVm {
        index: row.index,
        label: row.number().to_string(),
        answered: row.answered,
        marked: row.marked,
        is_current: row.is_current,
    }
}

#[must_use]
pub fn map_review_grid(rows: &[ReviewRow], counts: ReviewCounts) -> ReviewGridVm {
    let error_label = match counts.errors {
        0 => None,
        1 => Some("1 question failed to load".to_string()),
        n => Some(format!("{n} questions failed to load")),
    };
    ReviewGridVm {
        cells: rows.iter().map(map_cell).collect(),
        summary_label: format!(
            "{} answered, {} unanswered, {} marked",
            counts.answered, counts.unanswered, counts.marked
        ),
        error_label,
    }
}

#[must_use]
pub fn review_grid(panel: &ReviewPanel<'_>) -> ReviewGridVm {
    map_review_grid(&panel.rows(), panel.counts())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReviewIntent {
    Jump(usize),
    ReviewAll,
    ReviewMarked,
    ReviewIncomplete,
    FinishNow,
    Close,
}

/// Applies an intent. On failure the panel is handed back still open, with a message.
///
/// # Errors
///
/// Returns the open panel and a user-facing message when the intent cannot be carried out.
pub fn apply_review_intent(
    panel: ReviewPanel<'_>,
    intent: ReviewIntent,
) -> Result<ReviewDismissal, (ReviewPanel<'_>, &'static str)> {
    let result = match intent {
        ReviewIntent::Jump(index) => panel.jump_to(index),
        ReviewIntent::ReviewAll => panel.review_all(),
        ReviewIntent::ReviewMarked => panel.review_marked(),
        ReviewIntent::ReviewIncomplete => panel.review_incomplete(),
        ReviewIntent::FinishNow => panel.finish_now(),
        ReviewIntent::Close => Ok(panel.close()),
    };
    result.map_err(|(panel, err)| (panel, review_error_message(&err)))
}

#[must_use]
pub fn review_error_message(err: &ReviewError) -> &'static str {
    match err {
        ReviewError::NothingMarked => "No questions are marked for review.",
        ReviewError::AllAnswered => "Every question has an answer.",
        _ => "That question is not available.",
    }
}
