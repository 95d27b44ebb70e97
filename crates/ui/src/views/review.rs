use dioxus::prelude::*;

use crate::vm::{ReviewCellVm, ReviewGridVm, ReviewIntent};

#[component]
pub fn ReviewGridView(
    grid: ReviewGridVm,
    message: Option<String>,
    on_intent: EventHandler<ReviewIntent>,
) -> Element {
    let footer = [
        ("Review All", ReviewIntent::ReviewAll, "btn btn-secondary"),
        ("Review Marked", ReviewIntent::ReviewMarked, "btn btn-secondary"),
        ("Review Incomplete", ReviewIntent::ReviewIncomplete, "btn btn-secondary"),
        ("Finish", ReviewIntent::FinishNow, "btn btn-primary"),
        ("Close", ReviewIntent::Close, "btn btn-ghost"),
    ];

    rsx! {
        section { class: "review-grid", aria_label: "Review",
            p { class: "review-summary", "{grid.summary_label}" }
            if let Some(error) = grid.error_label.as_ref() {
                p { class: "review-error", "{error}" }
            }
            if let Some(message) = message.as_ref() {
                p { class: "review-message", role: "status", "{message}" }
            }
            div { class: "review-cells",
                for (key, cell) in grid.cells.clone().into_iter().map(|cell| (cell.index, cell)) {
                    ReviewCell { key: "{key}", cell, on_intent }
                }
            }
            footer { class: "review-actions",
                for (label, intent, class) in footer {
                    button {
                        class: "{class}",
                        r#type: "button",
                        onclick: move |_| on_intent.call(intent),
                        "{label}"
                    }
                }
            }
        }
    }
}

#[component]
fn ReviewCell(cell: ReviewCellVm, on_intent: EventHandler<ReviewIntent>) -> Element {
    let mut class = String::from("review-cell");
    if cell.answered {
        class.push_str(" review-cell--answered");
    }
    if cell.marked {
        class.push_str(" review-cell--marked");
    }
    if cell.is_current {
        class.push_str(" review-cell--current");
    }
    let index = cell.index;

    rsx! {
        button {
            class: "{class}",
            r#type: "button",
            onclick: move |_| on_intent.call(ReviewIntent::Jump(index)),
            "{cell.label}"
        }
    }
}
