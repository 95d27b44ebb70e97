use dioxus::prelude::*;
use quiz_core::model::HighlightTarget;

use super::scripts::highlight_selection;
use crate::vm::{OptionVm, QuestionVm, SessionIntent};

const PROMPT_ELEMENT_ID: &str = "question-prompt";

#[component]
pub fn QuestionView(question: QuestionVm, on_intent: EventHandler<SessionIntent>) -> Element {
    let index = question.index;
    let marked_label = if question.marked { "Unmark" } else { "Mark for Review" };

    rsx! {
        article { class: "question",
            header { class: "question-header",
                span { class: "question-number", "{question.header}" }
                if question.marked {
                    span { class: "question-flag", "Marked" }
                }
                if question.highlight_count > 0 {
                    span { class: "question-highlights", "{question.highlight_count} highlighted" }
                }
            }
            if let Some(error) = question.load_error.as_ref() {
                p { class: "question-error", role: "alert", "{error}" }
            }
            if let Some(exhibit) = question.exhibit.as_ref() {
                aside { class: "question-exhibit", "{exhibit}" }
            }
            div {
                id: PROMPT_ELEMENT_ID,
                class: "question-prompt",
                dangerous_inner_html: "{question.prompt_html}",
            }
            ol { class: "question-options",
                for (key, option) in question.options.clone().into_iter().map(|option| (option.label.clone(), option)) {
                    OptionRow { key: "{key}", option, on_intent }
                }
            }
            if let Some(explanation) = question.explanation_html.as_ref() {
                section {
                    class: "question-explanation",
                    dangerous_inner_html: "{explanation}",
                }
            }
            footer { class: "question-actions",
                button {
                    class: "btn btn-secondary",
                    r#type: "button",
                    onclick: move |_| on_intent.call(SessionIntent::ToggleMark),
                    "{marked_label}"
                }
                button {
                    class: "btn btn-secondary",
                    r#type: "button",
                    onclick: move |_| {
                        spawn(async move {
                            if let Some(html) = highlight_selection(PROMPT_ELEMENT_ID).await {
                                on_intent.call(SessionIntent::Highlight {
                                    target: HighlightTarget::Prompt(index),
                                    html,
                                });
                            }
                        });
                    },
                    "Highlight Selection"
                }
                if question.can_toggle_solution {
                    button {
                        class: "btn btn-secondary",
                        r#type: "button",
                        onclick: move |_| on_intent.call(SessionIntent::ToggleSolution),
                        "Solution"
                    }
                    button {
                        class: "btn btn-secondary",
                        r#type: "button",
                        onclick: move |_| on_intent.call(SessionIntent::ToggleExplanation),
                        "Explanation"
                    }
                }
                if question.can_toggle_exhibit {
                    button {
                        class: "btn btn-secondary",
                        r#type: "button",
                        onclick: move |_| on_intent.call(SessionIntent::ToggleExhibit),
                        "Exhibit"
                    }
                }
                button {
                    class: "btn btn-secondary",
                    r#type: "button",
                    onclick: move |_| on_intent.call(SessionIntent::Previous),
                    "Previous"
                }
                button {
                    class: "btn btn-primary",
                    r#type: "button",
                    onclick: move |_| on_intent.call(SessionIntent::Next),
                    "Next"
                }
            }
        }
    }
}

#[component]
fn OptionRow(option: OptionVm, on_intent: EventHandler<SessionIntent>) -> Element {
    let mut class = String::from("question-option");
    if option.selected {
        class.push_str(" question-option--selected");
    }
    if option.crossed_off {
        class.push_str(" question-option--crossed");
    }
    match option.correct {
        Some(true) => class.push_str(" question-option--correct"),
        Some(false) => class.push_str(" question-option--incorrect"),
        None => {}
    }
    let select_label = option.label.clone();
    let cross_label = option.label.clone();

    rsx! {
        li { class: "{class}",
            button {
                class: "question-option-choice",
                r#type: "button",
                aria_pressed: "{option.selected}",
                onclick: move |_| on_intent.call(SessionIntent::Select(select_label.clone())),
                span { class: "question-option-label", "{option.label}." }
                span {
                    class: "question-option-text",
                    dangerous_inner_html: "{option.html}",
                }
            }
            button {
                class: "question-option-cross",
                r#type: "button",
                aria_label: "Cross off {option.label}",
                onclick: move |_| on_intent.call(SessionIntent::CrossOff(cross_label.clone())),
                "×"
            }
        }
    }
}
