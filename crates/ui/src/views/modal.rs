use dioxus::prelude::*;
use services::ResumeChoice;

use crate::vm::{HitRegion, ModalKind, ResumePromptVm, UpgradePromptVm};

/// Backdrop plus dialog. Every click is reported with the region it landed in;
/// the owner decides through `hit_test` whether that closes the modal.
#[component]
pub fn ModalFrame(kind: ModalKind, on_click: EventHandler<HitRegion>, children: Element) -> Element {
    let class = if kind.is_dismissable() {
        "modal-backdrop"
    } else {
        "modal-backdrop modal-backdrop--blocking"
    };
    rsx! {
        div {
            class: "{class}",
            onclick: move |_| on_click.call(HitRegion::Backdrop),
            div {
                class: "modal",
                role: "dialog",
                aria_modal: "true",
                onclick: move |evt| {
                    evt.stop_propagation();
                    on_click.call(HitRegion::Content);
                },
                {children}
            }
        }
    }
}

#[component]
pub fn ResumePromptModal(
    vm: ResumePromptVm,
    on_click: EventHandler<HitRegion>,
    on_choice: EventHandler<ResumeChoice>,
) -> Element {
    let buttons = vm.buttons.clone().map(|button| {
        let class = if button.primary {
            "btn btn-primary"
        } else {
            "btn btn-secondary"
        };
        (class, button.label, button.action)
    });
    rsx! {
        ModalFrame { kind: ResumePromptVm::KIND, on_click,
            h2 { class: "modal-title", "{vm.title}" }
            p { class: "modal-subtitle", "{vm.subtitle}" }
            div { class: "modal-quiz",
                p { class: "modal-quiz-name", "{vm.quiz_name}" }
                p { class: "modal-quiz-progress", "{vm.progress_label}" }
            }
            div { class: "modal-actions",
                for (class, label, choice) in buttons {
                    button {
                        class: "{class}",
                        r#type: "button",
                        onclick: move |_| on_choice.call(choice),
                        "{label}"
                    }
                }
            }
        }
    }
}

#[component]
pub fn UpgradePromptModal(
    vm: UpgradePromptVm,
    on_click: EventHandler<HitRegion>,
    on_close: EventHandler<()>,
) -> Element {
    rsx! {
        ModalFrame { kind: UpgradePromptVm::KIND, on_click,
            button {
                class: "modal-close",
                r#type: "button",
                aria_label: "Close",
                onclick: move |_| on_close.call(()),
                "×"
            }
            h2 { class: "modal-title", "{vm.title}" }
            p { class: "modal-message", "{vm.message}" }
            ul { class: "modal-features",
                for feature in vm.features {
                    li { "{feature}" }
                }
            }
            button {
                class: "btn btn-primary",
                r#type: "button",
                onclick: move |_| on_close.call(()),
                "{vm.cta_label}"
            }
        }
    }
}
