use dioxus::prelude::*;
use quiz_core::model::{ListItem, QuizId, UserProfile};

use crate::vm::{
    ContentListController, ContentListVm, ContentRowVm, IndicatorKind, Interaction, ListAction,
    RowTarget,
};

#[cfg(test)]
use super::topic::TopicTestHandles;

/// One section list. The selected item belongs to the caller and comes back in as a prop.
#[component]
pub fn ContentListView(
    title: String,
    items: Vec<ListItem>,
    profile: Option<UserProfile>,
    selected: Option<QuizId>,
    on_action: EventHandler<ListAction>,
) -> Element {
    let projection = ContentListController::new(&items, profile.as_ref()).project(selected.as_ref());

    let route = use_callback(move |(id, interaction): (QuizId, Interaction)| {
        let controller = ContentListController::new(&items, profile.as_ref());
        if let Some(action) = controller.interact(&id, interaction, selected.as_ref()) {
            on_action.call(action);
        }
    });

    #[cfg(test)]
    {
        let mut registered = use_signal(|| false);
        if !registered() {
            registered.set(true);
            if let Some(handles) = try_consume_context::<TopicTestHandles>() {
                handles.register_route(&title, route);
            }
        }
    }

    rsx! {
        section { class: "content-list",
            h3 { class: "content-list-title", "{title}" }
            match projection {
                ContentListVm::Empty { message } => rsx! {
                    p { class: "content-list-empty", "{message}" }
                },
                ContentListVm::Rows(rows) => rsx! {
                    ul { class: "content-list-rows",
                        for (key, row) in rows.into_iter().map(|row| (row.id.to_string(), row)) {
                            ContentRow { key: "{key}", row, route }
                        }
                    }
                },
            }
        }
    }
}

#[component]
fn ContentRow(row: ContentRowVm, route: Callback<(QuizId, Interaction)>) -> Element {
    let mut class = String::from("content-row");
    if row.locked {
        class.push_str(" content-row--locked");
    }
    if row.selected {
        class.push_str(" content-row--selected");
    }
    let (indicator_class, indicator_label) = match row.indicator {
        IndicatorKind::Lock => ("content-row-indicator content-row-indicator--lock", "Locked"),
        IndicatorKind::Start => ("content-row-indicator content-row-indicator--start", "Start"),
    };
    let click_id = row.id.clone();
    let double_id = row.id.clone();
    let indicator_id = row.id.clone();

    rsx! {
        li {
            class: "{class}",
            onclick: move |_| route.call((click_id.clone(), Interaction::Click(RowTarget::Name))),
            ondoubleclick: move |_| route.call((double_id.clone(), Interaction::DoubleClick)),
            span { class: "content-row-name", "{row.name}" }
            button {
                class: "{indicator_class}",
                r#type: "button",
                onclick: move |evt| {
                    evt.stop_propagation();
                    route.call((indicator_id.clone(), Interaction::Click(RowTarget::Indicator)));
                },
                "{indicator_label}"
            }
        }
    }
}
