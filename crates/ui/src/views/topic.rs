use std::time::Duration;

use dioxus::prelude::*;
use quiz_core::model::{PracticeTestSettings, QuizId, TopicStructure};
use services::{ResumeChoice, SaveStatus};
use services::sessions::{ResumePrompt, ReviewPanel};
use tracing::warn;

use super::content_list::ContentListView;
use super::modal::{ResumePromptModal, UpgradePromptModal};
use super::question::QuestionView;
use super::review::ReviewGridView;
use crate::context::AppContext;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{
    HitRegion, ListAction, ModalEffect, OpenQuiz, QuestionVm, ResumePromptVm, ReviewGridVm,
    ReviewIntent, SessionIntent, SessionVm, UpgradePromptVm, apply_review_intent, hit_test,
    map_upgrade_prompt, open_quiz, resolve_resume, review_error_message, review_grid,
};

#[cfg(test)]
use std::cell::RefCell;
#[cfg(test)]
use std::rc::Rc;

#[cfg(test)]
use crate::vm::Interaction;

/// Owned snapshot of the running session, taken once per render.
struct SessionSnapshot {
    title: String,
    timer: String,
    save: Option<&'static str>,
    score: Option<String>,
    finished: bool,
    question: QuestionVm,
}

impl SessionSnapshot {
    fn of(vm: &SessionVm) -> Self {
        Self {
            title: vm.title().to_string(),
            timer: vm.timer_label(),
            save: vm.save_indicator(),
            score: vm.score_label(),
            finished: vm.is_finished(),
            question: vm.current_question(),
        }
    }
}

#[component]
pub fn TopicView() -> Element {
    let ctx = use_context::<AppContext>();
    let sessions = ctx.sessions();
    let topic_id = ctx.topic_id().clone();
    let profile = ctx.profile().cloned();
    let autosave_every = ctx.settings().autosave_interval_secs().max(1);

    let mut selected = use_signal(|| None::<QuizId>);
    let mut upgrade = use_signal(|| None::<UpgradePromptVm>);
    let mut resume = use_signal(|| None::<(ResumePromptVm, ResumePrompt)>);
    let mut session = use_signal(|| None::<SessionVm>);
    let mut review = use_signal(|| None::<ReviewGridVm>);
    let mut review_message = use_signal(|| None::<&'static str>);
    let mut error = use_signal(|| None::<ViewError>);

    let resource = {
        let sessions = sessions.clone();
        let topic_id = topic_id.clone();
        use_resource(move || {
            let sessions = sessions.clone();
            let topic_id = topic_id.clone();
            async move {
                sessions
                    .topic_structure(&topic_id)
                    .await
                    .map_err(ViewError::from)
            }
        })
    };
    let state: ViewState<TopicStructure> = view_state_from_resource(resource);

    let on_list_action = {
        let sessions = sessions.clone();
        let topic_id = topic_id.clone();
        let profile = profile.clone();
        use_callback(move |action: ListAction| match action {
            ListAction::LockedItemClicked => {
                upgrade.set(Some(map_upgrade_prompt(&sessions.locked_item_tapped())));
            }
            ListAction::Select { id, .. } => selected.set(Some(id)),
            ListAction::StartQuiz { id, section_type } => {
                selected.set(Some(id.clone()));
                let sessions = sessions.clone();
                let topic_id = topic_id.clone();
                let profile = profile.clone();
                spawn(async move {
                    let opened = open_quiz(
                        &sessions,
                        &topic_id,
                        &id,
                        section_type,
                        profile.as_ref(),
                        PracticeTestSettings::default(),
                    )
                    .await;
                    match opened {
                        Ok(OpenQuiz::Session { vm, load_degraded }) => {
                            if load_degraded {
                                warn!(quiz_id = %id, "stored attempt unreadable, started fresh");
                            }
                            error.set(None);
                            session.set(Some(vm));
                        }
                        Ok(OpenQuiz::Resume { modal, prompt }) => {
                            resume.set(Some((modal, prompt)));
                        }
                        Ok(OpenQuiz::Upgrade(modal)) => upgrade.set(Some(modal)),
                        Err(err) => error.set(Some(err)),
                    }
                });
            }
        })
    };

    let on_modal_click = use_callback(move |region: HitRegion| {
        let kind = if upgrade.read().is_some() {
            UpgradePromptVm::KIND
        } else if resume.read().is_some() {
            ResumePromptVm::KIND
        } else {
            return;
        };
        if hit_test(kind, region) == ModalEffect::Dismiss {
            upgrade.set(None);
        }
    });

    let on_close_upgrade = use_callback(move |()| upgrade.set(None));

    let on_resume = {
        let sessions = sessions.clone();
        use_callback(move |choice: ResumeChoice| {
            let Some((_, prompt)) = resume.read().clone() else {
                return;
            };
            let sessions = sessions.clone();
            spawn(async move {
                match resolve_resume(&sessions, prompt, choice).await {
                    Ok(vm) => {
                        resume.set(None);
                        error.set(None);
                        session.set(Some(vm));
                    }
                    Err(err) => error.set(Some(err)),
                }
            });
        })
    };

    let on_intent = use_callback(move |intent: SessionIntent| {
        let mut guard = session.write();
        let Some(vm) = guard.as_mut() else {
            return;
        };
        match vm.apply(intent) {
            Ok(_) => error.set(None),
            Err(err) => error.set(Some(err)),
        }
    });

    let on_open_review = use_callback(move |()| {
        let mut guard = session.write();
        let Some(vm) = guard.as_mut() else {
            return;
        };
        match ReviewPanel::open(vm.engine_mut()) {
            Ok(panel) => {
                review.set(Some(review_grid(&panel)));
                review_message.set(None);
            }
            Err(err) => review_message.set(Some(review_error_message(&err))),
        }
    });

    let on_review = use_callback(move |intent: ReviewIntent| {
        let mut guard = session.write();
        let Some(vm) = guard.as_mut() else {
            return;
        };
        let panel = match ReviewPanel::open(vm.engine_mut()) {
            Ok(panel) => panel,
            Err(err) => {
                review_message.set(Some(review_error_message(&err)));
                return;
            }
        };
        match apply_review_intent(panel, intent) {
            Ok(_) => {
                review.set(None);
                review_message.set(None);
            }
            Err((panel, message)) => {
                review.set(Some(review_grid(&panel)));
                review_message.set(Some(message));
            }
        }
    });

    let on_leave = use_callback(move |()| {
        review.set(None);
        review_message.set(None);
        let taken = session.write().take();
        if let Some(vm) = taken {
            spawn(async move {
                let state = vm.into_engine().close().await;
                if let Some(state) = state.filter(|state| state.status == SaveStatus::Failed) {
                    warn!(error = ?state.last_error, "attempt closed without a final save");
                }
            });
        }
    });

    use_future(move || async move {
        let mut elapsed = 0_u32;
        loop {
            tokio::time::sleep(Duration::from_secs(1)).await;
            let running = session.read().as_ref().is_some_and(|vm| !vm.is_finished());
            if !running || review.read().is_some() {
                continue;
            }
            let mut guard = session.write();
            let Some(vm) = guard.as_mut() else {
                continue;
            };
            if let Err(err) = vm.tick(1) {
                error.set(Some(err));
                continue;
            }
            elapsed += 1;
            if elapsed % autosave_every == 0 && !vm.is_finished() {
                if let Err(err) = vm.engine_mut().checkpoint() {
                    warn!(error = %err, "timer checkpoint failed");
                }
            }
        }
    });

    #[cfg(test)]
    {
        let mut registered = use_signal(|| false);
        if !registered() {
            registered.set(true);
            if let Some(handles) = try_consume_context::<TopicTestHandles>() {
                handles.register(TopicCallbacks {
                    modal_click: on_modal_click,
                    resume: on_resume,
                    intent: on_intent,
                    open_review: on_open_review,
                    review: on_review,
                    leave: on_leave,
                });
            }
        }
    }

    let snapshot = session.read().as_ref().map(SessionSnapshot::of);
    let current_error = *error.read();
    let upgrade_modal = upgrade.read().clone();
    let resume_modal = resume.read().as_ref().map(|(vm, _)| vm.clone());
    let review_grid_vm = review.read().clone();
    let review_note = review_message().map(str::to_string);
    let selected_id = selected.read().clone();

    rsx! {
        div { class: "topic",
            if let Some(err) = current_error {
                p { class: "topic-error", role: "alert", "{err.message()}" }
            }
            if let Some(snapshot) = snapshot {
                section { class: "session",
                    header { class: "session-header",
                        h2 { class: "session-title", "{snapshot.title}" }
                        span { class: "session-timer", "{snapshot.timer}" }
                        if let Some(save) = snapshot.save {
                            span { class: "session-save", "{save}" }
                        }
                    }
                    if let Some(score) = snapshot.score.as_ref() {
                        p { class: "session-score", "{score}" }
                    }
                    QuestionView { question: snapshot.question, on_intent }
                    footer { class: "session-actions",
                        if !snapshot.finished {
                            button {
                                class: "btn btn-secondary",
                                r#type: "button",
                                onclick: move |_| on_open_review.call(()),
                                "Review"
                            }
                            button {
                                class: "btn btn-primary",
                                r#type: "button",
                                onclick: move |_| on_intent.call(SessionIntent::Finish),
                                "Finish"
                            }
                        }
                        button {
                            class: "btn btn-ghost",
                            r#type: "button",
                            onclick: move |_| on_leave.call(()),
                            "Back to List"
                        }
                    }
                    if let Some(grid) = review_grid_vm {
                        ReviewGridView { grid, message: review_note, on_intent: on_review }
                    }
                }
            } else {
                match state {
                    ViewState::Idle | ViewState::Loading => rsx! {
                        p { "Loading..." }
                    },
                    ViewState::Error(err) => rsx! {
                        p { "{err.message()}" }
                        button {
                            class: "btn btn-secondary",
                            r#type: "button",
                            onclick: move |_| {
                                let mut resource = resource;
                                resource.restart();
                            },
                            "Retry"
                        }
                    },
                    ViewState::Ready(topic) => rsx! {
                        h2 { class: "topic-title", "{topic.name}" }
                        ContentListView {
                            title: "Practice Tests".to_string(),
                            items: topic.practice_tests.clone(),
                            profile: profile.clone(),
                            selected: selected_id.clone(),
                            on_action: on_list_action,
                        }
                        if topic.question_banks.is_empty() {
                            ContentListView {
                                title: "Question Banks".to_string(),
                                items: Vec::new(),
                                profile: profile.clone(),
                                selected: selected_id.clone(),
                                on_action: on_list_action,
                            }
                        }
                        for (category, banks) in topic.question_banks.clone().into_iter().map(|group| (group.category, group.banks)) {
                            ContentListView {
                                key: "{category}",
                                title: category.clone(),
                                items: banks,
                                profile: profile.clone(),
                                selected: selected_id.clone(),
                                on_action: on_list_action,
                            }
                        }
                    },
                }
            }
            if let Some(vm) = resume_modal {
                ResumePromptModal { vm, on_click: on_modal_click, on_choice: on_resume }
            }
            if let Some(vm) = upgrade_modal {
                UpgradePromptModal { vm, on_click: on_modal_click, on_close: on_close_upgrade }
            }
        }
    }
}

#[cfg(test)]
#[derive(Clone, Copy)]
pub(crate) struct TopicCallbacks {
    pub(crate) modal_click: Callback<HitRegion>,
    pub(crate) resume: Callback<ResumeChoice>,
    pub(crate) intent: Callback<SessionIntent>,
    pub(crate) open_review: Callback<()>,
    pub(crate) review: Callback<ReviewIntent>,
    pub(crate) leave: Callback<()>,
}

#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct TopicTestHandles {
    routes: Rc<RefCell<Vec<(String, Callback<(QuizId, Interaction)>)>>>,
    callbacks: Rc<RefCell<Option<TopicCallbacks>>>,
}

#[cfg(test)]
impl TopicTestHandles {
    pub(crate) fn register(&self, callbacks: TopicCallbacks) {
        *self.callbacks.borrow_mut() = Some(callbacks);
    }

    /// Lists mount and remount as the page changes; the latest route per title wins.
    pub(crate) fn register_route(
        &self,
        title: &str,
        route: Callback<(QuizId, Interaction)>,
    ) {
        let mut routes = self.routes.borrow_mut();
        routes.retain(|(existing, _)| existing != title);
        routes.push((title.to_string(), route));
    }

    pub(crate) fn route(&self, title: &str) -> Callback<(QuizId, Interaction)> {
        self.routes
            .borrow()
            .iter()
            .find(|(existing, _)| existing == title)
            .map(|(_, route)| *route)
            .expect("list route registered")
    }

    pub(crate) fn callbacks(&self) -> TopicCallbacks {
        (*self.callbacks.borrow()).expect("topic callbacks registered")
    }
}
