//! Projection and click routing for a list of practice tests or question banks.

use quiz_core::access::is_locked_for;
use quiz_core::model::{ListItem, QuizId, SectionType, UserProfile};

pub const EMPTY_LIST_MESSAGE: &str = "No items available for this section.";

/// Trailing marker on each row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndicatorKind {
    Lock,
    Start,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentRowVm {
    pub id: QuizId,
    pub name: String,
    pub section_type: SectionType,
    pub locked: bool,
    pub selected: bool,
    pub indicator: IndicatorKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentListVm {
    Empty { message: &'static str },
    Rows(Vec<ContentRowVm>),
}

/// Where on a row the user interacted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowTarget {
    Name,
    Indicator,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interaction {
    Click(RowTarget),
    DoubleClick,
}

/// What the caller should do in response to an interaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListAction {
    LockedItemClicked,
    Select { id: QuizId, section_type: SectionType },
    StartQuiz { id: QuizId, section_type: SectionType },
}

/// Receiver of list actions, implemented by whatever owns the selection.
pub trait ContentListHandler {
    fn on_locked_item_click(&mut self);
    fn on_item_select(&mut self, id: &QuizId, section_type: SectionType);
    fn on_start_quiz(&mut self, id: &QuizId, section_type: SectionType);
}

/// Stateless controller over one list. Selection lives with the caller and is
/// passed in on every call.
#[derive(Clone, Copy, Debug)]
pub struct ContentListController<'a> {
    items: &'a [ListItem],
    profile: Option<&'a UserProfile>,
}

impl<'a> ContentListController<'a> {
    #[must_use]
    pub fn new(items: &'a [ListItem], profile: Option<&'a UserProfile>) -> Self {
        Self { items, profile }
    }

    #[must_use]
    pub fn is_locked(&self, item: &ListItem) -> bool {
        is_locked_for(self.profile, item.position)
    }

    #[must_use]
    pub fn project(&self, selected: Option<&QuizId>) -> ContentListVm {
        if self.items.is_empty() {
            return ContentListVm::Empty {
                message: EMPTY_LIST_MESSAGE,
            };
        }
        let rows = self
            .items
            .iter()
            .map(|item| {
                let locked = self.is_locked(item);
                ContentRowVm {
                    id: item.id.clone(),
                    name: item.name.clone(),
                    section_type: item.section_type,
                    locked,
                    selected: selected == Some(&item.id),
                    indicator: if locked {
                        IndicatorKind::Lock
                    } else {
                        IndicatorKind::Start
                    },
                }
            })
            .collect();
        ContentListVm::Rows(rows)
    }

    /// Routes an interaction on the item `id`. Unknown ids produce no action.
    #[must_use]
    pub fn interact(
        &self,
        id: &QuizId,
        interaction: Interaction,
        selected: Option<&QuizId>,
    ) -> Option<ListAction> {
        let item = self.items.iter().find(|item| &item.id == id)?;
        if self.is_locked(item) {
            return Some(ListAction::LockedItemClicked);
        }
        let start = ListAction::StartQuiz {
            id: item.id.clone(),
            section_type: item.section_type,
        };
        let action = match interaction {
            Interaction::DoubleClick | Interaction::Click(RowTarget::Indicator) => start,
            Interaction::Click(RowTarget::Name) if selected == Some(&item.id) => start,
            Interaction::Click(RowTarget::Name) => ListAction::Select {
                id: item.id.clone(),
                section_type: item.section_type,
            },
        };
        Some(action)
    }

    /// Like [`interact`](Self::interact), delivering the action to `handler`.
    pub fn dispatch(
        &self,
        id: &QuizId,
        interaction: Interaction,
        selected: Option<&QuizId>,
        handler: &mut dyn ContentListHandler,
    ) -> Option<ListAction> {
        let action = self.interact(id, interaction, selected)?;
        match &action {
            ListAction::LockedItemClicked => handler.on_locked_item_click(),
            ListAction::Select { id, section_type } => handler.on_item_select(id, *section_type),
            ListAction::StartQuiz { id, section_type } => handler.on_start_quiz(id, *section_type),
        }
        Some(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::UserTier;

    fn items(count: usize) -> Vec<ListItem> {
        (0..count)
            .map(|p| {
                ListItem::new(
                    format!("pt-{p}").as_str(),
                    format!("Test {p}"),
                    p,
                    SectionType::Practice,
                )
            })
            .collect()
    }

    #[derive(Default)]
    struct Recorder {
        selected: Option<QuizId>,
        locked_clicks: usize,
        started: Vec<QuizId>,
    }

    impl ContentListHandler for Recorder {
        fn on_locked_item_click(&mut self) {
            self.locked_clicks += 1;
        }

        fn on_item_select(&mut self, id: &QuizId, _section_type: SectionType) {
            self.selected = Some(id.clone());
        }

        fn on_start_quiz(&mut self, id: &QuizId, _section_type: SectionType) {
            self.started.push(id.clone());
        }
    }

    #[test]
    fn free_tier_locks_everything_after_the_first_item() {
        let list = items(10);
        let profile = UserProfile::new("u", UserTier::Free);
        let controller = ContentListController::new(&list, Some(&profile));
        let ContentListVm::Rows(rows) = controller.project(None) else {
            panic!("list is not empty");
        };
        assert!(!rows[0].locked);
        assert_eq!(rows[0].indicator, IndicatorKind::Start);
        assert!(rows[1..].iter().all(|r| r.locked && r.indicator == IndicatorKind::Lock));

        let mut recorder = Recorder {
            selected: Some(list[0].id.clone()),
            ..Recorder::default()
        };
        let selected = recorder.selected.clone();
        let action = controller.dispatch(
            &list[3].id,
            Interaction::Click(RowTarget::Name),
            selected.as_ref(),
            &mut recorder,
        );
        assert_eq!(action, Some(ListAction::LockedItemClicked));
        assert_eq!(recorder.locked_clicks, 1);
        assert_eq!(recorder.selected, Some(list[0].id.clone()));
        assert!(recorder.started.is_empty());
    }

    #[test]
    fn first_click_selects_second_click_starts() {
        let list = items(3);
        let profile = UserProfile::new("u", UserTier::Plus);
        let controller = ContentListController::new(&list, Some(&profile));
        let mut recorder = Recorder::default();

        controller.dispatch(&list[2].id, Interaction::Click(RowTarget::Name), None, &mut recorder);
        assert_eq!(recorder.selected, Some(list[2].id.clone()));
        assert!(recorder.started.is_empty());

        let selected = recorder.selected.clone();
        controller.dispatch(
            &list[2].id,
            Interaction::Click(RowTarget::Name),
            selected.as_ref(),
            &mut recorder,
        );
        assert_eq!(recorder.started, vec![list[2].id.clone()]);
    }

    #[test]
    fn indicator_and_double_click_start_directly() {
        let list = items(2);
        let profile = UserProfile::new("u", UserTier::Pro);
        let controller = ContentListController::new(&list, Some(&profile));
        let start = Some(ListAction::StartQuiz {
            id: list[1].id.clone(),
            section_type: SectionType::Practice,
        });
        assert_eq!(
            controller.interact(&list[1].id, Interaction::Click(RowTarget::Indicator), None),
            start
        );
        assert_eq!(controller.interact(&list[1].id, Interaction::DoubleClick, None), start);
    }

    #[test]
    fn locked_items_never_start() {
        let list = items(2);
        let controller = ContentListController::new(&list, None);
        for interaction in [
            Interaction::DoubleClick,
            Interaction::Click(RowTarget::Indicator),
            Interaction::Click(RowTarget::Name),
        ] {
            assert_eq!(
                controller.interact(&list[0].id, interaction, Some(&list[0].id)),
                Some(ListAction::LockedItemClicked)
            );
        }
    }

    #[test]
    fn empty_list_and_unknown_ids() {
        let controller = ContentListController::new(&[], None);
        assert_eq!(
            controller.project(None),
            ContentListVm::Empty {
                message: EMPTY_LIST_MESSAGE
            }
        );
        assert_eq!(
            controller.interact(&QuizId::new("nope"), Interaction::DoubleClick, None),
            None
        );
    }

    #[test]
    fn selection_is_projected_from_the_caller() {
        let list = items(3);
        let profile = UserProfile::new("u", UserTier::Pro);
        let controller = ContentListController::new(&list, Some(&profile));
        let ContentListVm::Rows(rows) = controller.project(Some(&list[1].id)) else {
            panic!("list is not empty");
        };
        assert_eq!(
            rows.iter().map(|r| r.selected).collect::<Vec<_>>(),
            vec![false, true, false]
        );
    }
}
