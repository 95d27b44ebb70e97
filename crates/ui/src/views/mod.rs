mod content_list;
mod modal;
mod question;
mod review;
mod scripts;
mod state;
mod topic;

#[cfg(test)]
mod test_harness;
#[cfg(test)]
mod view_smoke;

pub use content_list::ContentListView;
pub use modal::{ModalFrame, ResumePromptModal, UpgradePromptModal};
pub use question::QuestionView;
pub use review::ReviewGridView;
pub use state::{ViewError, ViewState, view_state_from_resource};
pub use topic::TopicView;
