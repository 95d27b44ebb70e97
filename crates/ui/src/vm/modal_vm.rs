use services::ResumeChoice;
use services::sessions::{ResumePrompt, UpgradeNotice};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModalKind {
    /// Must be answered; outside clicks do nothing.
    ResumePrompt,
    UpgradePrompt,
}

impl ModalKind {
    #[must_use]
    pub fn is_dismissable(self) -> bool {
        matches!(self, ModalKind::UpgradePrompt)
    }
}

/// The two regions a modal click can land in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitRegion {
    Backdrop,
    Content,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModalEffect {
    Dismiss,
    Ignore,
}

/// Clicks on content are always swallowed; backdrop clicks close only dismissable modals.
#[must_use]
pub fn hit_test(kind: ModalKind, region: HitRegion) -> ModalEffect {
    match region {
        HitRegion::Backdrop if kind.is_dismissable() => ModalEffect::Dismiss,
        HitRegion::Backdrop | HitRegion::Content => ModalEffect::Ignore,
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModalButtonVm<A> {
    pub label: &'static str,
    pub primary: bool,
    pub action: A,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResumePromptVm {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub quiz_name: String,
    pub progress_label: String,
    pub buttons: [ModalButtonVm<ResumeChoice>; 2],
}

impl ResumePromptVm {
    pub const KIND: ModalKind = ModalKind::ResumePrompt;
}

#[must_use]
pub fn map_resume_prompt(prompt: &ResumePrompt) -> ResumePromptVm {
    let metadata = prompt.metadata();
    let quiz_name = if metadata.full_name_for_display.is_empty() {
        prompt.attempt().quiz_id().to_string()
    } else {
        metadata.full_name_for_display.clone()
    };
    ResumePromptVm {
        title: "Welcome Back!",
        subtitle: "You have a quiz in progress. Would you like to continue where you left off?",
        quiz_name,
        progress_label: format!(
            "{} of {} answered, stopped at question {}",
            prompt.answered_count(),
            prompt.question_count(),
            prompt.resume_question_number()
        ),
        buttons: [
            ModalButtonVm {
                label: "Start Over",
                primary: false,
                action: ResumeChoice::StartOver,
            },
            ModalButtonVm {
                label: "Yes, Resume",
                primary: true,
                action: ResumeChoice::Resume,
            },
        ],
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpgradePromptVm {
    pub title: &'static str,
    pub message: &'static str,
    pub features: [&'static str; 4],
    pub cta_label: &'static str,
}

impl UpgradePromptVm {
    pub const KIND: ModalKind = ModalKind::UpgradePrompt;
}

#[must_use]
pub fn map_upgrade_prompt(notice: &UpgradeNotice) -> UpgradePromptVm {
    UpgradePromptVm {
        title: notice.title,
        message: notice.message,
        features: [
            "Access all Practice Tests",
            "Access all Question Banks",
            "Detailed Performance Analytics",
            "Unlimited Quiz History",
        ],
        cta_label: "View Plans",
    }
}
