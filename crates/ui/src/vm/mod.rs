mod content_list_vm;
mod html_vm;
mod modal_vm;
mod review_vm;
mod session_vm;
mod time_fmt;

pub use content_list_vm::{
    ContentListController, ContentListHandler, ContentListVm, ContentRowVm, EMPTY_LIST_MESSAGE,
    IndicatorKind, Interaction, ListAction, RowTarget,
};
pub use html_vm::{html_to_text, looks_like_html, mark_first, normalize_text, sanitize_html};
pub use modal_vm::{
    HitRegion, ModalButtonVm, ModalEffect, ModalKind, ResumePromptVm, UpgradePromptVm, hit_test,
    map_resume_prompt, map_upgrade_prompt,
};
pub use review_vm::{
    ReviewCellVm, ReviewGridVm, ReviewIntent, apply_review_intent, map_review_grid,
    review_error_message, review_grid,
};
pub use session_vm::{
    OpenQuiz, OptionVm, QuestionVm, SessionIntent, SessionOutcome, SessionVm, open_quiz,
    resolve_resume, save_indicator,
};
pub use time_fmt::{format_datetime, format_timer};
