use dioxus::document::eval;

const HIGHLIGHT_SELECTION_SCRIPT_TEMPLATE: &str = r#"
    const root = document.getElementById("{element_id}");
    if (!root) { return null; }
    const sel = window.getSelection();
    if (!sel || sel.rangeCount === 0 || sel.isCollapsed) { return null; }
    const range = sel.getRangeAt(0);
    if (!root.contains(range.commonAncestorContainer)) { return null; }
    const mark = document.createElement("mark");
    try {
        range.surroundContents(mark);
    } catch (_) {
        mark.appendChild(range.extractContents());
        range.insertNode(mark);
    }
    sel.removeAllRanges();
    return root.innerHTML;
"#;

/// Wraps the current selection inside `element_id` in `<mark>` and returns the element's new HTML.
///
/// `None` when nothing inside the element is selected.
pub async fn highlight_selection(element_id: &str) -> Option<String> {
    let script = HIGHLIGHT_SELECTION_SCRIPT_TEMPLATE.replace("{element_id}", element_id);
    eval(&script).join::<Option<String>>().await.ok().flatten()
}
