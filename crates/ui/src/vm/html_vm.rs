//! Rendering of question HTML for display surfaces.

use std::collections::{HashMap, HashSet};

/// Strips anything not needed to show question content (scripts, handlers, styles).
#[must_use]
pub fn sanitize_html(html: &str) -> String {
    let tags: HashSet<&str> = [
        "p", "div", "span", "br", "em", "strong", "b", "i", "u", "sub", "sup", "code", "pre",
        "blockquote", "ul", "ol", "li", "table", "thead", "tbody", "tr", "th", "td", "img",
        "mark",
    ]
    .into_iter()
    .collect();

    let mut attributes: HashMap<&str, HashSet<&str>> = HashMap::new();
    attributes.insert("img", ["src", "alt"].into_iter().collect());
    attributes.insert("td", ["colspan", "rowspan"].into_iter().collect());
    attributes.insert("th", ["colspan", "rowspan"].into_iter().collect());

    ammonia::Builder::new()
        .tags(tags)
        .tag_attributes(attributes)
        .clean(html)
        .to_string()
}

/// Plain-text rendering for terminals: sanitized, converted to Markdown, normalized.
#[must_use]
pub fn html_to_text(input: &str) -> String {
    if !looks_like_html(input) {
        return normalize_text(input);
    }
    let markdown = html2md::parse_html(&emphasize_marks(&sanitize_html(input)));
    normalize_text(&markdown)
}

/// Terminals cannot show a highlight, so marked runs become bold.
fn emphasize_marks(html: &str) -> String {
    html.replace("<mark>", "<strong>").replace("</mark>", "</strong>")
}

/// Wraps the first occurrence of `needle` found in a text run of `html` in `<mark>`.
///
/// Matches never span tags. Returns `None` when the text is not present.
#[must_use]
pub fn mark_first(html: &str, needle: &str) -> Option<String> {
    if needle.trim().is_empty() {
        return None;
    }
    let mut offset = 0;
    while offset < html.len() {
        let rest = &html[offset..];
        let (text_len, tag_len) = match rest.find('<') {
            Some(start) => {
                let tag_len = rest[start..].find('>').map_or(rest.len() - start, |end| end + 1);
                (start, tag_len)
            }
            None => (rest.len(), 0),
        };
        if let Some(hit) = rest[..text_len].find(needle) {
            let at = offset + hit;
            let end = at + needle.len();
            return Some(format!(
                "{}<mark>{}</mark>{}",
                &html[..at],
                &html[at..end],
                &html[end..]
            ));
        }
        offset += text_len + tag_len;
    }
    None
}

#[must_use]
pub fn looks_like_html(input: &str) -> bool {
    let trimmed = input.trim_start();
    if trimmed.is_empty() {
        return false;
    }

    let lower = trimmed.to_ascii_lowercase();
    let Some(start) = lower.find('<') else {
        return false;
    };
    if !lower[start + 1..].contains('>') {
        return false;
    }

    let tags = [
        "<p", "<div", "<span", "<br", "<b>", "<i>", "<em", "<strong", "<sub", "<sup", "<ul",
        "<ol", "<table", "<img", "<mark",
    ];
    tags.iter().any(|tag| lower.contains(tag))
}

/// Trims trailing whitespace per line, collapses blank runs and ends with one newline.
#[must_use]
pub fn normalize_text(input: &str) -> String {
    let normalized = input.replace("\r\n", "\n").replace('\r', "\n");
    let mut lines = Vec::new();
    let mut blank_streak = 0usize;

    for line in normalized.split('\n') {
        let trimmed = line.trim_end_matches([' ', '\t']).to_string();
        if trimmed.is_empty() {
            blank_streak += 1;
            if blank_streak > 1 {
                continue;
            }
        } else {
            blank_streak = 0;
        }
        lines.push(trimmed);
    }

    let mut output = lines.join("\n").trim_matches('\n').to_string();
    if !output.is_empty() {
        output.push('\n');
    }
    output
}

#[cfg(test)]
mod tests {
    use super::{html_to_text, looks_like_html, mark_first, normalize_text, sanitize_html};

    #[test]
    fn html_detection_requires_structure_and_known_tags() {
        assert!(looks_like_html("<p>Hello</p>"));
        assert!(looks_like_html("H<sub>2</sub>O"));
        assert!(looks_like_html("<table><tr><td>1</td></tr></table>"));

        assert!(!looks_like_html("2 < 3 > 1"));
        assert!(!looks_like_html("<notatag"));
        assert!(!looks_like_html("plain text"));
    }

    #[test]
    fn sanitize_drops_scripts_and_handlers() {
        let clean = sanitize_html("<p onclick=\"x()\">Hi</p><script>alert(1)</script>");
        assert!(clean.contains("Hi"));
        assert!(!clean.contains("onclick"));
        assert!(!clean.contains("script"));
    }

    #[test]
    fn html_renders_as_plain_paragraphs() {
        assert_eq!(html_to_text("<p>Hello</p>\r\n<p>World</p>"), "Hello\n\nWorld\n");
    }

    #[test]
    fn marks_survive_sanitizing_and_render_bold() {
        let html = "<p>The <mark>LH</mark> surge</p>";
        assert_eq!(sanitize_html(html), html);
        assert_eq!(html_to_text(html), "The **LH** surge\n");
    }

    #[test]
    fn mark_first_skips_tag_names_and_attributes() {
        assert_eq!(
            mark_first("<p class=\"p\">a p b</p>", "p").as_deref(),
            Some("<p class=\"p\">a <mark>p</mark> b</p>")
        );
        assert_eq!(
            mark_first("plain LH text", "LH").as_deref(),
            Some("plain <mark>LH</mark> text")
        );
        assert_eq!(mark_first("<p>abc</p>", "xyz"), None);
        assert_eq!(mark_first("<p>abc</p>", " "), None);
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(html_to_text("Burst"), "Burst\n");
    }

    #[test]
    fn normalize_trims_and_collapses_blank_lines() {
        let input = "\n\nLine one  \r\n\r\n\r\nLine two\t\r\n\r\n";
        assert_eq!(normalize_text(input), "Line one\n\nLine two\n");
    }
}
