//! Plain text to paragraph markup

/// Wrapper class for rendered text chapters
pub const TEXT_CHAPTER_CLASS: &str = "txt-chapter";

/// Render text as one escaped `<p>` per non-blank line
pub fn text_to_html(text: &str) -> String {
    let mut html = String::with_capacity(text.len() + text.len() / 4 + 32);
    html.push_str("<div class=\"");
    html.push_str(TEXT_CHAPTER_CLASS);
    html.push_str("\">");
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        html.push_str("<p>");
        html.push_str(&html_escape::encode_text(line));
        html.push_str("</p>");
    }
    html.push_str("</div>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_become_paragraphs() {
        let html = text_to_html("first line\n\n   \nsecond line\r\n");
        assert_eq!(
            html,
            r#"<div class="txt-chapter"><p>first line</p><p>second line</p></div>"#
        );
    }

    #[test]
    fn test_markup_is_escaped() {
        let html = text_to_html("<script>alert(1)</script> & more");
        assert!(html.contains("<p>&lt;script&gt;alert(1)&lt;/script&gt; &amp; more</p>"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(text_to_html(""), r#"<div class="txt-chapter"></div>"#);
    }
}
