//! Paragraph splitting and greedy word wrap.

use crate::layout::font_metrics::FontMetrics;

/// Characters that end a paragraph. `\r\n` is treated as a single break.
fn is_line_terminator(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r'
            | '\u{0B}'
            | '\u{0C}'
            | '\u{1C}'
            | '\u{1D}'
            | '\u{1E}'
            | '\u{85}'
            | '\u{2028}'
            | '\u{2029}'
    )
}

/// Splits text into paragraphs on line terminators.
///
/// Empty paragraphs are kept: a blank line is vertical spacing the letter
/// asked for. A terminator at the very end does not start another paragraph.
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    let mut paragraphs = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if !is_line_terminator(c) {
            continue;
        }
        paragraphs.push(&text[start..idx]);
        let mut end = idx + c.len_utf8();
        if c == '\r' && matches!(chars.peek(), Some(&(_, '\n'))) {
            chars.next();
            end += 1;
        }
        start = end;
    }
    if start < text.len() {
        paragraphs.push(&text[start..]);
    }
    paragraphs
}

/// Greedy word wrap against `max_width` points.
///
/// Words are whitespace-separated and re-joined with single spaces. A word is
/// appended to the current line while the line stays within `max_width`; a
/// word that is wider than `max_width` on its own gets a line to itself and
/// overflows rather than being split.
pub fn wrap_paragraph(
    paragraph: &str,
    metrics: &FontMetrics,
    font_size: f32,
    max_width: f32,
) -> Vec<String> {
    let space_w = metrics.string_width(" ", font_size);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0_f32;

    for word in paragraph.split_whitespace() {
        let word_w = metrics.string_width(word, font_size);

        if current.is_empty() {
            current.push_str(word);
            current_width = word_w;
        } else if current_width + space_w + word_w <= max_width {
            current.push(' ');
            current.push_str(word);
            current_width += space_w + word_w;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_width = word_w;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::font_metrics::StandardFont;

    fn helvetica() -> FontMetrics {
        FontMetrics::standard(StandardFont::Helvetica)
    }

    #[test]
    fn test_split_keeps_blank_paragraphs() {
        assert_eq!(
            split_paragraphs("Jane Doe\njane@example.com\n\nI am writing"),
            vec!["Jane Doe", "jane@example.com", "", "I am writing"]
        );
    }

    #[test]
    fn test_split_handles_crlf_and_lone_cr() {
        assert_eq!(split_paragraphs("a\r\nb\rc"), vec!["a", "b", "c"]);
        assert_eq!(split_paragraphs("a\r\n\r\nb"), vec!["a", "", "b"]);
    }

    #[test]
    fn test_split_trailing_terminator_adds_nothing() {
        assert_eq!(split_paragraphs("a\n"), vec!["a"]);
        assert_eq!(split_paragraphs("a\n\n"), vec!["a", ""]);
        assert!(split_paragraphs("").is_empty());
    }

    #[test]
    fn test_split_unicode_separators() {
        assert_eq!(split_paragraphs("a\u{2028}b\u{85}c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_wrap_short_paragraph_is_one_line() {
        let lines = wrap_paragraph("Dear   Hiring\tManager,", &helvetica(), 12.0, 468.0);
        assert_eq!(lines, vec!["Dear Hiring Manager,"]);
    }

    #[test]
    fn test_wrap_respects_max_width() {
        let metrics = helvetica();
        let paragraph = "I am writing to express my interest in the Senior Platform Engineer \
                         role. Over the past six years I have built and operated distributed \
                         systems that serve millions of requests per day, and I would love to \
                         bring that experience to your team.";
        let lines = wrap_paragraph(paragraph, &metrics, 12.0, 468.0);
        assert!(lines.len() > 1, "paragraph should wrap, got {lines:?}");
        for line in &lines {
            let width = metrics.string_width(line, 12.0);
            assert!(width <= 468.0, "line {line:?} is {width}pt wide");
        }
        assert_eq!(
            lines.join(" "),
            paragraph.split_whitespace().collect::<Vec<_>>().join(" "),
            "wrapping must not lose or reorder words"
        );
    }

    #[test]
    fn test_wrap_is_idempotent_per_line() {
        let metrics = helvetica();
        let paragraph = "Greedy wrapping should give back exactly the same physical line when \
                         any already wrapped line is fed through the wrapper a second time at \
                         the same width and size.";
        for width in [120.0, 200.0, 468.0] {
            for line in wrap_paragraph(paragraph, &metrics, 12.0, width) {
                assert_eq!(
                    wrap_paragraph(&line, &metrics, 12.0, width),
                    vec![line.clone()],
                    "re-wrapping changed {line:?} at width {width}"
                );
            }
        }
    }

    #[test]
    fn test_oversized_word_gets_its_own_line() {
        let metrics = helvetica();
        let long = "https://example.com/a/very/long/path/that/cannot/possibly/fit/on/one/line";
        let text = format!("see {long} now");
        let lines = wrap_paragraph(&text, &metrics, 12.0, 100.0);
        assert_eq!(lines, vec!["see".to_string(), long.to_string(), "now".to_string()]);
        assert!(metrics.string_width(&lines[1], 12.0) > 100.0);
    }

    #[test]
    fn test_whitespace_only_wraps_to_nothing() {
        assert!(wrap_paragraph("   \t ", &helvetica(), 12.0, 468.0).is_empty());
    }
}
