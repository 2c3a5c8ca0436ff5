//! Link detection: finds email addresses and web addresses in one line of
//! text so the renderer can draw them as clickable runs.
//!
//! Two pattern families run in a fixed order. Emails are matched first and
//! every byte they cover is claimed; a URL match that touches a claimed byte
//! is dropped. This keeps the domain half of `jane@example.com` from turning
//! into a second link.

use std::ops::Range;
use std::sync::LazyLock;

use regex::{Match, Regex};

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w.+-]+@[\w.-]+\.\w+").unwrap());

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:https?://)?(?:www\.)?[\w.-]+\.(?:com|ca|org)\b(?:/[\w./-]*)?").unwrap()
});

/// A substring of a line bound to a click target.
///
/// `start`/`end` are byte offsets into the line (half-open, always on char
/// boundaries), so `&line[span.start..span.end] == span.display_text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSpan {
    pub start: usize,
    pub end: usize,
    pub display_text: String,
    pub target_uri: String,
}

/// Returns the link spans in `line`, non-overlapping and sorted by `start`.
pub fn detect(line: &str) -> Vec<LinkSpan> {
    let mut spans = Vec::new();
    let mut claimed: Vec<Range<usize>> = Vec::new();

    for m in EMAIL_PATTERN.find_iter(line) {
        claimed.push(m.range());
        spans.push(LinkSpan {
            start: m.start(),
            end: m.end(),
            display_text: m.as_str().to_string(),
            target_uri: format!("mailto:{}", m.as_str()),
        });
    }

    for m in url_matches(line) {
        let range = m.range();
        if claimed
            .iter()
            .any(|c| c.start < range.end && range.start < c.end)
        {
            continue;
        }
        spans.push(LinkSpan {
            start: m.start(),
            end: m.end(),
            display_text: m.as_str().to_string(),
            target_uri: url_target(m.as_str()),
        });
    }

    spans.sort_by_key(|s| s.start);
    spans
}

/// URL matches that are not immediately preceded by `@`.
///
/// The regex engine has no look-behind, so a candidate starting right after
/// `@` is rejected and the scan resumes one character later, which is what a
/// `(?<!@)` assertion would do.
fn url_matches(line: &str) -> Vec<Match<'_>> {
    let mut found = Vec::new();
    let mut pos = 0;

    while pos <= line.len() {
        let Some(m) = URL_PATTERN.find_at(line, pos) else {
            break;
        };
        if line[..m.start()].ends_with('@') {
            let step = line[m.start()..].chars().next().map_or(1, char::len_utf8);
            pos = m.start() + step;
            continue;
        }
        pos = m.end();
        found.push(m);
    }
    found
}

/// Click target for a URL match. The visible text never gains a scheme.
fn url_target(text: &str) -> String {
    if text.starts_with("http://") || text.starts_with("https://") {
        text.to_string()
    } else {
        format!("https://{text}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uris(line: &str) -> Vec<String> {
        detect(line).into_iter().map(|s| s.target_uri).collect()
    }

    #[test]
    fn test_email_then_url_in_order() {
        let line = "Contact me at a@b.com or visit b.com/x";
        let spans = detect(line);
        assert_eq!(spans.len(), 2, "got {spans:?}");

        assert_eq!(spans[0].display_text, "a@b.com");
        assert_eq!(spans[0].target_uri, "mailto:a@b.com");
        assert_eq!(&line[spans[0].start..spans[0].end], "a@b.com");

        assert_eq!(spans[1].display_text, "b.com/x");
        assert_eq!(spans[1].target_uri, "https://b.com/x");
        assert_eq!(&line[spans[1].start..spans[1].end], "b.com/x");
    }

    #[test]
    fn test_bare_email_yields_no_url_span() {
        let spans = detect("a@b.com");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].target_uri, "mailto:a@b.com");
        assert_eq!((spans[0].start, spans[0].end), (0, 7));
    }

    #[test]
    fn test_empty_line_has_no_spans() {
        assert!(detect("").is_empty());
        assert!(detect("Sincerely,").is_empty());
    }

    #[test]
    fn test_scheme_is_kept_when_present() {
        assert_eq!(
            uris("See https://github.com/jane and http://example.org"),
            vec!["https://github.com/jane", "http://example.org"]
        );
    }

    #[test]
    fn test_www_prefix_and_ca_domain() {
        let spans = detect("Portfolio: www.janedoe.ca/work");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].display_text, "www.janedoe.ca/work");
        assert_eq!(spans[0].target_uri, "https://www.janedoe.ca/work");
    }

    #[test]
    fn test_unlisted_tld_is_not_a_link() {
        assert!(detect("I studied at example.edu and example.io").is_empty());
    }

    #[test]
    fn test_email_with_plus_and_subdomain() {
        let spans = detect("Reach me: jane.doe+jobs@mail.example.com.");
        assert_eq!(spans.len(), 1, "got {spans:?}");
        assert_eq!(spans[0].display_text, "jane.doe+jobs@mail.example.com");
    }

    #[test]
    fn test_counts_add_up_and_spans_are_sorted() {
        let line = "x.com a@b.org y.ca c@d.com linkedin.com/in/jane e@f.ca";
        let spans = detect(line);
        let emails = spans.iter().filter(|s| s.target_uri.starts_with("mailto:")).count();
        assert_eq!(emails, 3);
        assert_eq!(spans.len(), 6, "3 emails + 3 urls, got {spans:?}");
        for pair in spans.windows(2) {
            assert!(pair[0].end <= pair[1].start, "overlap or disorder: {pair:?}");
        }
    }

    #[test]
    fn test_offsets_are_byte_offsets_on_char_boundaries() {
        let line = "Café · jane@example.com";
        let spans = detect(line);
        assert_eq!(spans.len(), 1);
        assert_eq!(&line[spans[0].start..spans[0].end], "jane@example.com");
    }

    #[test]
    fn test_no_zero_width_spans() {
        for line in ["@", ".com", "a@.com", "http://", "www."] {
            assert!(detect(line).iter().all(|s| s.start < s.end), "line {line:?}");
        }
    }
}
