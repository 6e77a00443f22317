//! Content normalization for previews and time displays.

use regex::Regex;
use std::sync::LazyLock;

/// Appended to previews that were cut short.
pub const ELLIPSIS: &str = "...";

/// Inline transcript markers such as "598s".
static TIMESTAMP_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[0-9]+s\b").expect("timestamp marker regex is valid"));

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));

/// Clean a chunk for display: drop timestamp markers, collapse whitespace and
/// truncate to `max_length` characters on a word boundary.
///
/// The returned string, ellipsis included, is never longer than `max_length`
/// characters (unless `max_length` is smaller than the ellipsis itself).
pub fn clean_preview(content: &str, max_length: usize) -> String {
    truncate_on_word(&strip_markers(content), max_length)
}

fn strip_markers(text: &str) -> String {
    let without_markers = TIMESTAMP_MARKER.replace_all(text, "");
    WHITESPACE_RUN
        .replace_all(&without_markers, " ")
        .trim()
        .to_string()
}

fn truncate_on_word(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }

    if max_length <= ELLIPSIS.len() {
        let head: String = text.chars().take(max_length).collect();
        return strip_markers(&head);
    }

    let budget = max_length - ELLIPSIS.len();
    let cut = text
        .char_indices()
        .nth(budget)
        .map(|(i, _)| i)
        .unwrap_or(text.len());

    let head = &text[..cut];
    let kept = if text[cut..].starts_with(' ') {
        head
    } else {
        // A single token longer than the budget has no boundary to fall back on.
        head.rfind(' ').map(|pos| &head[..pos]).unwrap_or(head)
    };

    // Cutting inside a token like "12seconds" can leave a fresh marker behind.
    format!("{}{}", strip_markers(kept), ELLIPSIS)
}

/// Format a seconds value (integer or integer-like string) for display.
///
/// Produces `H:MM:SS` from one hour upward and `M:SS` below; anything that
/// does not parse as a non-negative integer shows as `0:00`.
pub fn format_display(timestamp_seconds: &str) -> String {
    match timestamp_seconds.trim().parse::<u64>() {
        Ok(seconds) => format_seconds(seconds),
        Err(_) => "0:00".to_string(),
    }
}

/// Format a number of seconds as `H:MM:SS` or `M:SS`.
pub fn format_seconds(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_preview_removes_markers() {
        let content = "into your 598s heart but a disciple is much more than 601s that";
        assert_eq!(
            clean_preview(content, 200),
            "into your heart but a disciple is much more than that"
        );
    }

    #[test]
    fn test_clean_preview_collapses_whitespace() {
        let content = "  first\n\nsecond\t third   ";
        assert_eq!(clean_preview(content, 200), "first second third");
    }

    #[test]
    fn test_clean_preview_keeps_words_with_trailing_s() {
        // Only standalone number+s tokens are markers.
        assert_eq!(clean_preview("verse abc5s stays", 200), "verse abc5s stays");
        assert_eq!(clean_preview("12s3s stays", 200), "12s3s stays");
        assert_eq!(clean_preview("10seconds stays", 200), "10seconds stays");
    }

    #[test]
    fn test_clean_preview_truncates_on_word_boundary() {
        let content = "the grace of God is sufficient for every need we face";
        let preview = clean_preview(content, 20);

        assert!(preview.ends_with(ELLIPSIS));
        assert!(preview.chars().count() <= 20);
        assert_eq!(preview, "the grace of God...");

        let body = preview.trim_end_matches(ELLIPSIS);
        for word in body.split(' ') {
            assert!(content.split(' ').any(|w| w == word), "split inside word: {}", word);
        }
    }

    #[test]
    fn test_clean_preview_cut_at_exact_word_end() {
        // Budget of 9 lands right before a space, so "hello abc" stays whole.
        assert_eq!(clean_preview("hello abc defgh", 12), "hello abc...");
    }

    #[test]
    fn test_clean_preview_length_bound_over_many_inputs() {
        let content = "Jesus 12s said to them 45s come and follow me and I will make you fishers of men";
        for max_length in 4..content.len() {
            let preview = clean_preview(content, max_length);
            assert!(
                preview.chars().count() <= max_length,
                "max_length {} gave {:?}",
                max_length,
                preview
            );
            assert!(!preview.contains("  "));
            assert!(!TIMESTAMP_MARKER.is_match(&preview));
        }
    }

    #[test]
    fn test_clean_preview_cut_never_leaves_marker() {
        assert_eq!(clean_preview("12seconds", 6), "...");
        assert_eq!(clean_preview("12seconds", 3), "");
        assert_eq!(clean_preview("amen 45seconds later", 11), "amen...");

        for max_length in 1..20 {
            let preview = clean_preview("word 12seconds more 7sabbath", max_length);
            assert!(!TIMESTAMP_MARKER.is_match(&preview), "{:?}", preview);
        }
    }

    #[test]
    fn test_clean_preview_only_ascii_digit_markers() {
        assert_eq!(clean_preview("at ٤٥s he said", 200), "at ٤٥s he said");
    }

    #[test]
    fn test_clean_preview_multibyte() {
        let content = "ñandú café señor corazón bendición";
        let preview = clean_preview(content, 15);
        assert!(preview.chars().count() <= 15);
        assert!(preview.ends_with(ELLIPSIS));
    }

    #[test]
    fn test_format_display() {
        assert_eq!(format_display("0"), "0:00");
        assert_eq!(format_display("65"), "1:05");
        assert_eq!(format_display("150"), "2:30");
        assert_eq!(format_display("3661"), "1:01:01");
        assert_eq!(format_display("1000"), "16:40");
        assert_eq!(format_display("abc"), "0:00");
        assert_eq!(format_display(""), "0:00");
        assert_eq!(format_display("-5"), "0:00");
    }
}
