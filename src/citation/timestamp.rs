//! Timestamp extraction and video deep links.
//!
//! Transcripts carry inline offsets like "598s". A citation points at the
//! first offset found near the start of the chunk.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Only the head of a chunk is searched for an offset.
const SEARCH_WINDOW_CHARS: usize = 100;

const WATCH_URL: &str = "https://www.youtube.com/watch";

static BARE_SECONDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+)s").expect("seconds regex is valid"));

static MINUTES_SECONDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+):([0-9]+)").expect("minutes regex is valid"));

// Every group is optional, so this matches (possibly empty) at the first position.
static HOURS_MINUTES_SECONDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:([0-9]+)h\s*)?(?:([0-9]+)m\s*)?(?:([0-9]+)s)?").expect("hms regex is valid")
});

static LEADING_CLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{1,2}):([0-9]{2})").expect("clock regex is valid"));

/// Extract the playback offset, in seconds, referenced near the start of `content`.
///
/// Rules are tried in order and the first hit wins:
/// 1. `<N>s` not followed by a word character
/// 2. `<M>:<S>`
/// 3. `<H>h <M>m <S>s` with any subset present, when the total is above zero
/// 4. `<MM>:<SS>` at the very start
///
/// Returns `"0"` when nothing matches.
pub fn extract_timestamp(content: &str) -> String {
    let window = content
        .chars()
        .take(SEARCH_WINDOW_CHARS)
        .collect::<String>()
        .to_lowercase();

    if let Some(seconds) = bare_seconds(&window) {
        return seconds.to_string();
    }

    if let Some(caps) = MINUTES_SECONDS.captures(&window) {
        return clock_seconds(&caps).to_string();
    }

    if let Some(caps) = HOURS_MINUTES_SECONDS.captures(&window) {
        let group = |i: usize| caps.get(i).map(|m| parse_digits(m.as_str()));
        if (1..=3).any(|i| caps.get(i).is_some()) {
            let total = group(1)
                .unwrap_or(0)
                .saturating_mul(3600)
                .saturating_add(group(2).unwrap_or(0).saturating_mul(60))
                .saturating_add(group(3).unwrap_or(0));
            if total > 0 {
                return total.to_string();
            }
        }
    }

    if let Some(caps) = LEADING_CLOCK.captures(&window) {
        return clock_seconds(&caps).to_string();
    }

    "0".to_string()
}

/// First `<digits>s` whose `s` is not followed by a word character.
fn bare_seconds(window: &str) -> Option<&str> {
    BARE_SECONDS.captures_iter(window).find_map(|caps| {
        let whole = caps.get(0)?;
        let followed_by_word = window[whole.end()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric() || c == '_');
        if followed_by_word {
            None
        } else {
            caps.get(1).map(|m| m.as_str())
        }
    })
}

fn clock_seconds(caps: &Captures<'_>) -> u64 {
    let minutes = caps.get(1).map(|m| parse_digits(m.as_str())).unwrap_or(0);
    let seconds = caps.get(2).map(|m| parse_digits(m.as_str())).unwrap_or(0);
    minutes.saturating_mul(60).saturating_add(seconds)
}

fn parse_digits(digits: &str) -> u64 {
    digits
        .chars()
        .filter_map(|c| c.to_digit(10))
        .fold(0u64, |acc, d| acc.saturating_mul(10).saturating_add(u64::from(d)))
}

/// Build a watch link that starts playback at `timestamp` seconds.
///
/// Returns an empty string without a video id. A timestamp that is not a
/// non-negative integer is treated as zero.
pub fn build_link(video_id: &str, timestamp: &str) -> String {
    if video_id.is_empty() {
        return String::new();
    }

    let seconds = timestamp.trim().parse::<u64>().unwrap_or(0);
    format!("{}?v={}&t={}s", WATCH_URL, video_id, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bare_seconds() {
        assert_eq!(extract_timestamp("598s into your heart"), "598");
        assert_eq!(extract_timestamp("and then 45s later"), "45");
        assert_eq!(extract_timestamp("ends with 12s"), "12");
    }

    #[test]
    fn test_bare_seconds_skips_word_continuations() {
        // "5seconds" is not a marker; the later "30s" is.
        assert_eq!(extract_timestamp("5seconds passed then 30s more"), "30");
        assert_eq!(extract_timestamp("12s3s"), "3");
    }

    #[test]
    fn test_extract_minutes_seconds() {
        assert_eq!(extract_timestamp("At 2:30 he talks about faith"), "150");
        assert_eq!(extract_timestamp("Around 10:45 the sermon turns"), "645");
    }

    #[test]
    fn test_extract_hours_minutes_at_start() {
        assert_eq!(extract_timestamp("1h 30m the message continues"), "5400");
        assert_eq!(extract_timestamp("2m the message continues"), "120");
        assert_eq!(extract_timestamp("1h 5sx odd"), "3605");
    }

    #[test]
    fn test_hours_minutes_only_counts_at_first_position() {
        // The empty-match tolerant rule is evaluated where it first matches: the start.
        assert_eq!(extract_timestamp("he spoke for 1h about love"), "0");
    }

    #[test]
    fn test_zero_total_is_rejected() {
        assert_eq!(extract_timestamp("0m and nothing else"), "0");
    }

    #[test]
    fn test_non_ascii_digits_are_not_offsets() {
        assert_eq!(extract_timestamp("at ٤٥s he said"), "0");
        assert_eq!(extract_timestamp("at ٤٥s then 30s"), "30");
        assert_eq!(extract_timestamp("١:٣٠ grace"), "0");
    }

    #[test]
    fn test_no_timestamp() {
        assert_eq!(extract_timestamp("Blessed are the poor in spirit"), "0");
        assert_eq!(extract_timestamp(""), "0");
    }

    #[test]
    fn test_only_first_hundred_chars_are_searched() {
        let content = format!("{} 45s", "a".repeat(100));
        assert_eq!(extract_timestamp(&content), "0");

        let content = format!("{} 45s", "a".repeat(90));
        assert_eq!(extract_timestamp(&content), "45");
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(extract_timestamp("598S Into your heart"), "598");
        assert_eq!(extract_timestamp("1H 2M intro"), "3720");
    }

    #[test]
    fn test_extract_is_deterministic() {
        let content = "He said 12s that God 1:05 is faithful";
        let first = extract_timestamp(content);
        for _ in 0..5 {
            assert_eq!(extract_timestamp(content), first);
        }
        let embedded = format!("The offset is {}s here", first);
        assert_eq!(extract_timestamp(&embedded), extract_timestamp(&embedded));
    }

    #[test]
    fn test_build_link() {
        assert_eq!(
            build_link("dQw4w9WgXcQ", "45"),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=45s"
        );
    }

    #[test]
    fn test_build_link_without_video() {
        assert_eq!(build_link("", "45"), "");
        assert_eq!(build_link("", "invalid"), "");
    }

    #[test]
    fn test_build_link_invalid_timestamp() {
        assert_eq!(build_link("abc123", "invalid"), build_link("abc123", "0"));
        assert_eq!(build_link("abc123", "-10"), "https://www.youtube.com/watch?v=abc123&t=0s");
    }
}
