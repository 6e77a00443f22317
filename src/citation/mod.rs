//! Source attribution for retrieved sermon chunks.
//!
//! Turns a raw transcript chunk into a citation a listener can follow:
//! title, author, a playback offset and a link that jumps to it.

pub mod content;
pub mod timestamp;

pub use content::{clean_preview, format_display, format_seconds};
pub use timestamp::{build_link, extract_timestamp};

use crate::chunking::Chunk;
use serde::{Deserialize, Serialize};

/// Default length of a citation's content preview.
pub const DEFAULT_PREVIEW_CHARS: usize = 200;

const UNKNOWN_TITLE: &str = "Unknown Title";
const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// User-facing attribution derived from one retrieved chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub title: String,
    pub author: String,
    pub video_id: String,
    /// Playback offset in seconds.
    pub timestamp_seconds: u64,
    /// Offset formatted as `M:SS` or `H:MM:SS`.
    pub timestamp_display: String,
    /// Watch link starting at the offset; empty without a video id.
    pub deep_link: String,
    pub content_preview: String,
}

impl SourceInfo {
    /// Derive a citation from a chunk.
    pub fn from_chunk(chunk: &Chunk, preview_chars: usize) -> Self {
        let timestamp = extract_timestamp(&chunk.content);

        Self {
            title: or_unknown(&chunk.title, UNKNOWN_TITLE),
            author: or_unknown(&chunk.author, UNKNOWN_AUTHOR),
            video_id: chunk.video_id.clone(),
            timestamp_seconds: timestamp.parse().unwrap_or(0),
            timestamp_display: format_display(&timestamp),
            deep_link: build_link(&chunk.video_id, &timestamp),
            content_preview: clean_preview(&chunk.content, preview_chars),
        }
    }
}

fn or_unknown(value: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(content: &str, video_id: &str) -> Chunk {
        Chunk {
            content: content.to_string(),
            title: "The Narrow Way".to_string(),
            author: "Zac Poonen".to_string(),
            video_id: video_id.to_string(),
            sequence_id: 3,
        }
    }

    #[test]
    fn test_source_from_chunk() {
        let source = SourceInfo::from_chunk(
            &chunk("1000s we must deny 1003s ourselves daily", "abc123"),
            200,
        );

        assert_eq!(source.title, "The Narrow Way");
        assert_eq!(source.timestamp_seconds, 1000);
        assert_eq!(source.timestamp_display, "16:40");
        assert_eq!(source.deep_link, "https://www.youtube.com/watch?v=abc123&t=1000s");
        assert_eq!(source.content_preview, "we must deny ourselves daily");
    }

    #[test]
    fn test_source_without_video_or_timestamp() {
        let mut c = chunk("plain words without offsets", "");
        c.title = String::new();
        let source = SourceInfo::from_chunk(&c, 200);

        assert_eq!(source.title, UNKNOWN_TITLE);
        assert_eq!(source.timestamp_seconds, 0);
        assert_eq!(source.timestamp_display, "0:00");
        assert!(source.deep_link.is_empty());
    }

    #[test]
    fn test_source_serializes_snake_case_fields() {
        let source = SourceInfo::from_chunk(&chunk("At 2:30 he talks about faith", "v1"), 200);
        let json = serde_json::to_value(&source).unwrap();
        assert_eq!(json["timestamp_seconds"], 150);
        assert_eq!(json["timestamp_display"], "2:30");
        assert_eq!(json["deep_link"], "https://www.youtube.com/watch?v=v1&t=150s");
    }
}
