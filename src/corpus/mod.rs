//! Sermon corpus ingestion.
//!
//! Loads the tabular transcript dataset, cleans each transcript and assigns
//! stable sequence ids.

use crate::error::{PrekenError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info, instrument};

/// Transcripts often open with a caption for the intro music.
const LEADING_MUSIC: &str = "music ";

/// Caption markers like "12s music " left inside transcripts.
static MUSIC_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[0-9]+s\s+music\s+").expect("music marker regex is valid"));

/// One sermon transcript before splitting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Full cleaned transcript text.
    pub text: String,
    pub title: String,
    pub author: String,
    pub video_id: String,
    /// Position of this record after filtering.
    pub sequence_id: usize,
}

/// A dataset row as stored on disk. Extra columns are ignored.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default)]
    sermon: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    video_id: Option<String>,
}

/// On-disk dataset layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Csv,
    Json,
}

impl DatasetFormat {
    /// Pick the format from the file extension, defaulting to CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DatasetFormat::Json,
            _ => DatasetFormat::Csv,
        }
    }
}

/// Load and clean every usable record from the dataset at `path`.
///
/// A missing file is a configuration error.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_records(path: &Path) -> Result<Vec<Record>> {
    if !path.exists() {
        return Err(PrekenError::Config(format!(
            "Dataset not found at {}",
            path.display()
        )));
    }

    let file = std::fs::File::open(path)?;
    let records = read_records(file, DatasetFormat::from_path(path))?;
    info!("Dataset loaded: {} sermons", records.len());
    Ok(records)
}

/// Parse and clean records from any reader.
pub fn read_records<R: Read>(reader: R, format: DatasetFormat) -> Result<Vec<Record>> {
    let raw = match format {
        DatasetFormat::Csv => {
            let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
            csv_reader
                .deserialize::<RawRecord>()
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
        DatasetFormat::Json => serde_json::from_reader::<_, Vec<RawRecord>>(reader)?,
    };

    let total = raw.len();
    let records: Vec<Record> = raw
        .into_iter()
        .filter_map(|row| {
            let text = clean_text(row.sermon.as_deref()?);
            if text.trim().is_empty() {
                return None;
            }
            Some((text, row))
        })
        .enumerate()
        .map(|(sequence_id, (text, row))| Record {
            text,
            title: row.title.unwrap_or_default(),
            author: row.author.unwrap_or_default(),
            video_id: row.video_id.unwrap_or_default().trim().to_string(),
            sequence_id,
        })
        .collect();

    if records.len() < total {
        debug!("Dropped {} rows without transcript text", total - records.len());
    }

    Ok(records)
}

/// Remove caption noise from a transcript.
pub fn clean_text(text: &str) -> String {
    let text = match text.get(..LEADING_MUSIC.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(LEADING_MUSIC) => &text[LEADING_MUSIC.len()..],
        _ => text,
    };

    MUSIC_MARKER.replace_all(text, "").into_owned()
}
