//! Splitting sermon transcripts into retrievable chunks.
//!
//! Each record is split independently; every chunk carries the record's
//! metadata unchanged.

mod recursive;

pub use recursive::{RecursiveSplitter, DEFAULT_SEPARATORS};

use crate::corpus::Record;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Default maximum characters per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Default characters shared between consecutive chunks of one record.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// A contiguous slice of a sermon transcript with inherited metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Text content of this chunk.
    pub content: String,
    pub title: String,
    pub author: String,
    pub video_id: String,
    /// Sequence id of the record this chunk came from.
    pub sequence_id: usize,
}

/// Split every record into chunks of at most `chunk_size` characters.
pub fn split(records: &[Record], chunk_size: usize, chunk_overlap: usize) -> Result<Vec<Chunk>> {
    let splitter = RecursiveSplitter::new(chunk_size, chunk_overlap)?;
    let chunks = split_with(&splitter, records);
    info!("Split {} records into {} chunks", records.len(), chunks.len());
    Ok(chunks)
}

/// Split records with an existing splitter.
pub fn split_with(splitter: &RecursiveSplitter, records: &[Record]) -> Vec<Chunk> {
    records
        .iter()
        .flat_map(|record| {
            splitter
                .split_text(&record.text)
                .into_iter()
                .map(move |content| Chunk {
                    content,
                    title: record.title.clone(),
                    author: record.author.clone(),
                    video_id: record.video_id.clone(),
                    sequence_id: record.sequence_id,
                })
        })
        .collect()
}
