//! SQLite snapshot of an in-memory index.
//!
//! The snapshot is a single database file inside the index directory. It is
//! written to a temporary file and renamed into place, so a reader never
//! sees a half-written index.

use super::{IndexedChunk, SnapshotManifest};
use crate::chunking::Chunk;
use crate::error::{PrekenError, Result};
use rusqlite::{params, Connection, OpenFlags};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// File name of the snapshot inside the index directory.
pub const SNAPSHOT_FILE: &str = "index.sqlite";

const MANIFEST_KEY: &str = "manifest";

const SCHEMA: &str = r#"
    CREATE TABLE chunks (
        position INTEGER PRIMARY KEY,
        content TEXT NOT NULL,
        title TEXT NOT NULL,
        author TEXT NOT NULL,
        video_id TEXT NOT NULL,
        sequence_id INTEGER NOT NULL,
        embedding BLOB NOT NULL
    );

    CREATE TABLE meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
"#;

/// Reads and writes index snapshots.
pub struct SqliteSnapshot;

impl SqliteSnapshot {
    /// Path of the snapshot file for an index directory.
    pub fn file_path(dir: &Path) -> PathBuf {
        dir.join(SNAPSHOT_FILE)
    }

    /// Write every entry and the manifest into `dir`, replacing any earlier snapshot.
    #[instrument(skip(entries, manifest), fields(count = entries.len()))]
    pub fn write(dir: &Path, entries: &[IndexedChunk], manifest: &SnapshotManifest) -> Result<()> {
        std::fs::create_dir_all(dir)?;

        let target = Self::file_path(dir);
        let staging = dir.join(format!("{}.tmp", SNAPSHOT_FILE));
        if staging.exists() {
            std::fs::remove_file(&staging)?;
        }

        {
            let mut conn = Connection::open(&staging)?;
            conn.execute_batch(SCHEMA)?;

            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    r#"
                    INSERT INTO chunks
                    (position, content, title, author, video_id, sequence_id, embedding)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                    "#,
                )?;

                for (position, entry) in entries.iter().enumerate() {
                    stmt.execute(params![
                        position as i64,
                        entry.chunk.content,
                        entry.chunk.title,
                        entry.chunk.author,
                        entry.chunk.video_id,
                        entry.chunk.sequence_id as i64,
                        embedding_to_bytes(&entry.embedding),
                    ])?;
                }
            }

            tx.execute(
                "INSERT INTO meta (key, value) VALUES (?1, ?2)",
                params![MANIFEST_KEY, serde_json::to_string(manifest)?],
            )?;
            tx.commit()?;
        }

        std::fs::rename(&staging, &target)?;
        info!("Saved {} chunks to {:?}", entries.len(), target);
        Ok(())
    }

    /// Read a snapshot back. Any failure is reported as an index load error.
    #[instrument]
    pub fn read(dir: &Path) -> Result<(SnapshotManifest, Vec<IndexedChunk>)> {
        let path = Self::file_path(dir);
        if !path.exists() {
            return Err(PrekenError::IndexLoad(format!(
                "No index snapshot at {:?}",
                path
            )));
        }

        Self::read_file(&path).map_err(|e| match e {
            PrekenError::IndexLoad(_) => e,
            other => PrekenError::IndexLoad(format!("Failed to read {:?}: {}", path, other)),
        })
    }

    fn read_file(path: &Path) -> Result<(SnapshotManifest, Vec<IndexedChunk>)> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;

        let manifest_json: String = conn.query_row(
            "SELECT value FROM meta WHERE key = ?1",
            params![MANIFEST_KEY],
            |row| row.get(0),
        )?;
        let manifest: SnapshotManifest = serde_json::from_str(&manifest_json)?;

        let mut stmt = conn.prepare(
            r#"
            SELECT content, title, author, video_id, sequence_id, embedding
            FROM chunks
            ORDER BY position
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let sequence_id: i64 = row.get(4)?;
            let embedding_bytes: Vec<u8> = row.get(5)?;
            Ok((
                Chunk {
                    content: row.get(0)?,
                    title: row.get(1)?,
                    author: row.get(2)?,
                    video_id: row.get(3)?,
                    sequence_id: usize::try_from(sequence_id).unwrap_or_default(),
                },
                embedding_bytes,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (chunk, bytes) = row?;
            let embedding = bytes_to_embedding(&bytes)?;
            if embedding.len() != manifest.dimensions {
                return Err(PrekenError::IndexLoad(format!(
                    "Stored embedding has {} dimensions, manifest says {}",
                    embedding.len(),
                    manifest.dimensions
                )));
            }
            entries.push(IndexedChunk::new(chunk, embedding));
        }

        if entries.len() != manifest.chunk_count {
            return Err(PrekenError::IndexLoad(format!(
                "Snapshot holds {} chunks, manifest says {}",
                entries.len(),
                manifest.chunk_count
            )));
        }

        debug!("Read {} chunks from {:?}", entries.len(), path);
        Ok((manifest, entries))
    }
}

/// Serialize embedding to bytes.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Deserialize embedding from bytes.
fn bytes_to_embedding(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(PrekenError::IndexLoad(format!(
            "Embedding blob of {} bytes is not a float array",
            bytes.len()
        )));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}
