//! Persisted reading progress.
//!
//! A single-slot store: one TOML file holding the most recent book's
//! position, overwritten on every save. Reads never fail upward; a missing
//! or corrupt record is simply "no saved state".

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

const PROGRESS_FILE: &str = "progress.toml";

/// Where the store and config live by default (`~/.espritz`).
pub fn default_dir() -> PathBuf {
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".espritz")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Identifier of the book source (the path it was opened from).
    pub source: String,
    pub title: String,
    pub chapter: usize,
    /// Words already consumed within `chapter`.
    pub word_offset: usize,
    pub wpm: u32,
}

#[derive(Error, Debug)]
enum PersistenceError {
    #[error("could not serialize progress record: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    /// Open the store rooted at `dir`. Nothing is touched on disk until the
    /// first save.
    pub fn at(dir: &Path) -> Self {
        Self {
            path: dir.join(PROGRESS_FILE),
        }
    }

    /// Read the saved record, if a usable one exists. A record without a
    /// title or source is treated as absent rather than matched against.
    pub fn load(&self) -> Option<ProgressRecord> {
        let data = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) => {
                debug!(path = %self.path.display(), "No saved progress: {err}");
                return None;
            }
        };
        let record: ProgressRecord = match toml::from_str(&data) {
            Ok(record) => record,
            Err(err) => {
                warn!(path = %self.path.display(), "Saved progress invalid, ignoring: {err}");
                return None;
            }
        };
        if record.title.is_empty() || record.source.is_empty() {
            debug!("Saved progress has no title or source, treating as absent");
            return None;
        }
        debug!(
            title = %record.title,
            chapter = record.chapter,
            word_offset = record.word_offset,
            "Loaded saved progress"
        );
        Some(record)
    }

    /// Overwrite the slot with `record`. Failures are logged and swallowed;
    /// losing a save never interrupts playback.
    pub fn save(&self, record: &ProgressRecord) {
        if let Err(err) = self.write_record(record) {
            warn!("Failed to persist progress: {err}");
        } else {
            debug!(
                title = %record.title,
                chapter = record.chapter,
                word_offset = record.word_offset,
                "Saved progress"
            );
        }
    }

    // Written to a sibling temp file and renamed so the record lands as a
    // single unit.
    fn write_record(&self, record: &ProgressRecord) -> Result<(), PersistenceError> {
        let contents = toml::to_string(record)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| PersistenceError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let tmp = self.path.with_extension("toml.tmp");
        fs::write(&tmp, contents).map_err(|source| PersistenceError::Write {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| PersistenceError::Write {
            path: self.path.clone(),
            source,
        })?;
        Ok(())
    }
}
