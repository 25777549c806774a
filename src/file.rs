use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// An entry as reported by the listing worker, before rating is joined in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEntry {
    pub path: PathBuf,
    pub name: String,
    pub is_directory: bool,
    pub modified_at: DateTime<Local>,
}

/// A listed file or directory as shown by the explorer and viewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: PathBuf,
    pub name: String,
    pub is_directory: bool,
    pub modified_at: DateTime<Local>,
    pub rating: u8,
}

impl FileRecord {
    pub fn from_entry(entry: RawEntry, rating: u8) -> Self {
        Self {
            path: entry.path,
            name: entry.name,
            is_directory: entry.is_directory,
            modified_at: entry.modified_at,
            rating,
        }
    }

    pub fn with_rating(&self, rating: u8) -> Self {
        Self {
            rating,
            ..self.clone()
        }
    }

    /// Case-insensitive substring match against the file name
    pub fn matches_query(&self, query: &str) -> bool {
        query.is_empty() || self.name.to_lowercase().contains(&query.to_lowercase())
    }
}

/// Build a new snapshot with the record at `path` replaced by `file`.
///
/// The previous snapshot is left untouched, so anyone still holding it keeps
/// a consistent view. Returns `None` when no record matches.
pub fn replace_by_path(
    files: &Arc<[FileRecord]>,
    path: &Path,
    file: FileRecord,
) -> Option<Arc<[FileRecord]>> {
    let index = files.iter().position(|current| current.path == path)?;
    let mut next = files.to_vec();
    next[index] = file;
    Some(next.into())
}
