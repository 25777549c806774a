use crate::error::{ExplorerError, Result};
use crate::file::RawEntry;
use chrono::{DateTime, Local};
use ignore::WalkBuilder;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Correlates a worker request with its response
pub type RequestId = u64;

#[derive(Debug, Clone)]
pub enum Task {
    ListFiles {
        id: RequestId,
        directory: PathBuf,
        recursive: bool,
        cancellation_token: CancellationToken,
    },
    GetFiles {
        id: RequestId,
        paths: Vec<PathBuf>,
        cancellation_token: CancellationToken,
    },
}

impl Task {
    pub fn id(&self) -> RequestId {
        match self {
            Task::ListFiles { id, .. } | Task::GetFiles { id, .. } => *id,
        }
    }

    fn cancellation_token(&self) -> &CancellationToken {
        match self {
            Task::ListFiles {
                cancellation_token, ..
            }
            | Task::GetFiles {
                cancellation_token, ..
            } => cancellation_token,
        }
    }
}

#[derive(Debug, Clone)]
pub enum TaskResult {
    FilesListed { id: RequestId, entries: Vec<RawEntry> },
    Failed { id: RequestId, message: String },
    Cancelled { id: RequestId },
}

impl TaskResult {
    pub fn id(&self) -> RequestId {
        match self {
            TaskResult::FilesListed { id, .. }
            | TaskResult::Failed { id, .. }
            | TaskResult::Cancelled { id } => *id,
        }
    }
}

pub async fn run_worker(
    mut task_receiver: mpsc::Receiver<Task>,
    result_sender: mpsc::Sender<TaskResult>,
) {
    while let Some(task) = task_receiver.recv().await {
        let id = task.id();
        let token = task.cancellation_token().clone();

        let result = if token.is_cancelled() {
            log::debug!("🔧 worker: request {} cancelled before start", id);
            TaskResult::Cancelled { id }
        } else {
            let work = async {
                match task {
                    Task::ListFiles {
                        directory,
                        recursive,
                        ..
                    } => list_files(directory, recursive).await,
                    Task::GetFiles { paths, .. } => get_files(paths).await,
                }
            };
            tokio::select! {
                _ = token.cancelled() => TaskResult::Cancelled { id },
                outcome = work => match outcome {
                    Ok(entries) => TaskResult::FilesListed { id, entries },
                    Err(e) => TaskResult::Failed { id, message: e.to_string() },
                },
            }
        };

        if result_sender.send(result).await.is_err() {
            // Receiver is gone, nobody is waiting for listings any more
            break;
        }
    }
    log::debug!("🔧 worker: task channel closed, exiting");
}

pub async fn list_files(directory: PathBuf, recursive: bool) -> Result<Vec<RawEntry>> {
    tokio::task::spawn_blocking(move || list_directory(&directory, recursive)).await?
}

pub async fn get_files(paths: Vec<PathBuf>) -> Result<Vec<RawEntry>> {
    Ok(tokio::task::spawn_blocking(move || stat_paths(&paths)).await?)
}

/// Enumerate `directory`, skipping hidden entries.
///
/// The directory itself is not part of the result. Entries come back sorted
/// by path.
pub fn list_directory(directory: &Path, recursive: bool) -> Result<Vec<RawEntry>> {
    let is_dir = fs::metadata(directory)
        .map(|metadata| metadata.is_dir())
        .unwrap_or(false);
    if !is_dir {
        return Err(ExplorerError::InvalidDirectory(directory.to_path_buf()));
    }

    let start = std::time::Instant::now();
    let mut builder = WalkBuilder::new(directory);
    builder
        .standard_filters(false)
        .hidden(true)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b));
    if !recursive {
        builder.max_depth(Some(1));
    }

    let mut entries = Vec::new();
    for result in builder.build() {
        match result {
            Ok(entry) if entry.depth() == 0 => {}
            Ok(entry) => match raw_entry(entry.path()) {
                Ok(raw) => entries.push(raw),
                Err(e) => log::debug!("Skipping {}: {}", entry.path().display(), e),
            },
            Err(e) => log::warn!("Walk error under {}: {}", directory.display(), e),
        }
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));

    log::debug!(
        "Listed {} entries in {} in {:?}",
        entries.len(),
        directory.display(),
        start.elapsed()
    );
    Ok(entries)
}

/// Stat each explicit path; unreadable ones are dropped
pub fn stat_paths(paths: &[PathBuf]) -> Vec<RawEntry> {
    paths
        .iter()
        .filter_map(|path| match raw_entry(path) {
            Ok(raw) => Some(raw),
            Err(e) => {
                log::warn!("Cannot read {}: {}", path.display(), e);
                None
            }
        })
        .collect()
}

fn raw_entry(path: &Path) -> std::io::Result<RawEntry> {
    let metadata = fs::metadata(path)?;
    let modified_at = metadata
        .modified()
        .map(DateTime::<Local>::from)
        .unwrap_or_else(|_| Local::now());
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string());

    Ok(RawEntry {
        path: path.to_path_buf(),
        name,
        is_directory: metadata.is_dir(),
        modified_at,
    })
}
