//! Client side of the listing worker.
//!
//! Requests go out tagged with a fresh [`RequestId`] and a cancellation
//! token. The caller keeps the returned [`Ticket`] and later matches the
//! worker's [`TaskResult`](crate::async_task::TaskResult) against it.

use crate::async_task::{RequestId, Task};
use crate::error::{ExplorerError, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListRequest {
    Directory { directory: PathBuf, recursive: bool },
    Paths(Vec<PathBuf>),
}

/// An outstanding request
#[derive(Debug, Clone)]
pub struct Ticket {
    pub id: RequestId,
    /// Directory being listed, `None` for explicit path sets
    pub directory: Option<PathBuf>,
    pub cancellation_token: CancellationToken,
}

impl Ticket {
    pub fn cancel(&self) {
        self.cancellation_token.cancel();
    }

    pub fn is_live(&self) -> bool {
        !self.cancellation_token.is_cancelled()
    }
}

#[derive(Debug, Clone)]
pub struct ListingService {
    task_sender: mpsc::Sender<Task>,
    next_id: Arc<AtomicU64>,
}

impl ListingService {
    pub fn new(task_sender: mpsc::Sender<Task>) -> Self {
        Self {
            task_sender,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn submit(&self, request: ListRequest) -> Result<Ticket> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancellation_token = CancellationToken::new();

        let (task, directory) = match request {
            ListRequest::Directory {
                directory,
                recursive,
            } => (
                Task::ListFiles {
                    id,
                    directory: directory.clone(),
                    recursive,
                    cancellation_token: cancellation_token.clone(),
                },
                Some(directory),
            ),
            ListRequest::Paths(paths) => (
                Task::GetFiles {
                    id,
                    paths,
                    cancellation_token: cancellation_token.clone(),
                },
                None,
            ),
        };

        self.task_sender.try_send(task).map_err(|e| {
            ExplorerError::Worker(format!("Failed to submit listing request {}: {}", id, e))
        })?;
        log::debug!("📤 listing: submitted request {} for {:?}", id, directory);

        Ok(Ticket {
            id,
            directory,
            cancellation_token,
        })
    }
}
