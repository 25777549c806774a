use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExplorerError>;

#[derive(Debug, Error)]
pub enum ExplorerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid directory: {}", .0.display())]
    InvalidDirectory(PathBuf),

    #[error("Watch error: {0}")]
    Watch(#[from] notify_debouncer_mini::notify::Error),

    #[error("Worker error: {0}")]
    Worker(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Command error: {0}")]
    Command(String),
}

impl From<String> for ExplorerError {
    fn from(error: String) -> Self {
        ExplorerError::Worker(error)
    }
}

impl From<tokio::task::JoinError> for ExplorerError {
    fn from(error: tokio::task::JoinError) -> Self {
        ExplorerError::Worker(error.to_string())
    }
}
