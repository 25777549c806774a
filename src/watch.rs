//! Filesystem watching for the explorer's active directory.
//!
//! The session owns exactly one [`DirectoryWatchSync`]. Installing a watch on
//! a new directory drops the previous handle before the new one is created,
//! so two directories are never watched at the same time.

use crate::error::Result;
use notify_debouncer_mini::notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, Debouncer};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Invoked on the watcher thread whenever the directory changes
pub type ChangeCallback = Arc<dyn Fn() + Send + Sync>;

/// A live watch. Dropping it releases the underlying watcher.
pub trait WatchHandle: Send {
    fn directory(&self) -> &Path;
}

/// Creates watches; injected so sessions can run without a real watcher
pub trait WatchFactory: Send {
    fn watch(&self, directory: &Path, on_change: ChangeCallback) -> Result<Box<dyn WatchHandle>>;
}

const DEBOUNCE_TIMEOUT: Duration = Duration::from_millis(300);

struct NotifyWatch {
    directory: PathBuf,
    _debouncer: Debouncer<RecommendedWatcher>,
}

impl WatchHandle for NotifyWatch {
    fn directory(&self) -> &Path {
        &self.directory
    }
}

impl Drop for NotifyWatch {
    fn drop(&mut self) {
        log::debug!("👁 watch: released {}", self.directory.display());
    }
}

/// Debounced watcher on the platform's native backend
#[derive(Debug, Default, Clone, Copy)]
pub struct NotifyWatchFactory;

impl WatchFactory for NotifyWatchFactory {
    fn watch(&self, directory: &Path, on_change: ChangeCallback) -> Result<Box<dyn WatchHandle>> {
        let watched = directory.to_path_buf();
        let mut debouncer = new_debouncer(DEBOUNCE_TIMEOUT, move |res: DebounceEventResult| {
            match res {
                Ok(events) if events.is_empty() => {}
                Ok(events) => {
                    log::debug!("👁 watch: {} debounced events", events.len());
                    on_change();
                }
                Err(error) => log::warn!("File watcher error: {}", error),
            }
        })?;

        debouncer
            .watcher()
            .watch(directory, RecursiveMode::NonRecursive)?;
        log::debug!("👁 watch: installed on {}", watched.display());

        Ok(Box::new(NotifyWatch {
            directory: watched,
            _debouncer: debouncer,
        }))
    }
}

struct InertWatch {
    directory: PathBuf,
}

impl WatchHandle for InertWatch {
    fn directory(&self) -> &Path {
        &self.directory
    }
}

/// Hands out handles that never fire, for one-shot runs
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopWatchFactory;

impl WatchFactory for NoopWatchFactory {
    fn watch(&self, directory: &Path, _on_change: ChangeCallback) -> Result<Box<dyn WatchHandle>> {
        Ok(Box::new(InertWatch {
            directory: directory.to_path_buf(),
        }))
    }
}

pub struct DirectoryWatchSync {
    factory: Box<dyn WatchFactory>,
    handle: Option<Box<dyn WatchHandle>>,
}

impl DirectoryWatchSync {
    pub fn new(factory: Box<dyn WatchFactory>) -> Self {
        Self {
            factory,
            handle: None,
        }
    }

    /// Replace the current watch with one on `directory`.
    ///
    /// The old handle is dropped first. If installing the new one fails the
    /// sync is left without a watch.
    pub fn set_watch(&mut self, directory: &Path, on_change: ChangeCallback) -> Result<()> {
        self.release();
        let handle = self.factory.watch(directory, on_change)?;
        self.handle = Some(handle);
        Ok(())
    }

    pub fn release(&mut self) {
        if let Some(previous) = self.handle.take() {
            drop(previous);
        }
    }

    pub fn watched_directory(&self) -> Option<&Path> {
        self.handle.as_ref().map(|handle| handle.directory())
    }
}
