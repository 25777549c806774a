//! Directory explorer session.
//!
//! Combines the history stack, the listing worker, the directory watch and
//! the per-directory sort order. At most one listing is in flight at a time:
//! while `loading` is set, every action that would start another one is
//! rejected rather than queued.

use crate::async_task::{RequestId, TaskResult};
use crate::error::Result;
use crate::event::{AppEvent, EventSink, FocusView};
use crate::file::{self, FileRecord, RawEntry};
use crate::history::{HistoryStack, NavigationEntry};
use crate::listing::{ListRequest, ListingService, Ticket};
use crate::order::{self, OrderPreference, OrderPreferences, SortKey};
use crate::stores::{Services, MAX_RATING};
use crate::viewer::ViewerRequest;
use crate::watch::{ChangeCallback, DirectoryWatchSync, WatchFactory};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// How the listing is presented, which decides where focus goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplorerView {
    #[default]
    List,
    Grid,
}

impl ExplorerView {
    fn focus_target(self) -> FocusView {
        match self {
            ExplorerView::List => FocusView::ExplorerList,
            ExplorerView::Grid => FocusView::ExplorerGrid,
        }
    }
}

pub struct ExplorerSession {
    loading: bool,
    files: Arc<[FileRecord]>,
    selected_path: Option<PathBuf>,
    query: String,
    directory: Option<PathBuf>,
    history: HistoryStack,
    orders: OrderPreferences,
    view: ExplorerView,
    pending: Option<Ticket>,
    listing: ListingService,
    watch: DirectoryWatchSync,
    services: Services,
    events: EventSink,
}

impl ExplorerSession {
    pub fn new(
        listing: ListingService,
        watch_factory: Box<dyn WatchFactory>,
        services: Services,
        events: EventSink,
    ) -> Self {
        Self {
            loading: false,
            files: Arc::from(Vec::new()),
            selected_path: None,
            query: String::new(),
            directory: None,
            history: HistoryStack::new(),
            orders: OrderPreferences::new(),
            view: ExplorerView::default(),
            pending: None,
            listing,
            watch: DirectoryWatchSync::new(watch_factory),
            services,
            events,
        }
    }

    pub fn with_orders(mut self, orders: OrderPreferences) -> Self {
        self.orders = orders;
        self
    }

    /// Open the starting directory even if it is already the active one
    pub fn initialize(&mut self, directory: PathBuf) -> bool {
        self.change_directory(directory, true)
    }

    pub fn change_directory(&mut self, directory: PathBuf, force: bool) -> bool {
        if self.loading {
            log::debug!("Explorer busy, ignoring change to {}", directory.display());
            return false;
        }
        if !force && self.directory.as_ref() == Some(&directory) {
            return false;
        }

        self.selected_path = None;
        let index = self.history.push(directory);
        self.restore_directory(index)
    }

    pub fn back(&mut self, offset: usize) -> bool {
        if self.loading {
            return false;
        }
        match self.history.back_target(offset) {
            Some(index) => self.restore_directory(index),
            None => false,
        }
    }

    pub fn forward(&mut self, offset: usize) -> bool {
        if self.loading {
            return false;
        }
        match self.history.forward_target(offset) {
            Some(index) => self.restore_directory(index),
            None => false,
        }
    }

    /// Go to the parent of the active directory
    pub fn up_directory(&mut self) -> bool {
        let Some(parent) = self
            .directory
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
        else {
            return false;
        };
        self.change_directory(parent, false)
    }

    /// Enter the selected entry when it is a directory
    pub fn change_selected_directory(&mut self) -> bool {
        match self.selected_file() {
            Some(file) if file.is_directory => {
                let path = file.path.clone();
                self.change_directory(path, false)
            }
            _ => false,
        }
    }

    /// Reload the current history entry
    pub fn reload_directory(&mut self) -> bool {
        match self.history.current_index() {
            Some(index) => self.restore_directory(index),
            None => false,
        }
    }

    pub fn restore_directory(&mut self, index: usize) -> bool {
        if self.loading {
            return false;
        }
        let Some(entry) = self.history.set_current(index) else {
            log::warn!("No history entry at {}", index);
            return false;
        };
        self.directory = Some(entry.directory.clone());
        self.query.clear();
        self.load_files()
    }

    /// Start listing the active directory.
    ///
    /// Re-entrant calls while a listing is in flight are dropped; the next
    /// change notification will trigger a fresh load.
    pub fn load_files(&mut self) -> bool {
        if self.loading {
            log::debug!("Explorer load already in flight, dropping request");
            return false;
        }
        let Some(directory) = self.directory.clone() else {
            return false;
        };
        self.loading = true;

        if let Err(e) = self.install_watch(&directory) {
            log::warn!("Failed to watch {}: {}", directory.display(), e);
        }

        let request = ListRequest::Directory {
            directory: directory.clone(),
            recursive: false,
        };
        match self.listing.submit(request) {
            Ok(ticket) => {
                log::debug!(
                    "Explorer: listing {} as request {}",
                    directory.display(),
                    ticket.id
                );
                self.pending = Some(ticket);
            }
            Err(e) => {
                log::warn!("Explorer listing not started: {}", e);
                self.events.message("Invalid directory");
                self.commit_files(Vec::new());
            }
        }
        true
    }

    fn install_watch(&mut self, directory: &Path) -> Result<()> {
        let events = self.events.clone();
        let watched = directory.to_path_buf();
        let on_change: ChangeCallback =
            Arc::new(move || events.emit(AppEvent::DirectoryChanged(watched.clone())));
        self.watch.set_watch(directory, on_change)
    }

    /// React to a change notification for `directory`
    pub fn handle_directory_changed(&mut self, directory: &Path) -> bool {
        if self.directory.as_deref() != Some(directory) {
            log::debug!("Change in unwatched {} ignored", directory.display());
            return false;
        }
        self.load_files()
    }

    pub fn is_waiting_for(&self, id: RequestId) -> bool {
        self.pending.as_ref().is_some_and(|ticket| ticket.id == id)
    }

    /// Commit a worker result. Returns false if the result is not ours.
    pub fn handle_result(&mut self, result: TaskResult) -> bool {
        if !self.is_waiting_for(result.id()) {
            return false;
        }
        let Some(ticket) = self.pending.take() else {
            return false;
        };

        let still_active = ticket.directory.as_deref() == self.directory.as_deref();
        if !still_active || !ticket.is_live() {
            log::debug!("Explorer: discarding stale result {}", ticket.id);
            self.loading = false;
            return true;
        }

        match result {
            TaskResult::FilesListed { entries, .. } => {
                let files = self.prepare(entries);
                self.commit_files(files);
            }
            TaskResult::Failed { message, .. } => {
                log::warn!("Explorer listing failed: {}", message);
                self.events.message("Invalid directory");
                self.commit_files(Vec::new());
            }
            TaskResult::Cancelled { .. } => {
                self.loading = false;
            }
        }
        true
    }

    /// Keep directories and available files, joining in ratings
    fn prepare(&self, entries: Vec<RawEntry>) -> Vec<FileRecord> {
        entries
            .into_iter()
            .filter(|entry| entry.is_directory || self.services.is_file_available(&entry.path))
            .map(|entry| {
                let rating = self.services.rating(&entry.path);
                FileRecord::from_entry(entry, rating)
            })
            .collect()
    }

    // files, then sort, then focus, then loading cleared
    fn commit_files(&mut self, files: Vec<FileRecord>) {
        self.files = files.into();
        self.sort_files();
        self.focus();
        self.loading = false;
    }

    pub fn sort_files(&mut self) {
        let order = self.order();
        self.files = order::sort_files(&self.files, order).into();
    }

    /// Sort preference of the active directory
    pub fn order(&self) -> OrderPreference {
        self.directory
            .as_deref()
            .map(|directory| self.orders.get(directory))
            .unwrap_or_default()
    }

    pub fn change_order_by(&mut self, key: SortKey) {
        let Some(directory) = self.directory.clone() else {
            return;
        };
        let order = self.order().toggled(key);
        log::debug!("Order for {}: {:?}", directory.display(), order);
        self.orders.set(directory, order);
        self.sort_files();
    }

    /// Files whose name matches the search query, in display order
    pub fn filtered_files(&self) -> Vec<&FileRecord> {
        self.files
            .iter()
            .filter(|file| file.matches_query(&self.query))
            .collect()
    }

    pub fn selected_index(&self) -> Option<usize> {
        let selected = self.selected_path.as_ref()?;
        self.filtered_files()
            .iter()
            .position(|file| &file.path == selected)
    }

    pub fn selected_file(&self) -> Option<&FileRecord> {
        let selected = self.selected_path.as_ref()?;
        self.files.iter().find(|file| &file.path == selected)
    }

    pub fn select(&mut self, path: PathBuf) {
        self.selected_path = Some(path);
    }

    /// Select by position in the filtered view; out of range is ignored
    pub fn select_index(&mut self, index: usize) -> bool {
        let Some(path) = self
            .filtered_files()
            .get(index)
            .map(|file| file.path.clone())
        else {
            return false;
        };
        self.select(path);
        true
    }

    pub fn select_first(&mut self) -> bool {
        self.select_index(0)
    }

    pub fn select_last(&mut self) -> bool {
        match self.filtered_files().len() {
            0 => false,
            len => self.select_index(len - 1),
        }
    }

    pub fn select_previous(&mut self) -> bool {
        match self.selected_index() {
            Some(index) if index > 0 => self.select_index(index - 1),
            _ => false,
        }
    }

    /// Nothing selected counts as "before the first entry"
    pub fn select_next(&mut self) -> bool {
        match self.selected_index() {
            Some(index) => self.select_index(index + 1),
            None => self.select_index(0),
        }
    }

    pub fn search(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Store the file's rating and swap the matching record for `file`
    pub fn update_file(&mut self, file: FileRecord) -> bool {
        let file = FileRecord {
            rating: file.rating.min(MAX_RATING),
            ..file
        };
        if let Ok(mut ratings) = self.services.ratings.lock() {
            ratings.set_rating(&file.path, file.rating);
        }
        let path = file.path.clone();
        match file::replace_by_path(&self.files, &path, file) {
            Some(files) => {
                self.files = files;
                true
            }
            None => false,
        }
    }

    /// Rate the selected entry
    pub fn rate_selected(&mut self, rating: u8) -> bool {
        match self.selected_file() {
            Some(file) => {
                let updated = file.with_rating(rating);
                self.update_file(updated)
            }
            None => false,
        }
    }

    /// Enter directories, hand everything else to the viewer
    pub fn open_file(&mut self, path: PathBuf) -> bool {
        if self.is_directory(&path) {
            self.change_directory(path, false)
        } else {
            self.view_file(path);
            true
        }
    }

    /// Show `path` in the viewer: a directory opens all of its images,
    /// a file opens its siblings starting at that file
    pub fn view_file(&self, path: PathBuf) {
        let request = if self.is_directory(&path) {
            ViewerRequest::directory(path)
        } else {
            ViewerRequest::file(path)
        };
        self.events.emit(AppEvent::ShowViewer(request));
    }

    fn is_directory(&self, path: &Path) -> bool {
        self.files
            .iter()
            .find(|file| file.path == path)
            .map(|file| file.is_directory)
            .unwrap_or_else(|| path.is_dir())
    }

    pub fn is_bookmarked(&self, path: &Path) -> bool {
        self.services
            .bookmarks
            .lock()
            .map(|store| store.is_bookmarked(path))
            .unwrap_or(false)
    }

    pub fn toggle_bookmark(&mut self, path: &Path) {
        if let Ok(mut store) = self.services.bookmarks.lock() {
            store.toggle(path);
        }
    }

    pub fn set_scroll_top(&mut self, scroll_top: f64) {
        self.history.set_scroll_top(scroll_top);
    }

    pub fn scroll_top(&self) -> f64 {
        self.history.scroll_top()
    }

    pub fn set_view(&mut self, view: ExplorerView) {
        self.view = view;
        self.focus();
    }

    pub fn focus(&self) {
        self.events.focus(self.view.focus_target());
    }

    pub fn can_go_back(&self) -> bool {
        self.history.can_go_back()
    }

    pub fn can_go_forward(&self) -> bool {
        self.history.can_go_forward()
    }

    pub fn back_directories(&self) -> Vec<PathBuf> {
        self.history.back_directories()
    }

    pub fn forward_directories(&self) -> Vec<PathBuf> {
        self.history.forward_directories()
    }

    pub fn history_entries(&self) -> Arc<[NavigationEntry]> {
        self.history.entries()
    }

    pub fn history_index(&self) -> Option<usize> {
        self.history.current_index()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn files(&self) -> Arc<[FileRecord]> {
        Arc::clone(&self.files)
    }

    pub fn selected_path(&self) -> Option<&Path> {
        self.selected_path.as_deref()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    pub fn orders(&self) -> &OrderPreferences {
        &self.orders
    }

    pub fn view(&self) -> ExplorerView {
        self.view
    }

    pub fn watched_directory(&self) -> Option<&Path> {
        self.watch.watched_directory()
    }
}
