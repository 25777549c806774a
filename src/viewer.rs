//! Image viewer session: an ordered file set, a current file with wrapping
//! traversal, and stepped zoom.

use crate::async_task::{RequestId, TaskResult};
use crate::event::{AppEvent, EventSink, FocusView};
use crate::file::{self, FileRecord, RawEntry};
use crate::listing::{ListRequest, ListingService, Ticket};
use crate::stores::Services;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Zoom steps, ascending
pub const SCALES: [f64; 17] = [
    0.25, 0.33, 0.5, 0.67, 0.75, 0.8, 0.9, 1.0, 1.1, 1.25, 1.5, 1.75, 2.0, 2.5, 3.0, 4.0, 5.0,
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewerError {
    #[error("No image found")]
    NoViewableFile,
    #[error("Invalid image: {0}")]
    InvalidImage(String),
}

/// What to open. When several selectors are set, directory wins over path,
/// and path wins over paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewerRequest {
    pub directory: Option<PathBuf>,
    pub path: Option<PathBuf>,
    pub paths: Option<Vec<PathBuf>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerSource {
    Directory(PathBuf),
    File(PathBuf),
    Paths(Vec<PathBuf>),
}

impl ViewerRequest {
    pub fn directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: Some(directory.into()),
            ..Self::default()
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn paths(paths: Vec<PathBuf>) -> Self {
        Self {
            paths: Some(paths),
            ..Self::default()
        }
    }

    pub fn source(self) -> Option<ViewerSource> {
        if let Some(directory) = self.directory {
            Some(ViewerSource::Directory(directory))
        } else if let Some(path) = self.path {
            Some(ViewerSource::File(path))
        } else {
            self.paths.map(ViewerSource::Paths)
        }
    }
}

#[derive(Debug)]
struct PendingLoad {
    ticket: Ticket,
    /// File to show once the listing arrives
    current_path: Option<PathBuf>,
}

pub struct ViewerSession {
    loading: bool,
    error: Option<ViewerError>,
    files: Arc<[FileRecord]>,
    current_path: Option<PathBuf>,
    baseline_scale: f64,
    scale: f64,
    scaling: bool,
    pending: Option<PendingLoad>,
    listing: ListingService,
    services: Services,
    events: EventSink,
}

impl ViewerSession {
    pub fn new(listing: ListingService, services: Services, events: EventSink) -> Self {
        Self {
            loading: false,
            error: None,
            files: Arc::from(Vec::new()),
            current_path: None,
            baseline_scale: 1.0,
            scale: 1.0,
            scaling: false,
            pending: None,
            listing,
            services,
            events,
        }
    }

    /// Start resolving a new file set. Any earlier load still in flight is
    /// cancelled. Returns false when the request names nothing to open.
    pub fn load(&mut self, request: ViewerRequest) -> bool {
        let Some(source) = request.source() else {
            log::debug!("Viewer load without a selector ignored");
            return false;
        };

        if let Some(previous) = self.pending.take() {
            log::debug!("Viewer: cancelling request {}", previous.ticket.id);
            previous.ticket.cancel();
        }

        self.loading = true;
        self.error = None;
        self.files = Arc::from(Vec::new());
        self.current_path = None;
        self.events.focus(FocusView::Viewer);

        let (list_request, current_path) = match source {
            ViewerSource::Directory(directory) => {
                let recursive = self
                    .services
                    .settings
                    .read()
                    .map(|settings| settings.recursive)
                    .unwrap_or(false);
                (
                    ListRequest::Directory {
                        directory,
                        recursive,
                    },
                    None,
                )
            }
            ViewerSource::File(path) => match (path.parent(), path.file_name()) {
                (Some(parent), Some(name)) => {
                    // A bare file name lives in the working directory
                    let parent = if parent.as_os_str().is_empty() {
                        PathBuf::from(".")
                    } else {
                        parent.to_path_buf()
                    };
                    let current = parent.join(name);
                    (
                        ListRequest::Directory {
                            directory: parent,
                            recursive: false,
                        },
                        Some(current),
                    )
                }
                _ => {
                    self.fail(ViewerError::InvalidImage(format!(
                        "{} has no parent directory",
                        path.display()
                    )));
                    return true;
                }
            },
            ViewerSource::Paths(paths) => (ListRequest::Paths(paths), None),
        };

        match self.listing.submit(list_request) {
            Ok(ticket) => {
                self.pending = Some(PendingLoad {
                    ticket,
                    current_path,
                });
            }
            Err(e) => self.fail(ViewerError::InvalidImage(e.to_string())),
        }
        true
    }

    /// Whether `id` is the request this session is waiting for
    pub fn is_waiting_for(&self, id: RequestId) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| pending.ticket.id == id)
    }

    /// Commit a worker result. Returns false if the result is not ours.
    pub fn handle_result(&mut self, result: TaskResult) -> bool {
        if !self.is_waiting_for(result.id()) {
            return false;
        }
        let Some(pending) = self.pending.take() else {
            return false;
        };

        if !pending.ticket.is_live() {
            log::debug!("Viewer: dropping cancelled result {}", pending.ticket.id);
            self.loading = false;
            return true;
        }

        match result {
            TaskResult::FilesListed { entries, .. } => {
                self.commit(entries, pending.current_path);
            }
            TaskResult::Failed { message, .. } => {
                log::warn!("Viewer listing failed: {}", message);
                self.fail(ViewerError::InvalidImage(message));
            }
            TaskResult::Cancelled { .. } => {
                self.loading = false;
            }
        }
        true
    }

    fn commit(&mut self, entries: Vec<RawEntry>, requested: Option<PathBuf>) {
        let files: Vec<FileRecord> = entries
            .into_iter()
            .filter(|entry| !entry.is_directory && self.services.is_file_available(&entry.path))
            .map(|entry| {
                let rating = self.services.rating(&entry.path);
                FileRecord::from_entry(entry, rating)
            })
            .collect();

        if files.is_empty() {
            self.fail(ViewerError::NoViewableFile);
            return;
        }

        let current = requested
            .filter(|path| files.iter().any(|file| &file.path == path))
            .unwrap_or_else(|| files[0].path.clone());

        log::debug!("Viewer: {} files, showing {}", files.len(), current.display());
        self.error = None;
        self.files = files.into();
        self.current_path = Some(current);
        self.loading = false;
    }

    fn fail(&mut self, error: ViewerError) {
        log::debug!("Viewer: {}", error);
        self.error = Some(error);
        self.files = Arc::from(Vec::new());
        self.current_path = None;
        self.loading = false;
    }

    pub fn current_index(&self) -> Option<usize> {
        let current = self.current_path.as_ref()?;
        self.files.iter().position(|file| &file.path == current)
    }

    pub fn current_file(&self) -> Option<&FileRecord> {
        self.current_index().map(|index| &self.files[index])
    }

    /// Swap in an updated record, matched by path. Returns false if the file
    /// is not part of the current set.
    pub fn update_file(&mut self, file: FileRecord) -> bool {
        let path = file.path.clone();
        match file::replace_by_path(&self.files, &path, file) {
            Some(files) => {
                self.files = files;
                true
            }
            None => false,
        }
    }

    /// Show the file at `index`; out of range is ignored
    pub fn move_to(&mut self, index: usize) {
        if let Some(file) = self.files.get(index) {
            self.current_path = Some(file.path.clone());
        }
    }

    pub fn move_next(&mut self) {
        if self.files.is_empty() {
            return;
        }
        let index = match self.current_index() {
            Some(i) if i + 1 < self.files.len() => i + 1,
            _ => 0,
        };
        self.move_to(index);
    }

    pub fn move_previous(&mut self) {
        if self.files.is_empty() {
            return;
        }
        let index = match self.current_index() {
            Some(i) if i > 0 => i - 1,
            _ => self.files.len() - 1,
        };
        self.move_to(index);
    }

    /// Record the fit scale computed for the image on display
    pub fn setup_zoom(&mut self, scale: f64) {
        self.baseline_scale = scale;
        self.scale = scale;
        self.scaling = false;
    }

    pub fn zoom_in(&mut self) {
        self.scale = SCALES
            .iter()
            .copied()
            .find(|&step| step > self.scale)
            .unwrap_or(self.scale);
        self.scaling = true;
    }

    pub fn zoom_out(&mut self) {
        self.scale = SCALES
            .iter()
            .rev()
            .copied()
            .find(|&step| step < self.scale)
            .unwrap_or(self.scale);
        self.scaling = true;
    }

    pub fn reset_zoom(&mut self) {
        self.scale = self.baseline_scale;
        self.scaling = false;
    }

    /// Ask the shell to leave the viewer
    pub fn dismiss(&self) {
        self.events.emit(AppEvent::DismissViewer);
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&ViewerError> {
        self.error.as_ref()
    }

    pub fn files(&self) -> Arc<[FileRecord]> {
        Arc::clone(&self.files)
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn baseline_scale(&self) -> f64 {
        self.baseline_scale
    }

    pub fn is_scaling(&self) -> bool {
        self.scaling
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use tokio::sync::mpsc;

    fn session() -> (ViewerSession, mpsc::Receiver<crate::async_task::Task>) {
        let (task_sender, task_receiver) = mpsc::channel(8);
        let (events, _) = EventSink::channel();
        let session =
            ViewerSession::new(ListingService::new(task_sender), Services::in_memory(), events);
        (session, task_receiver)
    }

    fn entry(path: &str) -> RawEntry {
        let path = PathBuf::from(path);
        RawEntry {
            name: path.file_name().unwrap().to_string_lossy().to_string(),
            path,
            is_directory: false,
            modified_at: Local::now(),
        }
    }

    fn loaded(paths: &[&str]) -> ViewerSession {
        let (mut session, _receiver) = session();
        session.load(ViewerRequest::directory("/pics"));
        let id = session.pending.as_ref().unwrap().ticket.id;
        let entries = paths.iter().map(|p| entry(p)).collect();
        assert!(session.handle_result(TaskResult::FilesListed { id, entries }));
        session
    }

    #[test]
    fn test_request_priority() {
        let request = ViewerRequest {
            directory: Some(PathBuf::from("/d")),
            path: Some(PathBuf::from("/d/a.png")),
            paths: Some(vec![]),
        };
        assert_eq!(request.source(), Some(ViewerSource::Directory(PathBuf::from("/d"))));

        let request = ViewerRequest {
            directory: None,
            path: Some(PathBuf::from("/d/a.png")),
            paths: Some(vec![]),
        };
        assert_eq!(request.source(), Some(ViewerSource::File(PathBuf::from("/d/a.png"))));
        assert_eq!(ViewerRequest::default().source(), None);
    }

    #[test]
    fn test_move_next_wraps() {
        let mut session = loaded(&["/pics/a.png", "/pics/b.png", "/pics/c.png"]);
        assert_eq!(session.current_index(), Some(0));
        session.move_next();
        session.move_next();
        assert_eq!(session.current_index(), Some(2));
        session.move_next();
        assert_eq!(session.current_index(), Some(0));
    }

    #[test]
    fn test_move_previous_wraps() {
        let mut session = loaded(&["/pics/a.png", "/pics/b.png"]);
        session.move_previous();
        assert_eq!(session.current_path(), Some(Path::new("/pics/b.png")));
    }

    #[test]
    fn test_traversal_on_empty_set_is_noop() {
        let (mut session, _receiver) = session();
        session.move_next();
        session.move_previous();
        assert_eq!(session.current_path(), None);
    }

    #[test]
    fn test_unavailable_files_are_filtered() {
        let session = loaded(&["/pics/a.png", "/pics/notes.txt"]);
        assert_eq!(session.files().len(), 1);
    }

    #[test]
    fn test_zoom_in_converges_to_maximum() {
        let (mut session, _receiver) = session();
        session.setup_zoom(1.0);
        for _ in 0..50 {
            session.zoom_in();
        }
        assert_eq!(session.scale(), 5.0);
        session.zoom_in();
        assert_eq!(session.scale(), 5.0);
        assert!(session.is_scaling());
    }

    #[test]
    fn test_zoom_out_converges_to_minimum() {
        let (mut session, _receiver) = session();
        session.setup_zoom(1.0);
        session.zoom_out();
        assert_eq!(session.scale(), 0.9);
        for _ in 0..50 {
            session.zoom_out();
        }
        assert_eq!(session.scale(), 0.25);
    }

    #[test]
    fn test_zoom_from_off_table_baseline() {
        let (mut session, _receiver) = session();
        session.setup_zoom(0.42);
        assert!(!session.is_scaling());
        session.zoom_in();
        assert_eq!(session.scale(), 0.5);
        session.zoom_out();
        assert_eq!(session.scale(), 0.33);
        session.reset_zoom();
        assert_eq!(session.scale(), 0.42);
        assert_eq!(session.baseline_scale(), 0.42);
        assert!(!session.is_scaling());
    }

    #[test]
    fn test_empty_listing_is_no_viewable_file() {
        let session = loaded(&["/pics/notes.txt"]);
        assert_eq!(session.error(), Some(&ViewerError::NoViewableFile));
        assert!(!session.is_loading());
        assert_eq!(session.current_index(), None);
    }

    #[test]
    fn test_file_mode_lists_parent_and_starts_at_file() {
        let (mut session, mut receiver) = session();
        assert!(session.load(ViewerRequest::file("/pics/b.png")));
        let id = match receiver.try_recv().unwrap() {
            crate::async_task::Task::ListFiles {
                id,
                directory,
                recursive,
                ..
            } => {
                assert_eq!(directory, PathBuf::from("/pics"));
                assert!(!recursive);
                id
            }
            other => panic!("unexpected task {:?}", other),
        };
        let entries = vec![entry("/pics/a.png"), entry("/pics/b.png")];
        assert!(session.handle_result(TaskResult::FilesListed { id, entries }));
        assert_eq!(session.current_index(), Some(1));
    }

    #[test]
    fn test_bare_file_name_lists_working_directory() {
        let (mut session, mut receiver) = session();
        assert!(session.load(ViewerRequest::file("x.png")));
        let id = match receiver.try_recv().unwrap() {
            crate::async_task::Task::ListFiles { id, directory, .. } => {
                assert_eq!(directory, PathBuf::from("."));
                id
            }
            other => panic!("unexpected task {:?}", other),
        };
        let entries = vec![entry("./a.png"), entry("./x.png")];
        assert!(session.handle_result(TaskResult::FilesListed { id, entries }));
        assert_eq!(session.error(), None);
        assert_eq!(session.current_path(), Some(Path::new("./x.png")));
    }

    #[test]
    fn test_update_file_refreshes_displayed_record() {
        let mut session = loaded(&["/pics/a.png", "/pics/b.png"]);
        session.move_next();
        let rated = session.current_file().unwrap().with_rating(4);

        assert!(session.update_file(rated));
        assert_eq!(session.current_file().map(|f| f.rating), Some(4));
        assert_eq!(session.files()[0].rating, 0);

        let outsider = FileRecord::from_entry(entry("/elsewhere/c.png"), 2);
        assert!(!session.update_file(outsider));
        assert_eq!(session.files().len(), 2);
    }

    #[test]
    fn test_failed_listing_is_invalid_image() {
        let (mut session, _receiver) = session();
        session.load(ViewerRequest::directory("/missing"));
        let id = session.pending.as_ref().unwrap().ticket.id;
        assert!(session.handle_result(TaskResult::Failed {
            id,
            message: "Invalid directory: /missing".to_string(),
        }));
        assert!(matches!(session.error(), Some(ViewerError::InvalidImage(_))));
        assert!(session.files().is_empty());
    }

    #[test]
    fn test_new_load_cancels_previous() {
        let (mut session, mut receiver) = session();
        session.load(ViewerRequest::directory("/one"));
        let first = session.pending.as_ref().unwrap().ticket.clone();
        session.load(ViewerRequest::directory("/two"));

        assert!(!first.is_live());
        assert!(!session.handle_result(TaskResult::FilesListed {
            id: first.id,
            entries: vec![entry("/one/a.png")],
        }));
        assert!(session.is_loading());
        assert!(receiver.try_recv().is_ok());
    }
}
