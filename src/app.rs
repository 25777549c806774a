use crate::async_task::{self, Task, TaskResult};
use crate::command::Command;
use crate::config::{PersistedState, Settings};
use crate::error::{ExplorerError, Result};
use crate::event::{AppEvent, EventReceiver, EventSink, FocusView};
use crate::explorer::{ExplorerSession, ExplorerView};
use crate::file::FileRecord;
use crate::listing::ListingService;
use crate::order::OrderPreference;
use crate::stores::{MemoryBookmarkStore, MemoryRatingStore, QueryHistory, Services, MAX_RATING};
use crate::viewer::ViewerSession;
use crate::watch::WatchFactory;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

const CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Screen {
    Explorer,
    Viewer,
}

/// Both sessions plus the plumbing between them and the worker
pub struct App {
    pub explorer: ExplorerSession,
    pub viewer: ViewerSession,
    pub services: Services,
    pub query_history: QueryHistory,
    pub screen: Screen,
    pub focus: Option<FocusView>,
    pub should_quit: bool,
    pub status_message: String,

    result_receiver: mpsc::Receiver<TaskResult>,
    event_receiver: EventReceiver,
    worker: JoinHandle<()>,
}

impl App {
    /// Build the app from persisted state and start the listing worker.
    ///
    /// Must be called from within a tokio runtime. When the state names a
    /// directory, the explorer starts loading it right away.
    pub fn from_persisted(state: &PersistedState, watch_factory: Box<dyn WatchFactory>) -> Self {
        let (task_sender, task_receiver) = mpsc::channel::<Task>(CHANNEL_CAPACITY);
        let (result_sender, result_receiver) = mpsc::channel::<TaskResult>(CHANNEL_CAPACITY);
        let worker = tokio::spawn(async_task::run_worker(task_receiver, result_sender));

        let services = Services::new(
            state.settings(),
            MemoryRatingStore::new(state.ratings.clone()),
            MemoryBookmarkStore::new(state.bookmarks.clone()),
        );
        let (events, event_receiver) = EventSink::channel();
        let listing = ListingService::new(task_sender);

        let explorer = ExplorerSession::new(
            listing.clone(),
            watch_factory,
            services.clone(),
            events.clone(),
        )
        .with_orders(state.orders.clone());
        let viewer = ViewerSession::new(listing, services.clone(), events);

        let mut app = Self {
            explorer,
            viewer,
            services,
            query_history: QueryHistory::new(state.query_history.clone()),
            screen: Screen::Explorer,
            focus: None,
            should_quit: false,
            status_message: "Ready".to_string(),
            result_receiver,
            event_receiver,
            worker,
        };

        if let Some(directory) = state.directory.clone() {
            log::info!("Opening {}", directory.display());
            app.explorer.initialize(directory);
        }
        app
    }

    pub fn to_persisted(&self) -> PersistedState {
        let settings = self
            .services
            .settings
            .read()
            .map(|settings| settings.clone())
            .unwrap_or_else(|_| Settings::default());
        let ratings = self
            .services
            .ratings
            .lock()
            .map(|store| store.all_ratings())
            .unwrap_or_default();
        let bookmarks = self
            .services
            .bookmarks
            .lock()
            .map(|store| store.all_bookmarks())
            .unwrap_or_default();

        PersistedState {
            directory: self.explorer.directory().map(PathBuf::from),
            orders: self.explorer.orders().clone(),
            bookmarks,
            ratings,
            recursive: settings.recursive,
            extensions: settings.extensions,
            query_history: self.query_history.queries().to_vec(),
        }
    }

    /// Hand a worker result to whichever session is waiting for it
    pub fn handle_task_result(&mut self, result: TaskResult) {
        let id = result.id();
        let claimed = if self.explorer.is_waiting_for(id) {
            self.explorer.handle_result(result)
        } else if self.viewer.is_waiting_for(id) {
            self.viewer.handle_result(result)
        } else {
            false
        };
        if !claimed {
            log::debug!("📨 app: dropping stale result {}", id);
        }
    }

    /// Process every queued session event
    pub fn drain_events(&mut self) {
        while let Ok(event) = self.event_receiver.try_recv() {
            self.handle_event(event);
        }
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        log::debug!("📨 app: {:?}", event);
        match event {
            // Focus moves keyboard input only; the screen follows ShowViewer and DismissViewer
            AppEvent::Focus(view) => self.focus = Some(view),
            AppEvent::ShowViewer(request) => {
                self.screen = Screen::Viewer;
                self.viewer.load(request);
            }
            AppEvent::DismissViewer => {
                self.screen = Screen::Explorer;
                self.explorer.focus();
            }
            AppEvent::DirectoryChanged(directory) => {
                self.explorer.handle_directory_changed(&directory);
            }
            AppEvent::Message(text) => {
                self.status_message = text;
            }
        }
    }

    pub fn is_busy(&self) -> bool {
        self.explorer.is_loading() || self.viewer.is_loading()
    }

    /// Apply one command. Sequences run their steps back to back without
    /// waiting for listings in between; use [`App::run_command`] for that.
    pub fn execute(&mut self, command: Command) {
        log::debug!("⌨ app: {}", command);
        match command {
            Command::Quit => {
                self.should_quit = true;
                self.status_message = "Goodbye!".to_string();
            }

            Command::ChangeDirectory(directory) => {
                self.explorer.change_directory(directory, false);
            }
            Command::Back(offset) => {
                self.explorer.back(offset);
            }
            Command::Forward(offset) => {
                self.explorer.forward(offset);
            }
            Command::UpDirectory => {
                self.explorer.up_directory();
            }
            Command::Reload => {
                self.explorer.reload_directory();
            }
            Command::EnterSelected => {
                self.explorer.change_selected_directory();
            }
            Command::OpenSelected => match self.explorer.selected_path().map(PathBuf::from) {
                Some(path) => {
                    self.explorer.open_file(path);
                }
                None => self.status_message = "Nothing selected".to_string(),
            },
            Command::ViewSelected => match self.explorer.selected_path().map(PathBuf::from) {
                Some(path) => self.explorer.view_file(path),
                None => self.status_message = "Nothing selected".to_string(),
            },

            Command::Search(query) => {
                self.query_history.add(&query);
                self.explorer.search(query);
            }
            Command::SortBy(key) => self.explorer.change_order_by(key),
            Command::SelectFirst => {
                self.explorer.select_first();
            }
            Command::SelectLast => {
                self.explorer.select_last();
            }
            Command::SelectNext => {
                self.explorer.select_next();
            }
            Command::SelectPrevious => {
                self.explorer.select_previous();
            }
            Command::SelectIndex(index) => {
                if !self.explorer.select_index(index) {
                    self.status_message = format!("No entry at {}", index);
                }
            }
            Command::Rate(rating) => self.rate(rating),
            Command::ToggleBookmark => match self.explorer.directory().map(PathBuf::from) {
                Some(directory) => {
                    self.explorer.toggle_bookmark(&directory);
                    self.status_message = if self.explorer.is_bookmarked(&directory) {
                        format!("Bookmarked {}", directory.display())
                    } else {
                        format!("Removed bookmark {}", directory.display())
                    };
                }
                None => self.status_message = "No directory open".to_string(),
            },
            Command::Scroll(scroll_top) => self.explorer.set_scroll_top(scroll_top),
            Command::GridView => self.explorer.set_view(ExplorerView::Grid),
            Command::ListView => self.explorer.set_view(ExplorerView::List),

            Command::ViewerNext => self.viewer.move_next(),
            Command::ViewerPrevious => self.viewer.move_previous(),
            Command::ZoomIn => self.viewer.zoom_in(),
            Command::ZoomOut => self.viewer.zoom_out(),
            Command::ZoomReset => self.viewer.reset_zoom(),
            Command::Zoom(scale) => self.viewer.setup_zoom(scale),
            Command::Dismiss => self.viewer.dismiss(),

            Command::Sequence(commands) => {
                for command in commands {
                    self.execute(command);
                }
            }
        }
        self.drain_events();
    }

    /// Rate the file on display in the viewer, or the explorer selection
    fn rate(&mut self, rating: u8) {
        let rating = rating.min(MAX_RATING);
        let target = match self.screen {
            Screen::Viewer => self.viewer.current_file().map(|file| file.with_rating(rating)),
            Screen::Explorer => self
                .explorer
                .selected_file()
                .map(|file| file.with_rating(rating)),
        };
        match target {
            Some(file) => {
                self.status_message = format!("Rated {} with {}", file.name, file.rating);
                self.viewer.update_file(file.clone());
                self.explorer.update_file(file);
            }
            None => self.status_message = "Nothing to rate".to_string(),
        }
    }

    /// Execute a command, settling after every step of a sequence
    pub async fn run_command(&mut self, command: Command, max_settle: Duration) -> Result<()> {
        for step in flatten(command) {
            self.execute(step);
            self.settle(max_settle).await?;
        }
        Ok(())
    }

    /// Wait until neither session has a listing in flight.
    ///
    /// Results and events are processed as they arrive. Fails if the
    /// sessions are still loading once `max_settle` has elapsed.
    pub async fn settle(&mut self, max_settle: Duration) -> Result<()> {
        let start = Instant::now();
        self.drain_events();

        while self.is_busy() && start.elapsed() < max_settle {
            if let Ok(result) = timeout(Duration::from_millis(10), self.result_receiver.recv()).await
            {
                match result {
                    Some(result) => self.handle_task_result(result),
                    None => break, // worker gone
                }
            }
            self.drain_events();
        }

        while let Ok(result) = self.result_receiver.try_recv() {
            self.handle_task_result(result);
        }
        self.drain_events();

        if self.is_busy() {
            return Err(ExplorerError::Worker(
                "Settlement timeout: still loading".to_string(),
            ));
        }
        Ok(())
    }

    /// Wait for the next worker result or session event and process it.
    /// Returns false once both channels are closed.
    pub async fn process_next(&mut self) -> bool {
        tokio::select! {
            result = self.result_receiver.recv() => match result {
                Some(result) => {
                    self.handle_task_result(result);
                    self.drain_events();
                    true
                }
                None => false,
            },
            event = self.event_receiver.recv() => match event {
                Some(event) => {
                    self.handle_event(event);
                    self.drain_events();
                    true
                }
                None => false,
            },
        }
    }

    pub fn snapshot(&self) -> AppSnapshot {
        let files = self.explorer.files();
        let history = self.explorer.history_entries();
        AppSnapshot {
            screen: self.screen,
            focus: self.focus,
            status_message: self.status_message.clone(),
            should_quit: self.should_quit,
            explorer: ExplorerSnapshot {
                directory: self.explorer.directory().map(PathBuf::from),
                loading: self.explorer.is_loading(),
                query: self.explorer.query().to_string(),
                order: self.explorer.order(),
                view: self.explorer.view(),
                files: self
                    .explorer
                    .filtered_files()
                    .into_iter()
                    .cloned()
                    .collect(),
                total_files: files.len(),
                selected: self.explorer.selected_path().map(PathBuf::from),
                selected_index: self.explorer.selected_index(),
                history: history.iter().map(|entry| entry.directory.clone()).collect(),
                history_index: self.explorer.history_index(),
                scroll_top: self.explorer.scroll_top(),
                can_go_back: self.explorer.can_go_back(),
                can_go_forward: self.explorer.can_go_forward(),
            },
            viewer: ViewerSnapshot {
                loading: self.viewer.is_loading(),
                error: self.viewer.error().map(|e| e.to_string()),
                current: self.viewer.current_path().map(PathBuf::from),
                current_index: self.viewer.current_index(),
                file_count: self.viewer.files().len(),
                scale: self.viewer.scale(),
                baseline_scale: self.viewer.baseline_scale(),
                scaling: self.viewer.is_scaling(),
            },
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

fn flatten(command: Command) -> Vec<Command> {
    match command {
        Command::Sequence(commands) => commands.into_iter().flat_map(flatten).collect(),
        other => vec![other],
    }
}

/// Serializable view of the app, printed by the `execute` subcommand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSnapshot {
    pub screen: Screen,
    pub focus: Option<FocusView>,
    pub status_message: String,
    pub should_quit: bool,
    pub explorer: ExplorerSnapshot,
    pub viewer: ViewerSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorerSnapshot {
    pub directory: Option<PathBuf>,
    pub loading: bool,
    pub query: String,
    pub order: OrderPreference,
    pub view: ExplorerView,
    /// Entries matching the query, in display order
    pub files: Vec<FileRecord>,
    pub total_files: usize,
    pub selected: Option<PathBuf>,
    pub selected_index: Option<usize>,
    pub history: Vec<PathBuf>,
    pub history_index: Option<usize>,
    pub scroll_top: f64,
    pub can_go_back: bool,
    pub can_go_forward: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerSnapshot {
    pub loading: bool,
    pub error: Option<String>,
    pub current: Option<PathBuf>,
    pub current_index: Option<usize>,
    pub file_count: usize,
    pub scale: f64,
    pub baseline_scale: f64,
    pub scaling: bool,
}
