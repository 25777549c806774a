//! Signals the sessions emit for the shell around them.

use crate::viewer::ViewerRequest;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Which view should receive keyboard focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FocusView {
    ExplorerList,
    ExplorerGrid,
    Viewer,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    Focus(FocusView),
    ShowViewer(ViewerRequest),
    DismissViewer,
    /// The watched directory reported a change
    DirectoryChanged(PathBuf),
    Message(String),
}

pub type EventSender = mpsc::UnboundedSender<AppEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<AppEvent>;

/// Cloneable sending half shared by the sessions and the watch callback
#[derive(Debug, Clone)]
pub struct EventSink {
    sender: EventSender,
}

impl EventSink {
    pub fn new(sender: EventSender) -> Self {
        Self { sender }
    }

    pub fn channel() -> (Self, EventReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }

    pub fn emit(&self, event: AppEvent) {
        if self.sender.send(event).is_err() {
            log::debug!("Event receiver dropped, signal discarded");
        }
    }

    pub fn focus(&self, view: FocusView) {
        self.emit(AppEvent::Focus(view));
    }

    pub fn message(&self, text: impl Into<String>) {
        self.emit(AppEvent::Message(text.into()));
    }
}
