//! Back/forward directory history, browser style.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationEntry {
    pub directory: PathBuf,
    pub scroll_top: f64,
}

/// Visited directories with a cursor.
///
/// `entries` is replaced wholesale on every mutation, so a snapshot handed
/// out by [`HistoryStack::entries`] never changes underneath its holder.
#[derive(Debug, Clone)]
pub struct HistoryStack {
    entries: Arc<[NavigationEntry]>,
    current: Option<usize>,
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStack {
    pub fn new() -> Self {
        Self {
            entries: Arc::from(Vec::new()),
            current: None,
        }
    }

    /// Append `directory` after the current entry, discarding forward history
    pub fn push(&mut self, directory: PathBuf) -> usize {
        let index = self.current.map_or(0, |i| i + 1);
        let mut entries: Vec<NavigationEntry> = self.entries[..index].to_vec();
        entries.push(NavigationEntry {
            directory,
            scroll_top: 0.0,
        });
        self.entries = entries.into();
        self.current = Some(index);
        index
    }

    pub fn can_go_back(&self) -> bool {
        self.current.is_some_and(|i| i > 0)
    }

    pub fn can_go_forward(&self) -> bool {
        self.current
            .is_some_and(|i| i + 1 < self.entries.len())
    }

    /// Index `1 + offset` steps back, if both the guard and the target hold
    pub fn back_target(&self, offset: usize) -> Option<usize> {
        if !self.can_go_back() {
            return None;
        }
        self.current?.checked_sub(1 + offset)
    }

    /// Index `1 + offset` steps forward, if both the guard and the target hold
    pub fn forward_target(&self, offset: usize) -> Option<usize> {
        if !self.can_go_forward() {
            return None;
        }
        let target = self.current? + 1 + offset;
        (target < self.entries.len()).then_some(target)
    }

    /// Step back and return the entry that is now current
    pub fn back(&mut self, offset: usize) -> Option<&NavigationEntry> {
        let target = self.back_target(offset)?;
        self.set_current(target)
    }

    /// Step forward and return the entry that is now current
    pub fn forward(&mut self, offset: usize) -> Option<&NavigationEntry> {
        let target = self.forward_target(offset)?;
        self.set_current(target)
    }

    /// Move the cursor to an existing entry
    pub fn set_current(&mut self, index: usize) -> Option<&NavigationEntry> {
        if index >= self.entries.len() {
            return None;
        }
        self.current = Some(index);
        self.entries.get(index)
    }

    pub fn set_scroll_top(&mut self, scroll_top: f64) {
        let Some(index) = self.current else {
            return;
        };
        let mut entries = self.entries.to_vec();
        entries[index] = NavigationEntry {
            scroll_top,
            ..entries[index].clone()
        };
        self.entries = entries.into();
    }

    pub fn current(&self) -> Option<&NavigationEntry> {
        self.current.and_then(|i| self.entries.get(i))
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_directory(&self) -> Option<&Path> {
        self.current().map(|entry| entry.directory.as_path())
    }

    pub fn scroll_top(&self) -> f64 {
        self.current().map_or(0.0, |entry| entry.scroll_top)
    }

    pub fn entries(&self) -> Arc<[NavigationEntry]> {
        Arc::clone(&self.entries)
    }

    pub fn get(&self, index: usize) -> Option<&NavigationEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Directories behind the cursor, nearest first
    pub fn back_directories(&self) -> Vec<PathBuf> {
        let end = self.current.unwrap_or(0);
        self.entries[..end]
            .iter()
            .rev()
            .map(|entry| entry.directory.clone())
            .collect()
    }

    /// Directories ahead of the cursor, nearest first
    pub fn forward_directories(&self) -> Vec<PathBuf> {
        let start = self.current.map_or(0, |i| i + 1);
        self.entries[start.min(self.entries.len())..]
            .iter()
            .map(|entry| entry.directory.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack_of(dirs: &[&str]) -> HistoryStack {
        let mut stack = HistoryStack::new();
        for dir in dirs {
            stack.push(PathBuf::from(dir));
        }
        stack
    }

    #[test]
    fn test_empty_stack() {
        let stack = HistoryStack::new();
        assert!(stack.is_empty());
        assert_eq!(stack.current_index(), None);
        assert!(!stack.can_go_back());
        assert!(!stack.can_go_forward());
        assert_eq!(stack.scroll_top(), 0.0);
    }

    #[test]
    fn test_push_moves_cursor() {
        let stack = stack_of(&["/a", "/b", "/c"]);
        assert_eq!(stack.current_index(), Some(2));
        assert_eq!(stack.current_directory(), Some(Path::new("/c")));
        assert!(stack.can_go_back());
        assert!(!stack.can_go_forward());
    }

    #[test]
    fn test_back_then_push_truncates_forward_history() {
        let mut stack = stack_of(&["/a", "/b", "/c"]);
        let entry = stack.back(0).unwrap();
        assert_eq!(entry.directory, PathBuf::from("/b"));
        assert!(stack.can_go_forward());

        stack.push(PathBuf::from("/d"));
        assert_eq!(stack.len(), 3);
        assert_eq!(stack.current_index(), Some(2));
        assert_eq!(stack.current_directory(), Some(Path::new("/d")));
        assert!(!stack.can_go_forward());
    }

    #[test]
    fn test_back_and_forward_with_offset() {
        let mut stack = stack_of(&["/a", "/b", "/c", "/d"]);
        assert_eq!(stack.back(2).unwrap().directory, PathBuf::from("/a"));
        assert_eq!(stack.forward(1).unwrap().directory, PathBuf::from("/c"));
        // out of range offsets leave the cursor alone
        assert!(stack.forward(5).is_none());
        assert!(stack.back(7).is_none());
        assert_eq!(stack.current_index(), Some(2));
    }

    #[test]
    fn test_back_at_start_is_noop() {
        let mut stack = stack_of(&["/a"]);
        assert!(stack.back(0).is_none());
        assert_eq!(stack.current_index(), Some(0));
    }

    #[test]
    fn test_set_scroll_top_only_touches_current_entry() {
        let mut stack = stack_of(&["/a", "/b"]);
        let before = stack.entries();
        stack.set_scroll_top(120.0);

        assert_eq!(stack.scroll_top(), 120.0);
        assert_eq!(stack.get(0).unwrap().scroll_top, 0.0);
        // earlier snapshot is unchanged
        assert_eq!(before[1].scroll_top, 0.0);
        assert!(!Arc::ptr_eq(&before, &stack.entries()));
    }

    #[test]
    fn test_scroll_top_survives_round_trip() {
        let mut stack = stack_of(&["/a", "/b"]);
        stack.back(0);
        stack.set_scroll_top(40.0);
        stack.forward(0);
        assert_eq!(stack.scroll_top(), 0.0);
        stack.back(0);
        assert_eq!(stack.scroll_top(), 40.0);
    }

    #[test]
    fn test_back_and_forward_directories() {
        let mut stack = stack_of(&["/a", "/b", "/c", "/d"]);
        stack.back(1);
        assert_eq!(
            stack.back_directories(),
            vec![PathBuf::from("/a")]
        );
        assert_eq!(
            stack.forward_directories(),
            vec![PathBuf::from("/c"), PathBuf::from("/d")]
        );
    }
}
