//! Key/value collaborators the sessions read and write through.

use crate::config::Settings;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

pub const MAX_RATING: u8 = 5;
const QUERY_HISTORY_SIZE: usize = 1000;

#[cfg_attr(test, mockall::automock)]
pub trait RatingStore {
    /// Rating for `path`, 0 when unrated
    fn rating(&self, path: &Path) -> u8;
    fn set_rating(&mut self, path: &Path, rating: u8);
    /// Every non-zero rating, for persisting
    fn all_ratings(&self) -> BTreeMap<PathBuf, u8>;
}

#[cfg_attr(test, mockall::automock)]
pub trait BookmarkStore {
    fn is_bookmarked(&self, path: &Path) -> bool;
    fn add(&mut self, path: &Path);
    fn remove(&mut self, path: &Path);
    fn all_bookmarks(&self) -> Vec<PathBuf>;

    fn toggle(&mut self, path: &Path) {
        if self.is_bookmarked(path) {
            self.remove(path);
        } else {
            self.add(path);
        }
    }
}

pub type SharedRatings = Arc<Mutex<dyn RatingStore + Send>>;
pub type SharedBookmarks = Arc<Mutex<dyn BookmarkStore + Send>>;

/// Collaborators shared by both sessions
#[derive(Clone)]
pub struct Services {
    pub settings: Arc<RwLock<Settings>>,
    pub ratings: SharedRatings,
    pub bookmarks: SharedBookmarks,
}

impl Services {
    pub fn new(
        settings: Settings,
        ratings: impl RatingStore + Send + 'static,
        bookmarks: impl BookmarkStore + Send + 'static,
    ) -> Self {
        Self {
            settings: Arc::new(RwLock::new(settings)),
            ratings: Arc::new(Mutex::new(ratings)),
            bookmarks: Arc::new(Mutex::new(bookmarks)),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(
            Settings::default(),
            MemoryRatingStore::default(),
            MemoryBookmarkStore::default(),
        )
    }

    pub fn is_file_available(&self, path: &Path) -> bool {
        self.settings
            .read()
            .map(|settings| settings.is_file_available(path))
            .unwrap_or(false)
    }

    pub fn rating(&self, path: &Path) -> u8 {
        self.ratings
            .lock()
            .map(|store| store.rating(path))
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryRatingStore {
    ratings: BTreeMap<PathBuf, u8>,
}

impl MemoryRatingStore {
    pub fn new(ratings: BTreeMap<PathBuf, u8>) -> Self {
        Self { ratings }
    }

    pub fn ratings(&self) -> &BTreeMap<PathBuf, u8> {
        &self.ratings
    }
}

impl RatingStore for MemoryRatingStore {
    fn rating(&self, path: &Path) -> u8 {
        self.ratings.get(path).copied().unwrap_or(0)
    }

    fn set_rating(&mut self, path: &Path, rating: u8) {
        let rating = rating.min(MAX_RATING);
        if rating == 0 {
            self.ratings.remove(path);
        } else {
            self.ratings.insert(path.to_path_buf(), rating);
        }
    }

    fn all_ratings(&self) -> BTreeMap<PathBuf, u8> {
        self.ratings.clone()
    }
}

/// Ordered, duplicate-free bookmark list
#[derive(Debug, Clone, Default)]
pub struct MemoryBookmarkStore {
    bookmarks: Vec<PathBuf>,
}

impl MemoryBookmarkStore {
    pub fn new(bookmarks: Vec<PathBuf>) -> Self {
        let mut store = Self::default();
        for bookmark in bookmarks {
            store.add(&bookmark);
        }
        store
    }

    pub fn bookmarks(&self) -> &[PathBuf] {
        &self.bookmarks
    }
}

impl BookmarkStore for MemoryBookmarkStore {
    fn is_bookmarked(&self, path: &Path) -> bool {
        self.bookmarks.iter().any(|bookmark| bookmark == path)
    }

    fn add(&mut self, path: &Path) {
        if !self.is_bookmarked(path) {
            self.bookmarks.push(path.to_path_buf());
        }
    }

    fn remove(&mut self, path: &Path) {
        self.bookmarks.retain(|bookmark| bookmark != path);
    }

    fn all_bookmarks(&self) -> Vec<PathBuf> {
        self.bookmarks.clone()
    }
}

/// Recently used search queries, oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryHistory {
    queries: Vec<String>,
}

impl QueryHistory {
    pub fn new(queries: Vec<String>) -> Self {
        let mut history = Self::default();
        for query in queries {
            history.add(&query);
        }
        history
    }

    pub fn add(&mut self, query: &str) {
        if query.is_empty() {
            return;
        }
        self.queries.retain(|item| item != query);
        self.queries.push(query.to_string());
        if self.queries.len() > QUERY_HISTORY_SIZE {
            let excess = self.queries.len() - QUERY_HISTORY_SIZE;
            self.queries.drain(..excess);
        }
    }

    pub fn delete(&mut self, query: &str) {
        self.queries.retain(|item| item != query);
    }

    pub fn queries(&self) -> &[String] {
        &self.queries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_zero_removes_entry() {
        let mut store = MemoryRatingStore::default();
        let path = Path::new("/pics/a.png");
        store.set_rating(path, 3);
        assert_eq!(store.rating(path), 3);
        store.set_rating(path, 0);
        assert_eq!(store.rating(path), 0);
        assert!(store.ratings().is_empty());
    }

    #[test]
    fn test_rating_is_clamped() {
        let mut store = MemoryRatingStore::default();
        store.set_rating(Path::new("/a.png"), 9);
        assert_eq!(store.rating(Path::new("/a.png")), MAX_RATING);
    }

    #[test]
    fn test_bookmark_toggle() {
        let mut store = MemoryBookmarkStore::default();
        let path = Path::new("/pics");
        store.toggle(path);
        assert!(store.is_bookmarked(path));
        store.add(path);
        assert_eq!(store.bookmarks().len(), 1);
        store.toggle(path);
        assert!(!store.is_bookmarked(path));
    }

    #[test]
    fn test_bookmarks_deduplicate_on_load() {
        let store = MemoryBookmarkStore::new(vec![
            PathBuf::from("/a"),
            PathBuf::from("/b"),
            PathBuf::from("/a"),
        ]);
        assert_eq!(store.bookmarks(), &[PathBuf::from("/a"), PathBuf::from("/b")]);
    }

    #[test]
    fn test_query_history_moves_repeat_to_end() {
        let mut history = QueryHistory::default();
        history.add("cat");
        history.add("dog");
        history.add("");
        history.add("cat");
        assert_eq!(history.queries(), &["dog".to_string(), "cat".to_string()]);
        history.delete("dog");
        assert_eq!(history.queries(), &["cat".to_string()]);
    }

    #[test]
    fn test_query_history_is_capped() {
        let mut history = QueryHistory::default();
        for i in 0..(QUERY_HISTORY_SIZE + 5) {
            history.add(&format!("q{}", i));
        }
        assert_eq!(history.queries().len(), QUERY_HISTORY_SIZE);
        assert_eq!(history.queries()[0], "q5");
    }
}
