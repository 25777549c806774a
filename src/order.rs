//! Per-directory ordering of explorer listings.
//!
//! Every sort key compares on its own field first and falls back to the file
//! name. Keys whose natural reading is "biggest first" (rating, recency) are
//! flipped by default, so the first toggle already shows the best-rated or
//! newest entries on top.

use crate::file::FileRecord;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Name,
    Rating,
    ModifiedAt,
}

/// Static properties of a sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKeyInfo {
    pub reversed_by_default: bool,
}

impl SortKey {
    pub const ALL: [SortKey; 3] = [SortKey::Name, SortKey::Rating, SortKey::ModifiedAt];

    pub fn info(self) -> SortKeyInfo {
        match self {
            SortKey::Name => SortKeyInfo {
                reversed_by_default: false,
            },
            SortKey::Rating => SortKeyInfo {
                reversed_by_default: true,
            },
            SortKey::ModifiedAt => SortKeyInfo {
                reversed_by_default: true,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::Rating => "rating",
            SortKey::ModifiedAt => "modified_at",
        }
    }

    fn compare_field(self, a: &FileRecord, b: &FileRecord) -> Ordering {
        match self {
            SortKey::Name => a.name.cmp(&b.name),
            SortKey::Rating => a.rating.cmp(&b.rating),
            SortKey::ModifiedAt => a.modified_at.cmp(&b.modified_at),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "name" => Ok(SortKey::Name),
            "rating" => Ok(SortKey::Rating),
            "modified_at" | "mtime" | "modified" => Ok(SortKey::ModifiedAt),
            _ => Err(format!("Unknown sort key: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPreference {
    pub key: SortKey,
    pub descending: bool,
}

impl Default for OrderPreference {
    fn default() -> Self {
        Self {
            key: SortKey::Name,
            descending: false,
        }
    }
}

impl OrderPreference {
    /// The preference after the user picks `key`: same key flips direction,
    /// a different key starts ascending.
    pub fn toggled(self, key: SortKey) -> Self {
        if self.key == key {
            Self {
                key,
                descending: !self.descending,
            }
        } else {
            Self {
                key,
                descending: false,
            }
        }
    }
}

/// Sort preferences keyed by directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderPreferences {
    orders: BTreeMap<PathBuf, OrderPreference>,
}

impl OrderPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, directory: &Path) -> OrderPreference {
        self.orders.get(directory).copied().unwrap_or_default()
    }

    pub fn set(&mut self, directory: PathBuf, order: OrderPreference) {
        self.orders.insert(directory, order);
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

impl From<BTreeMap<PathBuf, OrderPreference>> for OrderPreferences {
    fn from(orders: BTreeMap<PathBuf, OrderPreference>) -> Self {
        Self { orders }
    }
}

pub fn compare(a: &FileRecord, b: &FileRecord, key: SortKey, descending: bool) -> Ordering {
    let result = key
        .compare_field(a, b)
        .then_with(|| a.name.cmp(&b.name));
    let result = if key.info().reversed_by_default {
        result.reverse()
    } else {
        result
    };
    if descending {
        result.reverse()
    } else {
        result
    }
}

/// Stable sort of a listing under `order`
pub fn sort_files(files: &[FileRecord], order: OrderPreference) -> Vec<FileRecord> {
    let mut sorted = files.to_vec();
    sorted.sort_by(|a, b| compare(a, b, order.key, order.descending));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    fn record(name: &str, rating: u8, minute: u32) -> FileRecord {
        FileRecord {
            path: PathBuf::from("/pics").join(name),
            name: name.to_string(),
            is_directory: false,
            modified_at: Local.with_ymd_and_hms(2024, 1, 1, 12, minute, 0).unwrap(),
            rating,
        }
    }

    fn names(files: &[FileRecord]) -> Vec<&str> {
        files.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_name_ascending_is_case_sensitive() {
        let files = vec![record("b", 0, 0), record("A", 0, 0), record("c", 0, 0)];
        let sorted = sort_files(&files, OrderPreference::default());
        assert_eq!(names(&sorted), vec!["A", "b", "c"]);
    }

    #[test]
    fn test_name_descending() {
        let files = vec![record("b", 0, 0), record("A", 0, 0), record("c", 0, 0)];
        let order = OrderPreference {
            key: SortKey::Name,
            descending: true,
        };
        assert_eq!(names(&sort_files(&files, order)), vec!["c", "b", "A"]);
    }

    #[test]
    fn test_rating_first_toggle_shows_highest_first() {
        let files = vec![record("a", 1, 0), record("b", 5, 0), record("c", 3, 0)];
        let order = OrderPreference::default().toggled(SortKey::Rating);
        assert!(!order.descending);
        assert_eq!(names(&sort_files(&files, order)), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_modified_at_first_toggle_shows_newest_first() {
        let files = vec![record("old", 0, 1), record("new", 0, 30), record("mid", 0, 10)];
        let order = OrderPreference::default().toggled(SortKey::ModifiedAt);
        assert_eq!(names(&sort_files(&files, order)), vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_ties_fall_back_to_name_before_reversal() {
        let files = vec![record("b", 3, 0), record("a", 3, 0), record("c", 1, 0)];
        let order = OrderPreference {
            key: SortKey::Rating,
            descending: false,
        };
        // reversed key flips the name tiebreak along with the rating
        assert_eq!(names(&sort_files(&files, order)), vec!["b", "a", "c"]);

        let order = OrderPreference {
            key: SortKey::Rating,
            descending: true,
        };
        assert_eq!(names(&sort_files(&files, order)), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_toggled_flips_same_key_and_resets_new_key() {
        let order = OrderPreference::default();
        let flipped = order.toggled(SortKey::Name);
        assert!(flipped.descending);
        let other = flipped.toggled(SortKey::Rating);
        assert_eq!(other.key, SortKey::Rating);
        assert!(!other.descending);
    }

    #[test]
    fn test_every_key_has_info() {
        let reversed: Vec<bool> = SortKey::ALL
            .iter()
            .map(|key| key.info().reversed_by_default)
            .collect();
        assert_eq!(reversed, vec![false, true, true]);
    }

    #[test]
    fn test_sort_key_parsing() {
        assert_eq!("rating".parse::<SortKey>().unwrap(), SortKey::Rating);
        assert_eq!("mtime".parse::<SortKey>().unwrap(), SortKey::ModifiedAt);
        assert!("size".parse::<SortKey>().is_err());
    }

    #[test]
    fn test_preferences_default_to_name_ascending() {
        let mut prefs = OrderPreferences::new();
        assert_eq!(prefs.get(Path::new("/x")), OrderPreference::default());
        let order = OrderPreference {
            key: SortKey::Rating,
            descending: true,
        };
        prefs.set(PathBuf::from("/x"), order);
        assert_eq!(prefs.get(Path::new("/x")), order);
        assert_eq!(prefs.get(Path::new("/y")), OrderPreference::default());
    }
}
