use crate::error::Result;
use crate::order::OrderPreferences;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Extensions shown by the explorer and viewer unless configured otherwise
pub const DEFAULT_EXTENSIONS: [&str; 10] = [
    "BMP", "GIF", "ICO", "JPEG", "JPG", "PNG", "SVG", "TIF", "TIFF", "WEBP",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// List directories recursively when the viewer opens one
    pub recursive: bool,
    pub extensions: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            recursive: false,
            extensions: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
        }
    }
}

impl Settings {
    /// Whether `path` has an extension on the allow-list
    pub fn is_file_available(&self, path: &Path) -> bool {
        if path.as_os_str().is_empty() {
            return false;
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
            .map(|ext| {
                let ext = ext.to_uppercase();
                self.extensions
                    .iter()
                    .any(|allowed| allowed.to_uppercase() == ext)
            })
            .unwrap_or(false)
    }
}

fn default_extensions() -> Vec<String> {
    Settings::default().extensions
}

/// Everything written to disk between runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub directory: Option<PathBuf>,
    #[serde(default)]
    pub orders: OrderPreferences,
    #[serde(default)]
    pub bookmarks: Vec<PathBuf>,
    #[serde(default)]
    pub ratings: BTreeMap<PathBuf, u8>,
    #[serde(default)]
    pub recursive: bool,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub query_history: Vec<String>,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            directory: None,
            orders: OrderPreferences::default(),
            bookmarks: Vec::new(),
            ratings: BTreeMap::new(),
            recursive: false,
            extensions: default_extensions(),
            query_history: Vec::new(),
        }
    }
}

impl PersistedState {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let state: PersistedState = serde_json::from_str(&content)?;
        Ok(state)
    }

    /// Load `path` if it exists, otherwise start from defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            log::info!("No state file at {}, starting fresh", path.display());
            Ok(Self::default())
        }
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn settings(&self) -> Settings {
        Settings {
            recursive: self.recursive,
            extensions: self.extensions.clone(),
        }
    }
}
