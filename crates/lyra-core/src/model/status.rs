use serde::{Deserialize, Serialize};

use crate::model::SortKey;

/// Application state persisted next to the database.
///
/// The readiness flags record which pipeline stages completed; the status
/// reconciler re-derives them from disk on startup so manual copies and
/// interrupted imports are noticed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppStatus {
    /// Song XML files are present on disk.
    pub songs_ready: bool,

    /// The database holds the imported songs.
    pub database_ready: bool,

    /// Every supplemental PDF is present.
    pub web_resources_ready: bool,

    /// Preferred listing order, kept as text so a bad value in the file
    /// does not prevent loading; see [`AppStatus::sort_key`].
    pub sorting: String,

    pub last_search: String,

    pub is_progress: bool,
    pub progress_message: String,
    pub progress_percent: u8,

    /// RFC 3339 timestamp of the last save.
    pub last_save: String,
    pub build_version: String,
}

impl Default for AppStatus {
    fn default() -> Self {
        Self {
            songs_ready: false,
            database_ready: false,
            web_resources_ready: false,
            sorting: SortKey::Title.as_str().to_string(),
            last_search: String::new(),
            is_progress: false,
            progress_message: String::new(),
            progress_percent: 0,
            last_save: String::new(),
            build_version: String::new(),
        }
    }
}

impl AppStatus {
    /// The stored sort preference, with unknown values read as `Entry`.
    #[must_use]
    pub fn sort_key(&self) -> SortKey {
        SortKey::normalize(&self.sorting)
    }

    pub fn set_progress(&mut self, message: impl Into<String>, percent: u8) {
        self.progress_message = message.into();
        self.progress_percent = percent.min(100);
    }

    pub fn clear_progress(&mut self) {
        self.is_progress = false;
        self.progress_message.clear();
        self.progress_percent = 0;
    }
}
