//! Persisted application status and its reconciliation with disk.

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use lyra_core::model::{AppStatus, SortKey};
use lyra_core::schema::Database;

use crate::error::StatusError;
use crate::ingest::SongbookSource;
use crate::supplemental::{self, SupplementalPdf};

/// File name of the status file inside the data directory.
pub const STATUS_FILE: &str = "status.toml";

/// Reads and writes [`AppStatus`] as TOML.
#[derive(Debug, Clone)]
pub struct StatusStore {
    path: PathBuf,
}

impl StatusStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the status. A missing file yields the defaults.
    pub fn load(&self) -> Result<AppStatus, StatusError> {
        if !self.path.exists() {
            log::debug!("No status file at {}, using defaults", self.path.display());
            return Ok(AppStatus::default());
        }
        let content = std::fs::read_to_string(&self.path).map_err(|source| StatusError::Read {
            path: self.path.clone(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| StatusError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Save the status, stamping `last_save`.
    pub fn save(&self, status: &mut AppStatus) -> Result<(), StatusError> {
        status.last_save = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let content = toml::to_string_pretty(status)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StatusError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&self.path, content).map_err(|source| StatusError::Write {
            path: self.path.clone(),
            source,
        })
    }

    pub fn start_progress(
        &self,
        status: &mut AppStatus,
        message: impl Into<String>,
    ) -> Result<(), StatusError> {
        status.is_progress = true;
        status.set_progress(message, 0);
        self.save(status)
    }

    pub fn update_progress(
        &self,
        status: &mut AppStatus,
        message: impl Into<String>,
        percent: u8,
    ) -> Result<(), StatusError> {
        status.is_progress = true;
        status.set_progress(message, percent);
        self.save(status)
    }

    pub fn clear_progress(&self, status: &mut AppStatus) -> Result<(), StatusError> {
        status.clear_progress();
        self.save(status)
    }

    /// Store a sort preference. Unknown keys are stored as `entry`.
    pub fn save_sorting(
        &self,
        status: &mut AppStatus,
        requested: &str,
    ) -> Result<SortKey, StatusError> {
        let key = SortKey::normalize(requested);
        status.sorting = key.as_str().to_string();
        self.save(status)?;
        Ok(key)
    }
}

/// Result of [`StatusReconciler::reconcile`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// The status differs from what was loaded and should be saved.
    pub changed: bool,

    /// Songs are present but some supplemental PDFs are not.
    pub needs_supplemental_fetch: bool,
}

/// Re-derives readiness flags from the files and database on disk.
#[derive(Debug, Clone)]
pub struct StatusReconciler {
    songbook_root: PathBuf,
    database_path: PathBuf,
    pdf_dir: PathBuf,
    sources: Vec<SongbookSource>,
    supplemental: Vec<SupplementalPdf>,
    test_run: bool,
    build_version: String,
}

impl StatusReconciler {
    #[must_use]
    pub fn new(
        songbook_root: impl Into<PathBuf>,
        database_path: impl Into<PathBuf>,
        pdf_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            songbook_root: songbook_root.into(),
            database_path: database_path.into(),
            pdf_dir: pdf_dir.into(),
            sources: SongbookSource::defaults(),
            supplemental: SupplementalPdf::defaults(),
            test_run: false,
            build_version: String::new(),
        }
    }

    #[must_use]
    pub fn with_sources(mut self, sources: Vec<SongbookSource>) -> Self {
        self.sources = sources;
        self
    }

    #[must_use]
    pub fn with_supplemental(mut self, supplemental: Vec<SupplementalPdf>) -> Self {
        self.supplemental = supplemental;
        self
    }

    #[must_use]
    pub fn with_test_run(mut self, test_run: bool) -> Self {
        self.test_run = test_run;
        self
    }

    #[must_use]
    pub fn with_build_version(mut self, version: impl Into<String>) -> Self {
        self.build_version = version.into();
        self
    }

    /// Whether the primary songbook's XML files are all on disk.
    ///
    /// Counts `.xml` files in the first required songbook directory, or in
    /// the songbook root when that directory is absent.
    pub fn has_downloaded_songs(&self) -> bool {
        let primary = self.sources.iter().find(|s| s.required);
        let mut dir = primary.map_or_else(|| self.songbook_root.clone(), |s| s.dir(&self.songbook_root));
        if !dir.is_dir() {
            dir = self.songbook_root.clone();
        }

        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Failed to inspect {}: {e}", dir.display());
                return false;
            }
        };
        let count = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
            .filter(|entry| {
                Path::new(&entry.file_name())
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
            })
            .count();

        if self.test_run {
            return count > 0;
        }
        match primary.and_then(|s| s.expected_songs) {
            Some(expected) if count != expected => {
                log::warn!(
                    "Unexpected number of XML files in {}: found {count}, expected {expected}",
                    dir.display()
                );
                false
            }
            _ => count > 0,
        }
    }

    /// Whether the database holds a complete import.
    pub fn has_database_content(&self) -> bool {
        if !self.database_path.is_file() {
            return false;
        }
        match self.count_check() {
            Ok(ready) => ready,
            Err(e) => {
                log::warn!("Failed to verify database contents: {e}");
                false
            }
        }
    }

    fn count_check(&self) -> Result<bool, StatusError> {
        let db = Database::open_existing(&self.database_path)?;
        if self.test_run {
            return Ok(db.count_songs(None)? > 0);
        }

        let mut checked_any = false;
        for source in &self.sources {
            let Some(expected) = source.expected_songs else {
                continue;
            };
            checked_any = true;
            let found = db.count_songs(Some(&source.acronym))?;
            if usize::try_from(found).ok() != Some(expected) {
                log::warn!(
                    "Unexpected number of {} songs in database: found {found}, expected {expected}",
                    source.acronym
                );
                return Ok(false);
            }
        }
        if checked_any {
            Ok(true)
        } else {
            Ok(db.count_songs(None)? > 0)
        }
    }

    /// Whether every supplemental PDF is present. An empty list is ready.
    pub fn has_pdf_sources(&self) -> bool {
        let missing = supplemental::missing(&self.pdf_dir, &self.supplemental);
        for pdf in &missing {
            log::warn!(
                "Missing supplemental PDF {}",
                pdf.target_path(&self.pdf_dir).display()
            );
        }
        missing.is_empty()
    }

    /// Bring `status` in line with what is on disk.
    pub fn reconcile(&self, status: &mut AppStatus) -> Reconciliation {
        let songs_ready = self.has_downloaded_songs();
        let database_ready = self.has_database_content();
        let web_resources_ready = self.has_pdf_sources();

        let mut changed = false;
        if songs_ready != status.songs_ready
            || database_ready != status.database_ready
            || web_resources_ready != status.web_resources_ready
        {
            log::info!(
                "Reconciling status flags: songs_ready={songs_ready} database_ready={database_ready} web_resources_ready={web_resources_ready}"
            );
            status.songs_ready = songs_ready;
            status.database_ready = database_ready;
            status.web_resources_ready = web_resources_ready;
            changed = true;
        }

        if !SortKey::is_valid(&status.sorting) {
            log::info!("Resetting invalid sorting option {:?}", status.sorting);
            status.sorting = SortKey::Entry.as_str().to_string();
            changed = true;
        }

        if !self.build_version.is_empty() && status.build_version != self.build_version {
            status.build_version.clone_from(&self.build_version);
            changed = true;
        }

        Reconciliation {
            changed,
            needs_supplemental_fetch: status.songs_ready && !status.web_resources_ready,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyra_core::model::NewSong;

    fn write_songs(dir: &Path, count: usize) {
        std::fs::create_dir_all(dir).unwrap();
        for i in 0..count {
            std::fs::write(dir.join(format!("{i:03}.xml")), "<song/>").unwrap();
        }
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = StatusStore::new(dir.path().join(STATUS_FILE));
        let status = store.load().unwrap();
        assert_eq!(status, AppStatus::default());
        assert_eq!(status.sorting, "title");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = StatusStore::new(dir.path().join("nested").join(STATUS_FILE));

        let mut status = AppStatus {
            songs_ready: true,
            ..AppStatus::default()
        };
        store.save(&mut status).unwrap();
        assert!(!status.last_save.is_empty());

        let loaded = store.load().unwrap();
        assert_eq!(loaded, status);
        assert!(chrono::DateTime::parse_from_rfc3339(&loaded.last_save).is_ok());
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STATUS_FILE);
        std::fs::write(&path, "songs_ready = [").unwrap();
        assert!(matches!(
            StatusStore::new(&path).load(),
            Err(StatusError::Parse { .. })
        ));
    }

    #[test]
    fn test_progress_helpers() {
        let dir = tempfile::tempdir().unwrap();
        let store = StatusStore::new(dir.path().join(STATUS_FILE));
        let mut status = AppStatus::default();

        store.start_progress(&mut status, "Importing").unwrap();
        store.update_progress(&mut status, "Importing EZ", 40).unwrap();
        let loaded = store.load().unwrap();
        assert!(loaded.is_progress);
        assert_eq!(loaded.progress_percent, 40);
        assert_eq!(loaded.progress_message, "Importing EZ");

        store.clear_progress(&mut status).unwrap();
        assert!(!store.load().unwrap().is_progress);
    }

    #[test]
    fn test_save_sorting_normalizes() {
        let dir = tempfile::tempdir().unwrap();
        let store = StatusStore::new(dir.path().join(STATUS_FILE));
        let mut status = AppStatus::default();

        assert_eq!(
            store.save_sorting(&mut status, "authorMusic").unwrap(),
            SortKey::AuthorMusic
        );
        assert_eq!(store.load().unwrap().sorting, "authorMusic");

        assert_eq!(store.save_sorting(&mut status, "bogus").unwrap(), SortKey::Entry);
        assert_eq!(store.load().unwrap().sorting, "entry");
    }

    #[test]
    fn test_reconcile_empty_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let reconciler = StatusReconciler::new(
            dir.path().join("SongBook"),
            dir.path().join("Songs.db"),
            dir.path().join("PdfSources"),
        );

        let mut status = AppStatus {
            songs_ready: true,
            database_ready: true,
            web_resources_ready: true,
            sorting: "sideways".to_string(),
            ..AppStatus::default()
        };
        let outcome = reconciler.reconcile(&mut status);

        assert!(outcome.changed);
        assert!(!outcome.needs_supplemental_fetch);
        assert!(!status.songs_ready);
        assert!(!status.database_ready);
        assert!(!status.web_resources_ready);
        assert_eq!(status.sorting, "entry");
    }

    #[test]
    fn test_reconcile_flags_missing_pdfs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("SongBook");
        write_songs(&root.join("EZ"), 3);

        let source = SongbookSource {
            expected_songs: Some(3),
            ..SongbookSource::ez()
        };
        let reconciler = StatusReconciler::new(&root, dir.path().join("Songs.db"), dir.path())
            .with_sources(vec![source]);

        let mut status = AppStatus::default();
        let outcome = reconciler.reconcile(&mut status);
        assert!(status.songs_ready);
        assert!(!status.web_resources_ready);
        assert!(outcome.needs_supplemental_fetch);
    }

    #[test]
    fn test_downloaded_songs_count_must_match() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("SongBook");
        write_songs(&root.join("EZ"), 2);

        let reconciler = StatusReconciler::new(&root, dir.path().join("Songs.db"), dir.path());
        assert!(!reconciler.has_downloaded_songs());
        assert!(reconciler.clone().with_test_run(true).has_downloaded_songs());
    }

    #[test]
    fn test_downloaded_songs_legacy_layout() {
        let dir = tempfile::tempdir().unwrap();
        write_songs(dir.path(), 1);

        let reconciler = StatusReconciler::new(dir.path(), dir.path().join("Songs.db"), dir.path())
            .with_test_run(true);
        assert!(reconciler.has_downloaded_songs());
    }

    #[test]
    fn test_database_content() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("Songs.db");
        let db = Database::open(&db_path).unwrap();
        db.insert_song(&NewSong::new("EZ", "Hrad přepevný", 1, "1")).unwrap();
        drop(db);

        let reconciler = StatusReconciler::new(dir.path(), &db_path, dir.path());
        assert!(!reconciler.has_database_content());

        let one = SongbookSource {
            expected_songs: Some(1),
            ..SongbookSource::ez()
        };
        assert!(reconciler
            .clone()
            .with_sources(vec![one])
            .has_database_content());
        assert!(reconciler.with_test_run(true).has_database_content());
    }

    #[test]
    fn test_empty_supplemental_list_is_ready() {
        let dir = tempfile::tempdir().unwrap();
        let reconciler = StatusReconciler::new(dir.path(), dir.path().join("Songs.db"), dir.path())
            .with_supplemental(Vec::new());
        assert!(reconciler.has_pdf_sources());
    }

    #[test]
    fn test_reconcile_stamps_build_version() {
        let dir = tempfile::tempdir().unwrap();
        let reconciler = StatusReconciler::new(dir.path(), dir.path().join("Songs.db"), dir.path())
            .with_supplemental(Vec::new())
            .with_build_version("1.2.3");

        let mut status = AppStatus {
            web_resources_ready: true,
            sorting: "title".to_string(),
            ..AppStatus::default()
        };
        assert!(reconciler.reconcile(&mut status).changed);
        assert_eq!(status.build_version, "1.2.3");
        assert!(!reconciler.reconcile(&mut status).changed);
    }
}
