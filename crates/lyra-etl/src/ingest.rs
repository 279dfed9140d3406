//! Songbook import: walk each songbook directory and store every song.

use std::path::{Path, PathBuf};

use lyra_core::schema::Database;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::{IngestError, IngestResult};
use crate::parse::Dialect;

/// Files imported per songbook in test-run mode.
pub const TEST_RUN_FILE_LIMIT: usize = 25;

/// Report progress every this many files.
const PROGRESS_EVERY: usize = 10;

/// Where a songbook's files live and how to read them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongbookSource {
    pub acronym: String,
    pub name: String,

    /// Directory relative to the songbook root.
    pub path: PathBuf,
    pub dialect: Dialect,

    /// A required songbook must be present; an optional one is skipped.
    #[serde(default)]
    pub required: bool,

    /// Number of songs a complete download contains, when known.
    #[serde(default)]
    pub expected_songs: Option<usize>,
}

impl SongbookSource {
    /// Evangelický zpěvník: required, OpenLyrics files.
    #[must_use]
    pub fn ez() -> Self {
        Self {
            acronym: "EZ".to_string(),
            name: "Evangelický zpěvník 2021".to_string(),
            path: PathBuf::from("EZ"),
            dialect: Dialect::Ez,
            required: true,
            expected_songs: Some(789),
        }
    }

    /// Katolický kancionál: optional, OpenSong files.
    #[must_use]
    pub fn kk() -> Self {
        Self {
            acronym: "KK".to_string(),
            name: "Katolický kancionál".to_string(),
            path: PathBuf::from("KK").join("Kancional"),
            dialect: Dialect::Kk,
            required: false,
            expected_songs: None,
        }
    }

    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![Self::ez(), Self::kk()]
    }

    #[must_use]
    pub fn dir(&self, songbook_root: &Path) -> PathBuf {
        songbook_root.join(&self.path)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Import at most [`TEST_RUN_FILE_LIMIT`] files per songbook and
    /// tolerate a missing required songbook.
    pub test_run: bool,
}

/// A progress update for whoever drives the import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub message: String,
    pub percent: u8,
}

/// Outcome of importing one songbook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongbookReport {
    pub acronym: String,
    pub imported: usize,
    pub failed: usize,

    /// The songbook directory was not present.
    pub skipped: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub songbooks: Vec<SongbookReport>,
}

impl ImportReport {
    pub fn imported(&self) -> usize {
        self.songbooks.iter().map(|s| s.imported).sum()
    }

    pub fn failed(&self) -> usize {
        self.songbooks.iter().map(|s| s.failed).sum()
    }

    pub fn songbook(&self, acronym: &str) -> Option<&SongbookReport> {
        self.songbooks.iter().find(|s| s.acronym == acronym)
    }
}

/// Imports songbooks from `<songbook_root>/<source.path>` into the database.
#[derive(Debug, Clone)]
pub struct Importer {
    songbook_root: PathBuf,
    sources: Vec<SongbookSource>,
    options: ImportOptions,
}

impl Importer {
    #[must_use]
    pub fn new(
        songbook_root: impl Into<PathBuf>,
        sources: Vec<SongbookSource>,
        options: ImportOptions,
    ) -> Self {
        Self {
            songbook_root: songbook_root.into(),
            sources,
            options,
        }
    }

    /// Restrict the import to one songbook.
    pub fn only(mut self, acronym: &str) -> IngestResult<Self> {
        self.sources.retain(|s| s.acronym.eq_ignore_ascii_case(acronym));
        if self.sources.is_empty() {
            return Err(IngestError::UnknownSongbook(acronym.to_string()));
        }
        Ok(self)
    }

    #[must_use]
    pub fn sources(&self) -> &[SongbookSource] {
        &self.sources
    }

    /// Import every present songbook. Previous songs of an imported
    /// songbook are replaced.
    pub fn run(
        &self,
        db: &Database,
        progress: &mut dyn FnMut(&Progress),
    ) -> IngestResult<ImportReport> {
        let mut report = ImportReport::default();
        let mut present = Vec::new();

        for source in &self.sources {
            let dir = source.dir(&self.songbook_root);
            if dir.is_dir() {
                present.push((source, dir));
            } else if source.required && !self.options.test_run {
                return Err(IngestError::MissingSongbook {
                    acronym: source.acronym.clone(),
                    path: dir,
                });
            } else {
                log::info!(
                    "Songbook {} not present at {}, skipping",
                    source.acronym,
                    dir.display()
                );
                report.songbooks.push(SongbookReport {
                    acronym: source.acronym.clone(),
                    skipped: true,
                    ..SongbookReport::default()
                });
            }
        }

        let slots = present.len();
        for (slot, (source, dir)) in present.into_iter().enumerate() {
            let songbook = self.import_songbook(db, source, &dir, slot, slots, progress)?;
            log::info!(
                "Imported {} songs into {} ({} failed)",
                songbook.imported,
                songbook.acronym,
                songbook.failed
            );
            report.songbooks.push(songbook);
        }

        Ok(report)
    }

    /// Drop every table, recreate the schema and import all songbooks again.
    pub fn reset_and_run(
        &self,
        db: &Database,
        progress: &mut dyn FnMut(&Progress),
    ) -> IngestResult<ImportReport> {
        let version = db.reset()?;
        log::info!("Database reset to schema version {version}");
        self.run(db, progress)
    }

    fn import_songbook(
        &self,
        db: &Database,
        source: &SongbookSource,
        dir: &Path,
        slot: usize,
        slots: usize,
        progress: &mut dyn FnMut(&Progress),
    ) -> IngestResult<SongbookReport> {
        let files = self.list_files(source, dir)?;

        let acronym = db
            .ensure_songbook(&source.acronym, &source.name)
            .map_err(|e| IngestError::Songbook {
                acronym: source.acronym.clone(),
                source: e,
            })?;
        let removed = db.delete_songbook_songs(&acronym)?;
        if removed > 0 {
            log::debug!("Removed {removed} previous songs of {acronym}");
        }

        let mut report = SongbookReport {
            acronym: acronym.clone(),
            ..SongbookReport::default()
        };

        let total = files.len();
        for (index, file) in files.iter().enumerate() {
            if index % PROGRESS_EVERY == 0 || index + 1 == total {
                progress(&Progress {
                    message: format!("Importing {acronym} songs... ({}/{total})", index + 1),
                    percent: percent(slot, slots, index + 1, total),
                });
            }

            match import_file(db, source.dialect, &acronym, file) {
                Ok(song_id) => {
                    log::debug!("Stored {} as song {song_id}", file.display());
                    report.imported += 1;
                }
                Err(e) => {
                    log::error!("Failed to import {}: {e}", file.display());
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Files directly inside `dir`, sorted by name.
    fn list_files(&self, source: &SongbookSource, dir: &Path) -> IngestResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| IngestError::ReadDir {
                path: dir.to_path_buf(),
                source: e,
            })?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }

        if files.is_empty() {
            log::warn!("No song files in {}", dir.display());
            return Err(IngestError::NoFiles {
                acronym: source.acronym.clone(),
                path: dir.to_path_buf(),
            });
        }
        if self.options.test_run {
            files.truncate(TEST_RUN_FILE_LIMIT);
        }
        Ok(files)
    }
}

/// Parse one file and store it in its own transaction.
fn import_file(db: &Database, dialect: Dialect, acronym: &str, path: &Path) -> IngestResult<i64> {
    let song = dialect.parse_file(path)?;
    let id = db.in_transaction(|db| {
        let id = db.insert_song(&song.to_new_song(acronym))?;
        for author in &song.authors {
            db.insert_author(id, author)?;
        }
        for verse in &song.verses {
            db.insert_verse(id, verse)?;
        }
        Ok(id)
    })?;
    Ok(id)
}

/// Overall percentage after `done` of `total` files of songbook `slot` of
/// `slots`. Each songbook owns an equal share of 0..=100.
fn percent(slot: usize, slots: usize, done: usize, total: usize) -> u8 {
    if slots == 0 || total == 0 {
        return 100;
    }
    let start = slot * 100 / slots;
    let end = (slot + 1) * 100 / slots;
    let value = start + (end - start) * done / total;
    u8::try_from(value.min(100)).unwrap_or(100)
}
