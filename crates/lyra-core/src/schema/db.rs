use rusqlite::{Connection, OpenFlags, OptionalExtension};
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{Author, AuthorRole, NewSong, Song, Songbook, Verse};
use crate::normalize::remove_diacritics;

use super::migrations;

/// A database connection with the row operations used by ingestion.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a database at the given path and bring its schema
    /// up to date.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Self::open_unmigrated(path)?;
        db.initialize()?;
        Ok(db)
    }

    /// Open a database that must already exist. The schema is not touched.
    pub fn open_existing(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Self::with_connection(conn)
    }

    /// Open (or create) a database without running migrations.
    pub fn open_unmigrated(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::with_connection(Connection::open(path)?)
    }

    /// Open an in-memory database (for tests).
    pub fn open_in_memory() -> Result<Self> {
        let db = Self::with_connection(Connection::open_in_memory()?)?;
        db.initialize()?;
        Ok(db)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        Ok(Self { conn })
    }

    /// Get a reference to the underlying connection (for advanced queries).
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run the schema manager. Safe on every startup.
    pub fn initialize(&self) -> Result<u32> {
        migrations::initialize(&self.conn)
    }

    pub fn schema_version(&self) -> Result<u32> {
        migrations::detect_version(&self.conn)
    }

    /// Drop all tables and recreate the current schema.
    pub fn reset(&self) -> Result<u32> {
        migrations::reset(&self.conn)
    }

    /// Run `f` inside a transaction. Any error rolls the transaction back.
    pub fn in_transaction<T>(&self, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        let tx = self.conn.unchecked_transaction()?;
        let value = f(self)?;
        tx.commit()?;
        Ok(value)
    }
}

// Songbooks
impl Database {
    /// Register a songbook, or return the existing one with that acronym.
    /// The stored name of an existing songbook is left alone.
    pub fn ensure_songbook(&self, acronym: &str, name: &str) -> Result<String> {
        let songbook = Songbook::new(acronym, name)?;
        if let Some(existing) = self.songbook(&songbook.acronym)? {
            return Ok(existing.acronym);
        }
        self.conn.execute(
            "INSERT INTO songbooks (songbook_acronym, name) VALUES (?1, ?2)",
            [&songbook.acronym, &songbook.name],
        )?;
        log::debug!("Registered songbook {} ({})", songbook.acronym, songbook.name);
        Ok(songbook.acronym)
    }

    pub fn songbook(&self, acronym: &str) -> Result<Option<Songbook>> {
        let songbook = self
            .conn
            .query_row(
                "SELECT songbook_acronym, name FROM songbooks WHERE songbook_acronym = ?1",
                [acronym],
                |row| {
                    Ok(Songbook {
                        acronym: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(songbook)
    }

    pub fn list_songbooks(&self) -> Result<Vec<Songbook>> {
        let mut stmt = self
            .conn
            .prepare("SELECT songbook_acronym, name FROM songbooks ORDER BY songbook_acronym")?;
        let songbooks = stmt
            .query_map([], |row| {
                Ok(Songbook {
                    acronym: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(songbooks)
    }

    /// Remove every song of a songbook. Authors and verses go with them.
    pub fn delete_songbook_songs(&self, acronym: &str) -> Result<usize> {
        let deleted = self
            .conn
            .execute("DELETE FROM songs WHERE songbook_acronym = ?1", [acronym])?;
        Ok(deleted)
    }
}

// Songs, authors, verses
impl Database {
    /// Insert a song and return its id. `title_d` is derived here.
    pub fn insert_song(&self, song: &NewSong) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO songs (
                songbook_acronym, entry, entry_text, title, title_d,
                verse_order, kytara_file, notes_file
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                song.songbook_acronym,
                song.entry_number,
                song.entry_text,
                song.title,
                remove_diacritics(&song.title),
                song.verse_order,
                song.kytara_file,
                song.notes_file,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn insert_author(&self, song_id: i64, author: &Author) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO authors (song_id, author_type, author_value, author_value_d)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                song_id,
                author.role.as_str(),
                author.value,
                remove_diacritics(&author.value),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn insert_verse(&self, song_id: i64, verse: &Verse) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO verses (song_id, name, lines, lines_d) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![song_id, verse.name, verse.lines, remove_diacritics(&verse.lines)],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_song(&self, id: i64) -> Result<Song> {
        self.conn
            .query_row(
                "SELECT id, songbook_acronym, title, title_d, verse_order, entry,
                        entry_text, kytara_file, notes_file
                 FROM songs WHERE id = ?1",
                [id],
                |row| {
                    Ok(Song {
                        id: row.get(0)?,
                        songbook_acronym: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                        title: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                        title_normalized: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                        verse_order: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                        entry_number: row.get::<_, Option<i64>>(5)?.unwrap_or(0),
                        entry_text: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
                        kytara_file: row.get(7)?,
                        notes_file: row.get(8)?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| Error::NotFound {
                entity: "song",
                id: id.to_string(),
            })
    }

    /// Find a song by songbook and entry number.
    pub fn find_song_id(&self, acronym: &str, entry_number: i64) -> Result<Option<i64>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM songs WHERE songbook_acronym = ?1 AND entry = ?2
                 ORDER BY id LIMIT 1",
                rusqlite::params![acronym, entry_number],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// Authors of a song in insertion order.
    pub fn song_authors(&self, song_id: i64) -> Result<Vec<Author>> {
        let mut stmt = self.conn.prepare(
            "SELECT author_type, author_value FROM authors WHERE song_id = ?1 ORDER BY id",
        )?;
        let authors = stmt
            .query_map([song_id], |row| {
                let role: Option<String> = row.get(0)?;
                let value: Option<String> = row.get(1)?;
                Ok(Author::new(
                    AuthorRole::from_attr(role.as_deref()),
                    value.unwrap_or_default(),
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(authors)
    }

    /// Verses of a song in insertion order.
    pub fn song_verses(&self, song_id: i64) -> Result<Vec<Verse>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, lines FROM verses WHERE song_id = ?1 ORDER BY id")?;
        let verses = stmt
            .query_map([song_id], |row| {
                let name: Option<String> = row.get(0)?;
                let lines: Option<String> = row.get(1)?;
                Ok(Verse::new(name.unwrap_or_default(), lines.unwrap_or_default()))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(verses)
    }

    /// Count songs, optionally restricted to one songbook.
    pub fn count_songs(&self, songbook: Option<&str>) -> Result<i64> {
        let count = match songbook {
            Some(acronym) => self.conn.query_row(
                "SELECT COUNT(*) FROM songs WHERE songbook_acronym = ?1",
                [acronym],
                |row| row.get(0),
            )?,
            None => self
                .conn
                .query_row("SELECT COUNT(*) FROM songs", [], |row| row.get(0))?,
        };
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::migrations::CURRENT_VERSION;

    fn sample_song(db: &Database) -> i64 {
        db.ensure_songbook("KK", "Katolický kancionál").unwrap();
        db.insert_song(&NewSong::new("KK", "Ejhle, oltář Hospodinův", 511, "511A"))
            .unwrap()
    }

    #[test]
    fn test_database_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.schema_version().unwrap(), CURRENT_VERSION);
        assert!(db.songbook("EZ").unwrap().is_some());
    }

    #[test]
    fn test_open_existing_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Database::open_existing(dir.path().join("missing.db"));
        assert!(result.is_err());
        assert!(!dir.path().join("missing.db").exists());
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("Songs.db");
        let db = Database::open(&path).unwrap();
        assert_eq!(db.count_songs(None).unwrap(), 0);
        drop(db);

        let reopened = Database::open_existing(&path).unwrap();
        assert_eq!(reopened.schema_version().unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn test_ensure_songbook_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.ensure_songbook("KK", "Katolický kancionál").unwrap(), "KK");
        assert_eq!(db.ensure_songbook("KK", "Other name").unwrap(), "KK");

        let kk = db.songbook("KK").unwrap().unwrap();
        assert_eq!(kk.name, "Katolický kancionál");
        assert_eq!(db.list_songbooks().unwrap().len(), 2);
    }

    #[test]
    fn test_ensure_songbook_rejects_long_acronym() {
        let db = Database::open_in_memory().unwrap();
        let err = db.ensure_songbook("ABCDEFGHIJK", "Too long").unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
        assert!(db.songbook("ABCDEFGHIJK").unwrap().is_none());
    }

    #[test]
    fn test_song_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let id = sample_song(&db);

        let song = db.get_song(id).unwrap();
        assert_eq!(song.title, "Ejhle, oltář Hospodinův");
        assert_eq!(song.title_normalized, "Ejhle, oltar Hospodinuv");
        assert_eq!(song.entry_number, 511);
        assert_eq!(song.entry_text, "511A");
        assert_eq!(song.songbook_acronym, "KK");
        assert_eq!(db.find_song_id("KK", 511).unwrap(), Some(id));
        assert_eq!(db.find_song_id("EZ", 511).unwrap(), None);
    }

    #[test]
    fn test_get_song_not_found() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(db.get_song(42), Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_normalized_columns_written() {
        let db = Database::open_in_memory().unwrap();
        let id = sample_song(&db);
        db.insert_author(id, &Author::new(AuthorRole::Music, "Jiří Šťastný"))
            .unwrap();
        db.insert_verse(id, &Verse::new("v1", "Čistá\nduše")).unwrap();

        let (value_d, lines_d): (String, String) = db
            .conn()
            .query_row(
                "SELECT a.author_value_d, v.lines_d FROM authors a
                 JOIN verses v ON v.song_id = a.song_id WHERE a.song_id = ?1",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(value_d, "Jiri Stastny");
        assert_eq!(lines_d, "Cista\nduse");
    }

    #[test]
    fn test_delete_songbook_songs_cascades() {
        let db = Database::open_in_memory().unwrap();
        let id = sample_song(&db);
        db.insert_author(id, &Author::new(AuthorRole::Words, "Anon")).unwrap();
        db.insert_verse(id, &Verse::new("v1", "text")).unwrap();

        assert_eq!(db.delete_songbook_songs("KK").unwrap(), 1);
        assert!(db.song_authors(id).unwrap().is_empty());
        assert!(db.song_verses(id).unwrap().is_empty());
        assert_eq!(db.count_songs(Some("KK")).unwrap(), 0);
    }

    #[test]
    fn test_in_transaction_rolls_back_on_error() {
        let db = Database::open_in_memory().unwrap();
        db.ensure_songbook("KK", "Katolický kancionál").unwrap();

        let result: Result<()> = db.in_transaction(|db| {
            db.insert_song(&NewSong::new("KK", "Rolled back", 1, "1"))?;
            Err(Error::InvalidData("boom".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(db.count_songs(Some("KK")).unwrap(), 0);

        db.in_transaction(|db| db.insert_song(&NewSong::new("KK", "Kept", 2, "2")))
            .unwrap();
        assert_eq!(db.count_songs(Some("KK")).unwrap(), 1);
    }

    #[test]
    fn test_song_requires_known_songbook() {
        let db = Database::open_in_memory().unwrap();
        let result = db.insert_song(&NewSong::new("XX", "Orphan", 1, "1"));
        assert!(result.is_err());
    }

    #[test]
    fn test_reset_clears_songs() {
        let db = Database::open_in_memory().unwrap();
        sample_song(&db);
        assert_eq!(db.reset().unwrap(), CURRENT_VERSION);
        assert_eq!(db.count_songs(None).unwrap(), 0);
        assert!(db.songbook("KK").unwrap().is_none());
    }
}
