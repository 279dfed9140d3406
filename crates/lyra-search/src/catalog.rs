//! Read-side operations over an existing song database.

use std::path::{Path, PathBuf};

use lyra_core::model::{AppStatus, Author, AuthorRole, SortKey};
use lyra_core::schema::Database;
use rusqlite::{params_from_iter, Connection, OptionalExtension};

use crate::error::{QueryError, QueryResult};
use crate::filter::SearchFilter;
use crate::model::{Projection, ProjectionVerse, SongHeader, SongSummary};

/// Separator between verses in [`Catalog::get_verses`].
pub const VERSE_SEPARATOR: &str = "===";

const SONG_LIST: &str = "
SELECT s.id,
       COALESCE(s.entry, 0),
       COALESCE(s.entry_text, CAST(s.entry AS TEXT), ''),
       COALESCE(s.title, ''),
       COALESCE(GROUP_CONCAT(v.lines, char(10, 10) ORDER BY v.id), ''),
       COALESCE((SELECT author_value FROM authors
                  WHERE song_id = s.id AND author_type = 'music'
                  ORDER BY id LIMIT 1), '') AS author_music,
       COALESCE((SELECT author_value FROM authors
                  WHERE song_id = s.id AND author_type = 'words'
                  ORDER BY id LIMIT 1), '') AS author_lyric,
       COALESCE(s.kytara_file, ''),
       COALESCE(s.songbook_acronym, '')
  FROM songs s
  JOIN verses v ON s.id = v.song_id
";

const HEADER_LIST: &str = "
SELECT s.id,
       COALESCE(s.entry, 0),
       COALESCE(s.entry_text, CAST(s.entry AS TEXT), ''),
       COALESCE(s.title, ''),
       COALESCE(s.title_d, ''),
       COALESCE(s.verse_order, ''),
       COALESCE(s.kytara_file, '')
  FROM songs s
";

/// Queries against the database at `db_path`, opened afresh per call.
///
/// A failed query clears `database_ready` in the borrowed status so the
/// next reconciliation re-checks the database.
#[derive(Debug)]
pub struct Catalog<'s> {
    db_path: PathBuf,
    status: &'s mut AppStatus,
}

impl<'s> Catalog<'s> {
    pub fn new(db_path: impl Into<PathBuf>, status: &'s mut AppStatus) -> Self {
        Self {
            db_path: db_path.into(),
            status,
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Songs with their verses, author credits and songbook.
    ///
    /// Songs without any verse are not listed. Unknown sort keys sort by
    /// entry number; equal keys keep insertion order.
    pub fn list_songs(&mut self, sort_key: &str, search: &str) -> QueryResult<Vec<SongSummary>> {
        let filter = SearchFilter::parse(search);
        let order = match SortKey::normalize(sort_key) {
            SortKey::Entry => "s.entry",
            SortKey::Title => "s.title",
            SortKey::AuthorMusic => "author_music",
            SortKey::AuthorLyric => "author_lyric",
        };
        let sql = format!(
            "{SONG_LIST}{}\n GROUP BY s.id\n ORDER BY {order}, MIN(v.id)",
            filter.where_clause()
        );

        self.run("list songs", |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let songs = stmt
                .query_map(params_from_iter(filter.params()), |row| {
                    Ok(SongSummary {
                        id: row.get(0)?,
                        entry_number: row.get(1)?,
                        entry_text: row.get(2)?,
                        title: row.get(3)?,
                        verses: row.get(4)?,
                        author_music: row.get(5)?,
                        author_lyric: row.get(6)?,
                        kytara_file: row.get(7)?,
                        songbook_acronym: row.get(8)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(songs)
        })
    }

    /// One row per song without verse text. Sorts by title or, for any
    /// other key, by entry number.
    pub fn list_song_headers(
        &mut self,
        sort_key: &str,
        search: &str,
    ) -> QueryResult<Vec<SongHeader>> {
        let filter = SearchFilter::parse(search);
        let order = match SortKey::normalize(sort_key) {
            SortKey::Title => "s.title",
            _ => "s.entry",
        };
        let sql = format!("{HEADER_LIST}{}\n ORDER BY {order}, s.id", filter.where_clause());

        self.run("list song headers", |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let headers = stmt
                .query_map(params_from_iter(filter.params()), |row| {
                    Ok(SongHeader {
                        id: row.get(0)?,
                        entry_number: row.get(1)?,
                        entry_text: row.get(2)?,
                        title: row.get(3)?,
                        title_normalized: row.get(4)?,
                        verse_order: row.get(5)?,
                        kytara_file: row.get(6)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(headers)
        })
    }

    /// Distinct author credits of a song, ordered by role.
    pub fn get_authors(&mut self, song_id: i64) -> QueryResult<Vec<Author>> {
        self.run("get authors", |conn| {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT author_type, COALESCE(author_value, '')
                   FROM authors
                  WHERE song_id = ?1
                  ORDER BY author_type",
            )?;
            let authors = stmt
                .query_map([song_id], |row| {
                    let role: Option<String> = row.get(0)?;
                    Ok(Author::new(AuthorRole::from_attr(role.as_deref()), row.get::<_, String>(1)?))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(authors)
        })
    }

    /// Verse texts joined by [`VERSE_SEPARATOR`]. Unknown ids give "".
    pub fn get_verses(&mut self, song_id: i64) -> QueryResult<String> {
        self.run("get verses", |conn| {
            let verses = verses(conn, song_id)?;
            Ok(verses
                .into_iter()
                .map(|v| v.lines)
                .collect::<Vec<_>>()
                .join(VERSE_SEPARATOR))
        })
    }

    /// Verse order and named verses. Unknown ids give an empty projection.
    pub fn get_projection(&mut self, song_id: i64) -> QueryResult<Projection> {
        self.run("get projection", |conn| {
            let verse_order: Option<Option<String>> = conn
                .query_row(
                    "SELECT verse_order FROM songs WHERE id = ?1",
                    [song_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(Projection {
                verse_order: verse_order.flatten().unwrap_or_default(),
                verses: verses(conn, song_id)?,
            })
        })
    }

    /// [`Catalog::get_projection`] as JSON.
    pub fn get_projection_json(&mut self, song_id: i64) -> QueryResult<String> {
        let projection = self.get_projection(song_id)?;
        let json = projection.to_json();
        if json.is_err() {
            self.status.database_ready = false;
        }
        json
    }

    fn run<T>(
        &mut self,
        operation: &str,
        query: impl FnOnce(&Connection) -> QueryResult<T>,
    ) -> QueryResult<T> {
        let result = Database::open_existing(&self.db_path)
            .map_err(|source| QueryError::Open {
                path: self.db_path.clone(),
                source,
            })
            .and_then(|db| query(db.conn()));
        if let Err(e) = &result {
            log::error!("Failed to {operation}: {e}");
            self.status.database_ready = false;
        }
        result
    }
}

fn verses(conn: &Connection, song_id: i64) -> QueryResult<Vec<ProjectionVerse>> {
    let mut stmt = conn.prepare(
        "SELECT COALESCE(name, ''), COALESCE(lines, '') FROM verses WHERE song_id = ?1 ORDER BY id",
    )?;
    let verses = stmt
        .query_map([song_id], |row| {
            Ok(ProjectionVerse {
                name: row.get(0)?,
                lines: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(verses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyra_core::model::{NewSong, Verse};
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        path: PathBuf,
    }

    fn add_song(db: &Database, title: &str, entry: i64, music: &str, verses: &[&str]) -> i64 {
        let id = db
            .insert_song(&NewSong::new("EZ", title, entry, entry.to_string()).with_verse_order("v1"))
            .unwrap();
        if !music.is_empty() {
            db.insert_author(id, &Author::new(AuthorRole::Music, music)).unwrap();
        }
        for (i, lines) in verses.iter().enumerate() {
            db.insert_verse(id, &Verse::new(format!("v{}", i + 1), *lines)).unwrap();
        }
        id
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Songs.db");
        let db = Database::open(&path).unwrap();
        add_song(&db, "Second", 2, "Bach", &["druhá sloka"]);
        add_song(&db, "First", 1, "Bach", &["první sloka", "ještě jedna"]);
        add_song(&db, "Last", 202, "Albinoni", &["Příliš žluťoučký kůň"]);
        add_song(&db, "Tichá", 20, "", &["100% jistě"]);
        Fixture { _dir: dir, path }
    }

    fn titles(songs: &[SongSummary]) -> Vec<&str> {
        songs.iter().map(|s| s.title.as_str()).collect()
    }

    #[test]
    fn test_list_songs_sorting() {
        let fx = fixture();
        let mut status = AppStatus::default();
        let mut catalog = Catalog::new(&fx.path, &mut status);

        let by_entry = catalog.list_songs("entry", "").unwrap();
        assert_eq!(titles(&by_entry), vec!["First", "Second", "Tichá", "Last"]);

        let by_title = catalog.list_songs("title", "").unwrap();
        assert_eq!(titles(&by_title), vec!["First", "Last", "Second", "Tichá"]);

        // ties on the music author keep insertion order
        let by_music = catalog.list_songs("authorMusic", "").unwrap();
        assert_eq!(titles(&by_music), vec!["Tichá", "Last", "Second", "First"]);

        let fallback = catalog.list_songs("sideways", "").unwrap();
        assert_eq!(fallback, by_entry);
    }

    #[test]
    fn test_list_songs_concatenates_verses() {
        let fx = fixture();
        let mut status = AppStatus::default();
        let mut catalog = Catalog::new(&fx.path, &mut status);

        let songs = catalog.list_songs("entry", "").unwrap();
        assert_eq!(songs[0].verses, "první sloka\n\nještě jedna");
        assert_eq!(songs[0].author_music, "Bach");
        assert_eq!(songs[0].author_lyric, "");
        assert_eq!(songs[0].songbook_acronym, "EZ");
        assert_eq!(songs[0].entry_text, "1");
    }

    #[test]
    fn test_search_rules() {
        let fx = fixture();
        let mut status = AppStatus::default();
        let mut catalog = Catalog::new(&fx.path, &mut status);

        let exact = catalog.list_songs("entry", "202").unwrap();
        assert_eq!(titles(&exact), vec!["Last"]);
        assert_eq!(titles(&catalog.list_songs("entry", "20").unwrap()), vec!["Tichá"]);

        assert_eq!(catalog.list_songs("entry", "xy").unwrap().len(), 4);

        let text = catalog.list_songs("entry", "ZLUTOUCKY").unwrap();
        assert_eq!(titles(&text), vec!["Last"]);
        let author = catalog.list_songs("entry", "albín").unwrap();
        assert_eq!(titles(&author), vec!["Last"]);
        let title = catalog.list_songs("entry", "tich").unwrap();
        assert_eq!(titles(&title), vec!["Tichá"]);
    }

    #[test]
    fn test_search_matches_all_verses_of_song() {
        let fx = fixture();
        let mut status = AppStatus::default();
        let mut catalog = Catalog::new(&fx.path, &mut status);

        let songs = catalog.list_songs("entry", "jeste").unwrap();
        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].verses, "první sloka\n\nještě jedna");
    }

    #[test]
    fn test_like_wildcards_are_literal() {
        let fx = fixture();
        let mut status = AppStatus::default();
        let mut catalog = Catalog::new(&fx.path, &mut status);

        assert_eq!(titles(&catalog.list_songs("entry", "0% j").unwrap()), vec!["Tichá"]);
        assert!(catalog.list_songs("entry", "s_o").unwrap().is_empty());
    }

    #[test]
    fn test_song_headers() {
        let fx = fixture();
        let mut status = AppStatus::default();
        let mut catalog = Catalog::new(&fx.path, &mut status);

        let headers = catalog.list_song_headers("authorMusic", "").unwrap();
        let entries: Vec<i64> = headers.iter().map(|h| h.entry_number).collect();
        assert_eq!(entries, vec![1, 2, 20, 202]);

        let headers = catalog.list_song_headers("title", "sloka").unwrap();
        let names: Vec<&str> = headers.iter().map(|h| h.title.as_str()).collect();
        assert_eq!(names, vec!["First", "Second"]);
        assert_eq!(headers[0].verse_order, "v1");
        assert_eq!(headers[0].title_normalized, "First");
    }

    #[test]
    fn test_authors_verses_and_projection() {
        let fx = fixture();
        let db = Database::open(&fx.path).unwrap();
        let id = db.find_song_id("EZ", 1).unwrap().unwrap();
        db.insert_author(id, &Author::new(AuthorRole::Words, "Komenský")).unwrap();
        db.insert_author(id, &Author::new(AuthorRole::Music, "Bach")).unwrap();
        drop(db);

        let mut status = AppStatus::default();
        let mut catalog = Catalog::new(&fx.path, &mut status);

        let authors = catalog.get_authors(id).unwrap();
        assert_eq!(
            authors,
            vec![
                Author::new(AuthorRole::Music, "Bach"),
                Author::new(AuthorRole::Words, "Komenský"),
            ]
        );

        assert_eq!(catalog.get_verses(id).unwrap(), "první sloka===ještě jedna");

        let projection = catalog.get_projection(id).unwrap();
        assert_eq!(projection.verse_order, "v1");
        assert_eq!(projection.verses.len(), 2);
        assert_eq!(projection.verses[1].name, "v2");
    }

    #[test]
    fn test_unknown_song_is_empty() {
        let fx = fixture();
        let mut status = AppStatus::default();
        let mut catalog = Catalog::new(&fx.path, &mut status);

        assert_eq!(catalog.get_verses(9999).unwrap(), "");
        assert!(catalog.get_projection(9999).unwrap().is_empty());
        assert!(catalog.get_authors(9999).unwrap().is_empty());
        assert_eq!(
            catalog.get_projection_json(9999).unwrap(),
            r#"{"verse_order":"","verses":[]}"#
        );
    }

    #[test]
    fn test_missing_database_clears_ready_flag() {
        let dir = tempfile::tempdir().unwrap();
        let mut status = AppStatus {
            database_ready: true,
            ..AppStatus::default()
        };

        let mut catalog = Catalog::new(dir.path().join("absent.db"), &mut status);
        let result = catalog.list_songs("entry", "");
        assert!(matches!(result, Err(QueryError::Open { .. })));
        assert!(!dir.path().join("absent.db").exists());
        drop(catalog);

        assert!(!status.database_ready);
    }
}
