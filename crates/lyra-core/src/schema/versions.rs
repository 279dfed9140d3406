//! Table layouts of every schema version.
//!
//! Each version is described explicitly so creation, column backfill and
//! conformance checks all read from the same table list.

use rusqlite::Connection;

/// A column: name plus the SQL definition that follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub definition: &'static str,
}

/// A table and everything needed to create it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    pub name: &'static str,
    pub columns: &'static [ColumnSpec],

    /// Table constraints appended after the columns (foreign keys, checks).
    pub constraints: &'static [&'static str],
}

/// A secondary index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: &'static str,
    pub table: &'static str,
    pub columns: &'static str,
}

/// The complete layout of one schema version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaDescription {
    pub version: u32,
    pub tables: &'static [TableSpec],
    pub indexes: &'static [IndexSpec],
}

const fn col(name: &'static str, definition: &'static str) -> ColumnSpec {
    ColumnSpec { name, definition }
}

const SONGS_V1: TableSpec = TableSpec {
    name: "songs",
    columns: &[
        col("id", "INTEGER PRIMARY KEY AUTOINCREMENT"),
        col("entry", "INTEGER"),
        col("title", "TEXT"),
        col("title_d", "TEXT"),
        col("verse_order", "TEXT"),
        col("kytara_file", "TEXT"),
    ],
    constraints: &[],
};

const SONGS_V2: TableSpec = TableSpec {
    name: "songs",
    columns: &[
        col("id", "INTEGER PRIMARY KEY AUTOINCREMENT"),
        col("entry", "INTEGER"),
        col("title", "TEXT"),
        col("title_d", "TEXT"),
        col("verse_order", "TEXT"),
        col("kytara_file", "TEXT"),
        col("songbook_acronym", "TEXT REFERENCES songbooks(songbook_acronym)"),
        col("entry_text", "TEXT"),
        col("notes_file", "TEXT"),
    ],
    constraints: &[],
};

const AUTHORS: TableSpec = TableSpec {
    name: "authors",
    columns: &[
        col("id", "INTEGER PRIMARY KEY AUTOINCREMENT"),
        col("song_id", "INTEGER"),
        col("author_type", "TEXT"),
        col("author_value", "TEXT"),
        col("author_value_d", "TEXT"),
    ],
    constraints: &["FOREIGN KEY(song_id) REFERENCES songs(id) ON DELETE CASCADE"],
};

const VERSES: TableSpec = TableSpec {
    name: "verses",
    columns: &[
        col("id", "INTEGER PRIMARY KEY AUTOINCREMENT"),
        col("song_id", "INTEGER"),
        col("name", "TEXT"),
        col("lines", "TEXT"),
        col("lines_d", "TEXT"),
    ],
    constraints: &["FOREIGN KEY(song_id) REFERENCES songs(id) ON DELETE CASCADE"],
};

const SONGBOOKS: TableSpec = TableSpec {
    name: "songbooks",
    columns: &[
        col("songbook_acronym", "TEXT PRIMARY KEY NOT NULL"),
        col("name", "TEXT NOT NULL"),
    ],
    constraints: &["CHECK(length(songbook_acronym) <= 10)"],
};

const SCHEMA_VERSION: TableSpec = TableSpec {
    name: "schema_version",
    columns: &[
        col("version", "INTEGER PRIMARY KEY"),
        col("applied_at", "DATETIME DEFAULT CURRENT_TIMESTAMP"),
    ],
    constraints: &[],
};

const INDEXES_V1: &[IndexSpec] = &[
    IndexSpec { name: "idx_songs_entry", table: "songs", columns: "entry" },
    IndexSpec { name: "idx_songs_title_d", table: "songs", columns: "title_d" },
    IndexSpec { name: "idx_authors_song_id", table: "authors", columns: "song_id" },
    IndexSpec { name: "idx_authors_value_d", table: "authors", columns: "author_value_d" },
    IndexSpec { name: "idx_verses_song_id", table: "verses", columns: "song_id" },
    IndexSpec { name: "idx_verses_lines_d", table: "verses", columns: "lines_d" },
];

const INDEXES_V2: &[IndexSpec] = &[
    IndexSpec { name: "idx_songs_entry", table: "songs", columns: "entry" },
    IndexSpec { name: "idx_songs_title_d", table: "songs", columns: "title_d" },
    IndexSpec { name: "idx_authors_song_id", table: "authors", columns: "song_id" },
    IndexSpec { name: "idx_authors_value_d", table: "authors", columns: "author_value_d" },
    IndexSpec { name: "idx_verses_song_id", table: "verses", columns: "song_id" },
    IndexSpec { name: "idx_verses_lines_d", table: "verses", columns: "lines_d" },
    IndexSpec {
        name: "idx_songs_songbook_acronym",
        table: "songs",
        columns: "songbook_acronym",
    },
    IndexSpec { name: "idx_songs_entry_text", table: "songs", columns: "entry_text" },
];

/// Legacy layout: songs, authors and verses without songbooks.
pub const V1: SchemaDescription = SchemaDescription {
    version: 1,
    tables: &[SONGS_V1, AUTHORS, VERSES],
    indexes: INDEXES_V1,
};

/// Current layout: songbooks, per-songbook songs and the version ledger.
pub const V2: SchemaDescription = SchemaDescription {
    version: 2,
    tables: &[SONGBOOKS, SONGS_V2, AUTHORS, VERSES, SCHEMA_VERSION],
    indexes: INDEXES_V2,
};

impl TableSpec {
    /// `CREATE TABLE IF NOT EXISTS` statement for this table.
    #[must_use]
    pub fn create_sql(&self) -> String {
        let mut parts: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("{} {}", c.name, c.definition))
            .collect();
        parts.extend(self.constraints.iter().map(|c| (*c).to_string()));
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
            self.name,
            parts.join(",\n    ")
        )
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }
}

impl IndexSpec {
    #[must_use]
    pub fn create_sql(&self) -> String {
        format!(
            "CREATE INDEX IF NOT EXISTS {} ON {}({})",
            self.name, self.table, self.columns
        )
    }
}

impl SchemaDescription {
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&TableSpec> {
        self.tables.iter().find(|t| t.name == name)
    }
}

pub fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn column_exists(conn: &Connection, table: &str, column: &str) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2",
        [table, column],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Add the columns of `table` that the live table lacks. Returns the names
/// of the added columns.
pub fn add_missing_columns(
    conn: &Connection,
    table: &TableSpec,
) -> rusqlite::Result<Vec<&'static str>> {
    let mut added = Vec::new();
    for column in table.columns {
        if !column_exists(conn, table.name, column.name)? {
            conn.execute_batch(&format!(
                "ALTER TABLE {} ADD COLUMN {} {}",
                table.name, column.name, column.definition
            ))?;
            log::debug!("Added column {}.{}", table.name, column.name);
            added.push(column.name);
        }
    }
    Ok(added)
}

/// Bring the live database up to the layout of `description`: create
/// missing tables, add missing columns, create missing indexes.
pub fn apply_description(
    conn: &Connection,
    description: &SchemaDescription,
) -> rusqlite::Result<()> {
    for table in description.tables {
        if table_exists(conn, table.name)? {
            add_missing_columns(conn, table)?;
        } else {
            conn.execute_batch(&table.create_sql())?;
        }
    }
    for index in description.indexes {
        conn.execute_batch(&index.create_sql())?;
    }
    Ok(())
}

/// Whether every table and column of `description` exists in the database.
pub fn conforms(conn: &Connection, description: &SchemaDescription) -> rusqlite::Result<bool> {
    for table in description.tables {
        if !table_exists(conn, table.name)? {
            return Ok(false);
        }
        for column in table.columns {
            if !column_exists(conn, table.name, column.name)? {
                return Ok(false);
            }
        }
    }
    Ok(true)
}
