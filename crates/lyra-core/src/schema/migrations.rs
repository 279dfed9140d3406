use rusqlite::Connection;

use crate::error::{Error, MigrationError, Result};

use super::versions::{self, V1, V2};

/// The schema version this build reads and writes.
pub const CURRENT_VERSION: u32 = 2;

/// Songbook that pre-songbook databases are assigned to.
pub const DEFAULT_SONGBOOK_ACRONYM: &str = "EZ";
pub const DEFAULT_SONGBOOK_NAME: &str = "Evangelický zpěvník 2021";

/// A schema migration: `apply` moves the database from `version - 1` to
/// `version`.
#[derive(Debug)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub apply: fn(&Connection) -> rusqlite::Result<()>,
}

pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 2,
    name: "songbooks",
    apply: migrate_to_v2,
}];

fn migrate_to_v2(conn: &Connection) -> rusqlite::Result<()> {
    versions::apply_description(conn, &V2)?;
    conn.execute(
        "INSERT OR IGNORE INTO songbooks (songbook_acronym, name) VALUES (?1, ?2)",
        [DEFAULT_SONGBOOK_ACRONYM, DEFAULT_SONGBOOK_NAME],
    )?;
    let backfilled = conn.execute(
        "UPDATE songs SET songbook_acronym = ?1 WHERE songbook_acronym IS NULL",
        [DEFAULT_SONGBOOK_ACRONYM],
    )?;
    if backfilled > 0 {
        log::info!("Assigned {backfilled} existing songs to songbook {DEFAULT_SONGBOOK_ACRONYM}");
    }
    Ok(())
}

/// Detect the schema version of an open database.
///
/// With a ledger the highest recorded version wins (an empty ledger reads
/// as 1); a bare `songs` table is the legacy layout; nothing at all is 0.
pub fn detect_version(conn: &Connection) -> Result<u32> {
    if versions::table_exists(conn, "schema_version")? {
        let max: Option<i64> =
            conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                row.get(0)
            })?;
        return match max {
            Some(v) => u32::try_from(v)
                .map_err(|_| Error::InvalidData(format!("schema version {v} out of range"))),
            None => Ok(1),
        };
    }
    if versions::table_exists(conn, "songs")? {
        return Ok(1);
    }
    Ok(0)
}

/// Create the legacy tables. Only used on an empty database, which then
/// migrates forward like any other.
pub fn create_v1(conn: &Connection) -> Result<()> {
    versions::apply_description(conn, &V1)
        .map_err(|source| MigrationError::Step { version: 1, source })?;
    Ok(())
}

/// Run a single migration and record it in the ledger, atomically.
pub fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    let migration = MIGRATIONS
        .iter()
        .find(|m| m.version == version)
        .ok_or(MigrationError::UnknownVersion(version))?;

    log::info!("Applying migration {} ({})", migration.version, migration.name);

    let step = |source| MigrationError::Step { version, source };
    let tx = conn.unchecked_transaction().map_err(step)?;
    (migration.apply)(&tx).map_err(step)?;
    tx.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [version],
    )
    .map_err(step)?;
    tx.commit().map_err(step)?;
    Ok(())
}

/// Bring the database to [`CURRENT_VERSION`]. Returns the resulting version.
pub fn initialize(conn: &Connection) -> Result<u32> {
    initialize_to(conn, CURRENT_VERSION)
}

/// Bring the database to `target`. A database already at or past the
/// target is left untouched.
pub fn initialize_to(conn: &Connection, target: u32) -> Result<u32> {
    let mut version = detect_version(conn)?;
    if version >= target {
        log::debug!("Schema at version {version}, nothing to do");
        return Ok(version);
    }

    if version == 0 {
        log::info!("Creating schema");
        create_v1(conn)?;
        version = 1;
    }

    for next in (version + 1)..=target {
        apply_migration(conn, next)?;
        version = next;
    }
    Ok(version)
}

/// Drop every table and rebuild the schema from scratch.
pub fn reset(conn: &Connection) -> Result<u32> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
    )?;
    let tables: Vec<String> = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    drop(stmt);

    log::warn!("Dropping {} tables", tables.len());

    // foreign_keys cannot change inside a transaction
    conn.execute_batch("PRAGMA foreign_keys = OFF")?;
    let dropped = (|| -> rusqlite::Result<()> {
        let tx = conn.unchecked_transaction()?;
        for table in &tables {
            tx.execute_batch(&format!("DROP TABLE IF EXISTS \"{table}\""))?;
        }
        tx.commit()
    })();
    conn.execute_batch("PRAGMA foreign_keys = ON")?;
    dropped?;

    initialize(conn)
}
