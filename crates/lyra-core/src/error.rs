use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("migration error: {0}")]
    Migration(#[from] MigrationError),
}

/// Errors raised while creating or upgrading the schema.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// No migration is registered that reaches this version.
    #[error("unknown schema version {0}: no migration reaches it")]
    UnknownVersion(u32),

    /// A DDL or backfill statement failed while migrating to `version`.
    #[error("migration to version {version} failed: {source}")]
    Step {
        version: u32,
        #[source]
        source: rusqlite::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
