use std::path::PathBuf;
use thiserror::Error;

/// A query against the song database failed.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("failed to open database {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: lyra_core::Error,
    },

    #[error("query failed: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type QueryResult<T> = std::result::Result<T, QueryError>;
