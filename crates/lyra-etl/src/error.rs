//! Error types for parsing, importing and status handling.

use std::path::PathBuf;
use thiserror::Error;

/// A song file could not be turned into a [`crate::parse::ParsedSong`].
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed XML near byte {position}: {source}")]
    Xml {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    /// The document parsed but its root element is not `<song>`.
    #[error("document has no <song> root element")]
    MissingRoot,
}

/// Errors that abort a songbook import. Problems with a single file are
/// logged and counted instead.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("required songbook {acronym} not found at {}", path.display())]
    MissingSongbook { acronym: String, path: PathBuf },

    #[error("no song files in {}", path.display())]
    NoFiles { acronym: String, path: PathBuf },

    #[error("failed to list {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to register songbook {acronym}: {source}")]
    Songbook {
        acronym: String,
        #[source]
        source: lyra_core::Error,
    },

    #[error("unknown songbook {0}")]
    UnknownSongbook(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("database error: {0}")]
    Database(#[from] lyra_core::Error),
}

/// Downloading a supplemental file failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The background task ended without reporting a result.
    #[error("background fetch did not complete: {0}")]
    Interrupted(String),
}

/// Reading or writing the status file failed.
#[derive(Debug, Error)]
pub enum StatusError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize status: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("database error: {0}")]
    Database(#[from] lyra_core::Error),
}

pub type IngestResult<T> = std::result::Result<T, IngestError>;
