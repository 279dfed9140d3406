//! Songbook import for lyra.
//!
//! Parses OpenLyrics (EZ) and OpenSong (KK) song files, stores them through
//! [`lyra_core::Database`], keeps the persisted [`lyra_core::model::AppStatus`]
//! in line with what is on disk, and fetches the supplemental PDFs.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod ingest;
pub mod parse;
pub mod status;
pub mod supplemental;

pub use config::{Config, LoggingConfig};
pub use error::{FetchError, IngestError, IngestResult, ParseError, StatusError};
pub use ingest::{ImportOptions, ImportReport, Importer, Progress, SongbookReport, SongbookSource};
pub use parse::{Dialect, ParsedSong};
pub use status::{Reconciliation, StatusReconciler, StatusStore};
pub use supplemental::{BackgroundFetch, FetchReport, SupplementalPdf};
