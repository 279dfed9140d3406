//! Core domain model for lyra.
//!
//! This crate defines the songbook data model (songbooks, songs, authors,
//! verses), the versioned SQLite schema with its migrations, the persisted
//! application status and the diacritics normalizer used for search keys.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod model;
pub mod normalize;
pub mod schema;

pub use error::{Error, MigrationError, Result};
pub use normalize::remove_diacritics;
pub use schema::Database;
