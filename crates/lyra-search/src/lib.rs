//! Song queries for lyra.
//!
//! Lists and searches the imported songs with diacritics-insensitive
//! matching, and reads single songs for display and projection.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod catalog;
pub mod error;
pub mod filter;
pub mod model;

pub use catalog::Catalog;
pub use error::{QueryError, QueryResult};
pub use filter::SearchFilter;
pub use model::{Projection, ProjectionVerse, SongHeader, SongSummary};
