//! Versioned SQLite schema and the database handle.

pub mod db;
pub mod migrations;
pub mod versions;

pub use db::Database;
pub use migrations::{
    apply_migration, detect_version, initialize, initialize_to, reset, CURRENT_VERSION,
};
pub use versions::SchemaDescription;
