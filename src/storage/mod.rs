//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - classes(identifier, attributes)
//! - nodes(identifier, class_id, attributes)
//! - edges(id, source_id, destination_id, type)

pub mod schema;
pub mod sqlite;

pub use sqlite::{SqliteStore, DbStats};
