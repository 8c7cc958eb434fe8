// Public API - the import engine and the runner that wires it to SQLite
pub mod error;
pub mod formats;
pub mod import;
pub mod runner;

// Internal modules - organized by subsystem
mod config;
mod db;
mod io;

pub use db::{DuplicatePolicy, SqliteRecordStore, TableSchema};
pub use io::{FileStore, LocalFileStore};
