//! I/O layer for accepting uploads and holding them while they are imported

pub mod file_store;
pub mod upload;
pub mod uri;

pub use file_store::{FileStore, LocalFileStore};
pub use upload::stage_upload;
