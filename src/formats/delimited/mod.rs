//! Quoting-aware reader for delimited text

pub mod reader;

pub use reader::{ParseDiagnostic, RecordParser};
