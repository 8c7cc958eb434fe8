//! Delimited file formats: dialect detection and row parsing

pub mod delimited;
pub mod dialect;
pub mod reader;

pub use delimited::{ParseDiagnostic, RecordParser};
pub use reader::{Dialect, RawRow};
