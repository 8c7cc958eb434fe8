//! Error taxonomy for an import session

use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop an import
///
/// Per-row persistence problems are not errors: they are reported by the
/// record store as [`crate::import::ImportOutcome::Errored`] and only counted.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The upload was missing, unreadable or had the wrong extension
    #[error("Invalid file for import: {0}")]
    UploadValidation(String),

    /// The upload could not be staged into the upload directory
    #[error("{heading} Destination: {}", destination.display())]
    FileSystem {
        heading: String,
        destination: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A data row does not have as many fields as the working schema has columns
    #[error(
        "The number of items in line {line} is incorrect. There are {actual} and there should be {expected}."
    )]
    SchemaMismatch {
        line: u64,
        expected: usize,
        actual: usize,
    },

    /// The header row names columns the target schema does not know
    #[error("The header names unknown columns: {}", .0.join(", "))]
    UnknownColumns(Vec<String>),

    /// The header row names the same column more than once
    #[error("The header names columns more than once: {}", .0.join(", "))]
    DuplicateColumns(Vec<String>),

    /// The record store failed in a way that makes further rows pointless
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ImportError {
    /// Short headline for the consolidated report
    pub fn heading(&self) -> &str {
        match self {
            ImportError::UploadValidation(_) => "Invalid file for import.",
            ImportError::FileSystem { heading, .. } => heading,
            ImportError::SchemaMismatch { .. } => "Import stopped: wrong number of fields.",
            ImportError::UnknownColumns(_) | ImportError::DuplicateColumns(_) => {
                "Import stopped: the header row does not match the table."
            }
            ImportError::Store(_) => "Import stopped: the record store failed.",
        }
    }
}

/// Unrecoverable failure reported by a [`crate::import::RecordStore`]
#[derive(Debug, Error)]
#[error("Error occurred while trying to add the data to the database: {message}")]
pub struct StoreError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_mismatch_message_cites_line_and_counts() {
        let err = ImportError::SchemaMismatch {
            line: 4,
            expected: 3,
            actual: 2,
        };
        let message = err.to_string();
        assert!(message.contains("line 4"));
        assert!(message.contains("There are 2"));
        assert!(message.contains("should be 3"));
    }

    #[test]
    fn test_file_system_error_names_destination() {
        let err = ImportError::FileSystem {
            heading: "There was an error uploading the file.".to_string(),
            destination: PathBuf::from("/uploads/data.csv"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.heading(), "There was an error uploading the file.");
        assert!(err.to_string().contains("/uploads/data.csv"));
    }
}
