use std::path::PathBuf;
use url::Url;

use crate::error::ImportError;

/// Represents a parsed upload location
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadSource {
    Local(PathBuf),
}

impl UploadSource {
    /// Parse a path or `file://` URI
    pub fn parse(uri: &str) -> Result<Self, ImportError> {
        if uri.trim().is_empty() {
            return Err(ImportError::UploadValidation(
                "no file was given".to_string(),
            ));
        }

        // Try parsing as URL first
        match Url::parse(uri) {
            // Single-letter schemes are Windows drive letters, not URLs
            Ok(url) if url.scheme().len() > 1 => match url.scheme() {
                "file" => {
                    let path = url.to_file_path().map_err(|_| {
                        ImportError::UploadValidation(format!("invalid file:// URI: {}", uri))
                    })?;
                    Ok(UploadSource::Local(path))
                }
                scheme => Err(ImportError::UploadValidation(format!(
                    "unsupported URI scheme: {}",
                    scheme
                ))),
            },
            // Treat as local file path
            _ => Ok(UploadSource::Local(PathBuf::from(uri))),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        match self {
            UploadSource::Local(path) => path,
        }
    }
}
