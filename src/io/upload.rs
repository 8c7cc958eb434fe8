use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use super::file_store::FileStore;
use super::uri::UploadSource;
use crate::config::{ALLOWED_EXTENSION, MAX_IMPORT_BYTES};
use crate::error::ImportError;

/// An upload that passed validation and was copied into the upload area
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub path: PathBuf,
    /// File name as uploaded, for the report
    pub original_name: String,
}

/// Check that an upload is acceptable for import
///
/// Returns the sanitized file name to stage it under.
pub async fn validate_upload(source: &Path) -> Result<String, ImportError> {
    let file_name = source
        .file_name()
        .map(|name| sanitize_file_name(&name.to_string_lossy()))
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ImportError::UploadValidation("no file was given".to_string()))?;

    let extension = Path::new(&file_name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
    if extension.as_deref() != Some(ALLOWED_EXTENSION) {
        return Err(ImportError::UploadValidation(format!(
            "'{}' is not a .{} file",
            file_name, ALLOWED_EXTENSION
        )));
    }

    let metadata = fs::metadata(source).await.map_err(|e| {
        ImportError::UploadValidation(format!("cannot read '{}': {}", source.display(), e))
    })?;
    if !metadata.is_file() {
        return Err(ImportError::UploadValidation(format!(
            "'{}' is not a file",
            source.display()
        )));
    }
    if metadata.len() > MAX_IMPORT_BYTES {
        return Err(ImportError::UploadValidation(format!(
            "'{}' is {} bytes; the limit is {} bytes",
            file_name,
            metadata.len(),
            MAX_IMPORT_BYTES
        )));
    }

    Ok(file_name)
}

/// Validate an upload and stage it through the file store
pub async fn stage_upload(
    uri: &str,
    file_store: &dyn FileStore,
) -> Result<StagedFile, ImportError> {
    let source = UploadSource::parse(uri)?;
    let file_name = validate_upload(source.path()).await?;
    let path = file_store.stage(source.path(), &file_name).await?;

    info!("The file {} has been uploaded to {}", file_name, path.display());
    Ok(StagedFile {
        path,
        original_name: file_name,
    })
}

/// Keep only characters that are safe in a file name on any platform
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();
    cleaned.trim_matches(|c| c == '.' || c == '-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::LocalFileStore;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("my list (1).csv"), "my-list--1-.csv");
        assert_eq!(sanitize_file_name("..hidden.csv"), "hidden.csv");
    }

    #[tokio::test]
    async fn test_csv_extension_is_required() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "data.txt", "a,b\n");

        let err = validate_upload(&path).await.unwrap_err();
        assert!(matches!(err, ImportError::UploadValidation(_)));
        assert_eq!(err.heading(), "Invalid file for import.");
    }

    #[tokio::test]
    async fn test_extension_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "DATA.CSV", "a,b\n");
        assert_eq!(validate_upload(&path).await.unwrap(), "DATA.CSV");
    }

    #[tokio::test]
    async fn test_missing_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let err = validate_upload(&dir.path().join("absent.csv"))
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::UploadValidation(_)));
    }

    #[tokio::test]
    async fn test_directory_is_rejected() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("folder.csv");
        std::fs::create_dir(&sub).unwrap();
        assert!(validate_upload(&sub).await.is_err());
    }

    #[tokio::test]
    async fn test_stage_upload_copies_into_upload_dir() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "people.csv", "name\nAnn\n");
        let store = LocalFileStore::new(dir.path().join("uploads"));

        let staged = stage_upload(path.to_str().unwrap(), &store).await.unwrap();

        assert_eq!(staged.original_name, "people.csv");
        assert!(staged.path.starts_with(dir.path().join("uploads")));
        assert_eq!(std::fs::read_to_string(&staged.path).unwrap(), "name\nAnn\n");
    }
}
