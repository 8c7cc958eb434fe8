use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::warn;
use uuid::Uuid;

use crate::error::ImportError;

/// Storage for uploaded files while they are imported
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Place a copy of `source` in the upload area and return its new path
    ///
    /// A copy that fails partway leaves nothing behind in the upload area.
    async fn stage(&self, source: &Path, file_name: &str) -> Result<PathBuf, ImportError>;

    /// Read a staged file in full
    async fn read(&self, path: &Path) -> std::io::Result<Vec<u8>>;

    /// Remove a staged file
    async fn delete(&self, path: &Path) -> std::io::Result<()>;
}

/// FileStore implementation for a local upload directory
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    upload_dir: PathBuf,
}

impl LocalFileStore {
    pub fn new(upload_dir: impl AsRef<Path>) -> Self {
        Self {
            upload_dir: upload_dir.as_ref().to_path_buf(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn stage(&self, source: &Path, file_name: &str) -> Result<PathBuf, ImportError> {
        fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|source| ImportError::FileSystem {
                heading: "Target directory does not exist and could not be created. Try creating it manually."
                    .to_string(),
                destination: self.upload_dir.clone(),
                source,
            })?;

        // Prefix with a unique id so concurrent uploads of the same name never collide
        let target = self
            .upload_dir
            .join(format!("{}-{}", Uuid::new_v4().simple(), file_name));

        let upload_error = |source: std::io::Error| ImportError::FileSystem {
            heading: "There was an error uploading the file. This could be a problem with permissions on the uploads directory."
                .to_string(),
            destination: target.clone(),
            source,
        };

        let reader = File::open(source).await.map_err(upload_error)?;
        write_staged(reader, &target).await.map_err(upload_error)?;

        Ok(target)
    }

    async fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        fs::read(path).await
    }

    async fn delete(&self, path: &Path) -> std::io::Result<()> {
        fs::remove_file(path).await
    }
}

/// Write `reader` to `target`, removing the target again if the copy fails
async fn write_staged(mut reader: impl AsyncRead + Unpin, target: &Path) -> std::io::Result<()> {
    let result = async {
        let mut file = File::create(target).await?;
        tokio::io::copy(&mut reader, &mut file).await?;
        file.flush().await
    }
    .await;

    if result.is_err()
        && let Err(e) = fs::remove_file(target).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!("Could not remove partial upload {}: {}", target.display(), e);
    }
    result
}
