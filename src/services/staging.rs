use crate::error::UploadError;
use crate::models::{EncodedPayload, PickedFile};
use crate::utils::validation::sanitize_filename;
use async_trait::async_trait;
use bytes::Bytes;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Local filesystem primitives the staging step needs.
#[async_trait]
pub trait FileSystem: Send + Sync {
    async fn copy(&self, src: &Path, dst: &Path) -> io::Result<u64>;
    async fn load_bytes(&self, path: &Path) -> io::Result<Bytes>;
    async fn remove(&self, path: &Path) -> io::Result<()>;
}

pub struct TokioFileSystem;

#[async_trait]
impl FileSystem for TokioFileSystem {
    async fn copy(&self, src: &Path, dst: &Path) -> io::Result<u64> {
        if let Some(parent) = dst.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        // Copying a file onto itself truncates it.
        if src == dst {
            return Ok(tokio::fs::metadata(src).await?.len());
        }
        tokio::fs::copy(src, dst).await
    }

    async fn load_bytes(&self, path: &Path) -> io::Result<Bytes> {
        Ok(Bytes::from(tokio::fs::read(path).await?))
    }

    async fn remove(&self, path: &Path) -> io::Result<()> {
        tokio::fs::remove_file(path).await
    }
}

/// Resolves a picked file handle to a path. Accepts `file://` URLs and plain paths.
pub fn source_path(uri: &str) -> Result<PathBuf, UploadError> {
    if uri.starts_with("file:") {
        let url = url::Url::parse(uri)
            .map_err(|e| UploadError::StagingFailure(format!("Invalid file URI '{}': {}", uri, e)))?;
        return url
            .to_file_path()
            .map_err(|_| UploadError::StagingFailure(format!("URI '{}' is not a local file", uri)));
    }
    if uri.contains("://") {
        return Err(UploadError::StagingFailure(format!(
            "Unsupported URI scheme in '{}'",
            uri
        )));
    }
    Ok(PathBuf::from(uri))
}

/// Copies picked files into scratch space and loads them for transmission.
pub struct StagingEncoder {
    fs: Arc<dyn FileSystem>,
    staging_dir: PathBuf,
}

impl StagingEncoder {
    pub fn new(fs: Arc<dyn FileSystem>, staging_dir: PathBuf) -> Self {
        Self { fs, staging_dir }
    }

    /// Scratch location for a picked file, keyed by its original name.
    pub fn cache_path(&self, file: &PickedFile) -> Result<PathBuf, UploadError> {
        let name = sanitize_filename(&file.name)
            .map_err(|e| UploadError::StagingFailure(e.to_string()))?;
        Ok(self.staging_dir.join(name))
    }

    pub async fn stage(&self, file: &PickedFile) -> Result<EncodedPayload, UploadError> {
        let src = source_path(&file.uri)?;
        let dst = self.cache_path(file)?;

        tracing::debug!("Staging {} -> {}", src.display(), dst.display());

        self.fs.copy(&src, &dst).await.map_err(|e| {
            UploadError::StagingFailure(format!(
                "Copy {} -> {} failed: {}",
                src.display(),
                dst.display(),
                e
            ))
        })?;

        let bytes = match self.fs.load_bytes(&dst).await {
            Ok(bytes) => bytes,
            Err(e) => {
                if dst != src
                    && let Err(remove_err) = self.fs.remove(&dst).await
                {
                    tracing::warn!(
                        "Failed to remove staged file {}: {}",
                        dst.display(),
                        remove_err
                    );
                }
                return Err(UploadError::StagingFailure(format!(
                    "Read {} failed: {}",
                    dst.display(),
                    e
                )));
            }
        };

        let content_type = file
            .mime_type
            .clone()
            .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string());

        Ok(EncodedPayload {
            bytes,
            content_type,
            source_path: src,
            staged_path: dst,
        })
    }

    /// Drops the scratch copy. Failures are only logged.
    pub async fn discard(&self, payload: &EncodedPayload) {
        if payload.staged_path == payload.source_path {
            return;
        }
        if let Err(e) = self.fs.remove(&payload.staged_path).await {
            tracing::warn!(
                "Failed to remove staged file {}: {}",
                payload.staged_path.display(),
                e
            );
        }
    }
}
