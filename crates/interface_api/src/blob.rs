//! Local filesystem blob store
//!
//! Development/default implementation of the blob-store port: files land in
//! a directory and are served under a configured public base URL. The
//! platform's real media service sits behind the same trait.

use std::path::PathBuf;

use async_trait::async_trait;
use uuid::Uuid;

use core_kernel::{DomainPort, PortError};
use domain_payment::{BlobStore, FileUpload};

/// Blob store writing to a local directory
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    base_dir: PathBuf,
    public_base_url: String,
}

impl LocalBlobStore {
    pub fn new(base_dir: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            public_base_url: public_base_url.into(),
        }
    }

    fn io_error(message: &str, err: std::io::Error) -> PortError {
        PortError::Internal {
            message: message.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl DomainPort for LocalBlobStore {}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn upload(&self, file: &FileUpload, folder: &str) -> Result<String, PortError> {
        // Stored name is unique; the original filename only survives in its
        // extension
        let extension = std::path::Path::new(&file.filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin");
        let stored_name = format!("{}.{}", Uuid::new_v4(), extension);

        let dir = self.base_dir.join(folder);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| Self::io_error("could not create blob directory", e))?;

        tokio::fs::write(dir.join(&stored_name), &file.bytes)
            .await
            .map_err(|e| Self::io_error("could not write blob", e))?;

        Ok(format!(
            "{}/{}/{}",
            self.public_base_url, folder, stored_name
        ))
    }

    async fn delete(&self, url: &str) -> Result<(), PortError> {
        let Some(relative) = url.strip_prefix(&self.public_base_url) else {
            return Err(PortError::validation(format!(
                "url {} does not belong to this blob store",
                url
            )));
        };
        let path = self.base_dir.join(relative.trim_start_matches('/'));

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_error("could not delete blob", e)),
        }
    }
}
