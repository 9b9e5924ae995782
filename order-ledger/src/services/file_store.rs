//! File storage for invoices and proof documents
//!
//! The ledger uploads first and records the returned reference only after
//! the upload succeeded.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Maximum upload size (10MB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFileRef {
    pub url: String,
    /// Identifier inside the store (the destination path for local storage)
    pub storage_id: String,
    pub content_type: String,
    /// SHA-256 of the content (hex)
    pub sha256: String,
    pub size: usize,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Empty file")]
    Empty,

    #[error("File too large ({size} bytes, max {max})")]
    TooLarge { size: usize, max: usize },

    #[error("Invalid destination: {0}")]
    InvalidDestination(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Upload rejected: {0}")]
    Rejected(String),
}

/// Destination-addressed blob store
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn upload(&self, bytes: Vec<u8>, destination: &str) -> Result<StoredFileRef, UploadError>;
}

/// Calculate SHA256 hash of data
pub fn calculate_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Validate size limits common to every store
pub fn validate_upload(bytes: &[u8]) -> Result<(), UploadError> {
    if bytes.is_empty() {
        return Err(UploadError::Empty);
    }
    if bytes.len() > MAX_UPLOAD_SIZE {
        return Err(UploadError::TooLarge {
            size: bytes.len(),
            max: MAX_UPLOAD_SIZE,
        });
    }
    Ok(())
}

/// Files written under a local root directory
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
    base_url: String,
}

impl LocalFileStore {
    /// `base_url` is prefixed to the destination to build public URLs
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a relative destination under the root, rejecting escapes
    fn resolve(&self, destination: &str) -> Result<PathBuf, UploadError> {
        let relative = Path::new(destination);
        let is_plain = !destination.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain {
            return Err(UploadError::InvalidDestination(destination.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn upload(&self, bytes: Vec<u8>, destination: &str) -> Result<StoredFileRef, UploadError> {
        validate_upload(&bytes)?;
        let path = self.resolve(destination)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write to a sibling temp file, then rename so readers never see a partial file
        let tmp_path = path.with_extension(format!("tmp-{}", uuid::Uuid::new_v4()));
        tokio::fs::write(&tmp_path, &bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        let stored = StoredFileRef {
            url: format!("{}/{}", self.base_url, destination),
            storage_id: destination.to_string(),
            content_type: mime_guess::from_path(&path)
                .first_or_octet_stream()
                .to_string(),
            sha256: calculate_hash(&bytes),
            size: bytes.len(),
        };
        tracing::debug!(destination, size = stored.size, sha256 = %stored.sha256, "File stored");
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_upload_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path(), "https://files.example/");

        let stored = store
            .upload(b"invoice body".to_vec(), "users/u1/invoices/invoice-o1.txt")
            .await
            .unwrap();

        assert_eq!(stored.url, "https://files.example/users/u1/invoices/invoice-o1.txt");
        assert_eq!(stored.storage_id, "users/u1/invoices/invoice-o1.txt");
        assert_eq!(stored.content_type, "text/plain");
        assert_eq!(stored.size, 12);
        assert_eq!(stored.sha256, calculate_hash(b"invoice body"));

        let on_disk = std::fs::read(dir.path().join("users/u1/invoices/invoice-o1.txt")).unwrap();
        assert_eq!(on_disk, b"invoice body");
    }

    #[tokio::test]
    async fn test_upload_overwrites_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path(), "https://files.example");
        store.upload(b"v1".to_vec(), "a/b.txt").await.unwrap();
        store.upload(b"v2".to_vec(), "a/b.txt").await.unwrap();
        assert_eq!(std::fs::read(dir.path().join("a/b.txt")).unwrap(), b"v2");
    }

    #[tokio::test]
    async fn test_rejects_escaping_destination() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path(), "https://files.example");
        for bad in ["../evil.txt", "/etc/passwd", "a/../../b", ""] {
            assert!(matches!(
                store.upload(b"x".to_vec(), bad).await,
                Err(UploadError::InvalidDestination(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_rejects_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path(), "https://files.example");
        assert!(matches!(
            store.upload(Vec::new(), "a.txt").await,
            Err(UploadError::Empty)
        ));
    }

    #[test]
    fn test_calculate_hash() {
        assert_eq!(
            calculate_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
