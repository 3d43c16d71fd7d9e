//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must
//! implement, plus the grant type handed to clients for direct uploads.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

use pdfbind_core::StorageBackend;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A time-limited, field-constrained permission to POST one object directly
/// to storage.
///
/// The uploader must send a `multipart/form-data` POST to `url` carrying
/// every entry of `fields` followed by the file content as the final field.
/// `fields["key"]` is always present and is the object's storage key.
#[derive(Debug, Clone)]
pub struct PostGrant {
    pub url: String,
    pub fields: BTreeMap<String, String>,
}

/// Storage abstraction trait
///
/// All storage backends (S3, local filesystem) must implement this trait so
/// the merge service can issue grants and move bytes without coupling to a
/// specific provider.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store an object under the given key and return its URL.
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> StorageResult<String>;

    /// Fetch an object's bytes by key.
    async fn get(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Delete an object by key.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Check whether an object exists.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Generate a time-limited download URL for an object.
    ///
    /// When `content_disposition` is set, the served response carries that
    /// Content-Disposition (e.g. `attachment; filename="merged.pdf"`), so a
    /// browser saves the file instead of rendering it inline.
    async fn presigned_get_url(
        &self,
        key: &str,
        expires_in: Duration,
        content_disposition: Option<&str>,
    ) -> StorageResult<String>;

    /// Issue a POST grant for one direct client upload to `key`.
    ///
    /// The grant constrains the upload to the exact key, the given content
    /// type, and a byte-size range, and expires after `expires_in`.
    async fn presigned_post(
        &self,
        key: &str,
        content_type: &str,
        size_range: (u64, u64),
        expires_in: Duration,
    ) -> StorageResult<PostGrant>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
