//! Shared key generation for storage backends.
//!
//! Key format: `uploads/{uuid}/{filename}` for source documents, where the
//! random segment prevents collisions between same-named files across
//! batches, and `merged/{uuid}.pdf` for published merge results. The service
//! generates keys itself; callers never choose a destination key.

use pdfbind_core::constants::{MERGED_KEY_PREFIX, UPLOAD_KEY_PREFIX};
use uuid::Uuid;

use crate::traits::{StorageError, StorageResult};

/// Generate a collision-free storage key for one uploaded file.
pub fn upload_key(file_name: &str) -> String {
    format!("{}/{}/{}", UPLOAD_KEY_PREFIX, Uuid::new_v4(), file_name)
}

/// Generate a storage key for a published merge result.
pub fn merged_key() -> String {
    format!("{}/{}.pdf", MERGED_KEY_PREFIX, Uuid::new_v4())
}

/// Reject keys that could escape the storage namespace.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() || key.contains("..") || key.starts_with('/') {
        return Err(StorageError::InvalidKey(format!(
            "'{}' contains invalid characters",
            key
        )));
    }
    Ok(())
}

/// Whether a client-supplied key names a freshly uploaded source document.
///
/// Merge input keys must sit under the uploads prefix; anything else is an
/// attempt to read outside the grant the service issued.
pub fn is_upload_key(key: &str) -> bool {
    validate_key(key).is_ok() && key.starts_with(&format!("{}/", UPLOAD_KEY_PREFIX))
}
