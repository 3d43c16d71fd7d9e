//! Shared constants for the upload/merge pipeline.

/// Maximum cumulative batch size accepted for one merge attempt (100 MB).
pub const DEFAULT_MAX_BATCH_SIZE_BYTES: u64 = 104_857_600;

/// Smallest upload accepted by an upload grant (empty objects are rejected).
pub const MIN_UPLOAD_SIZE_BYTES: u64 = 1;

/// Maximum file names accepted in one grant request.
pub const MAX_FILES_PER_GRANT_REQUEST: usize = 50;

/// How long upload and download grants remain valid.
pub const GRANT_EXPIRY_SECS: u64 = 3600;

/// The only content type accepted for uploads.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Key prefix for freshly uploaded source documents.
pub const UPLOAD_KEY_PREFIX: &str = "uploads";

/// Key prefix for published merge results.
pub const MERGED_KEY_PREFIX: &str = "merged";
