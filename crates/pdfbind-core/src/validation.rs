//! Validation rules for file names and batches.
//!
//! The client applies these before any network call; the service applies the
//! file-name rules again at its own boundary because it does not trust the
//! client.

use crate::constants::PDF_CONTENT_TYPE;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("'{name}' is not a PDF (content type '{content_type}')")]
    NotPdf { name: String, content_type: String },

    #[error("A file named '{0}' is already in the batch")]
    DuplicateName(String),

    #[error("'{name}' would exceed the batch size limit ({max_bytes} bytes)")]
    BatchTooLarge { name: String, max_bytes: u64 },

    #[error("At least two files are required to merge, got {0}")]
    TooFewFiles(usize),

    #[error("Invalid file name: {0}")]
    InvalidFileName(String),

    #[error("'{0}' is empty")]
    EmptyFile(String),
}

/// Whether a MIME type indicates a PDF document.
pub fn is_pdf_content_type(content_type: &str) -> bool {
    content_type.eq_ignore_ascii_case(PDF_CONTENT_TYPE)
}

/// Validate a user-supplied file name.
///
/// The name becomes the final segment of a storage key, so path separators
/// and traversal sequences are rejected outright.
pub fn validate_file_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::InvalidFileName(
            "file name is empty".to_string(),
        ));
    }
    if name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(ValidationError::InvalidFileName(format!(
            "'{}' contains path separators or traversal sequences",
            name
        )));
    }
    Ok(())
}
