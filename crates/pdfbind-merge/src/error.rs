//! Error types for PDF concatenation.

/// Result type alias for merge operations.
pub type Result<T> = std::result::Result<T, MergeError>;

#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// Input bytes could not be parsed as a PDF.
    #[error("'{name}' is not a valid PDF: {reason}")]
    InvalidPdf { name: String, reason: String },

    /// Input document has no pages to contribute.
    #[error("'{0}' contains no pages")]
    EmptyDocument(String),

    /// No input documents were provided.
    #[error("No documents to merge")]
    NoDocuments,

    /// Structural failure while stitching documents together.
    #[error("Merge failed: {0}")]
    MergeFailed(String),

    /// Failure while serializing the merged document.
    #[error("Failed to write merged document: {0}")]
    WriteFailed(String),
}

impl MergeError {
    pub(crate) fn merge_failed(message: impl Into<String>) -> Self {
        MergeError::MergeFailed(message.into())
    }
}
