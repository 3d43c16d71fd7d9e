//! Pdfbind Core Library
//!
//! This crate provides the domain models, error types, configuration, and
//! validation rules shared by the merge service and the orchestration client.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::{Config, StorageBackend};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    GrantRequest, GrantResponse, MergeOutcome, MergeRequest, PostDetails, UploadGrant,
};
pub use validation::ValidationError;
