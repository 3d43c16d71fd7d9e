//! Pdfbind Storage Library
//!
//! Storage abstraction and backends for the merge service. Objects live
//! under two prefixes: `uploads/{uuid}/{filename}` for freshly uploaded
//! source documents and `merged/{uuid}.pdf` for published results.
//!
//! Upload grants are field-constrained POST policies (S3 POST object form),
//! download grants are presigned GET URLs. Keys must not contain `..` or a
//! leading `/`; key generation is centralized in the `keys` module so the
//! service never lets a caller choose a destination key.

pub mod factory;
pub mod keys;
pub mod local;
pub mod s3;
pub(crate) mod sign;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use local::LocalStorage;
pub use pdfbind_core::StorageBackend;
pub use s3::S3Storage;
pub use traits::{PostGrant, Storage, StorageError, StorageResult};
