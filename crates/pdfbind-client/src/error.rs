//! Client-side error taxonomy.
//!
//! Every failure the orchestration can hit maps to exactly one variant, so
//! callers can distinguish "fix your configuration" from "fix your files"
//! from "the service or the network misbehaved".

use pdfbind_core::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The client cannot be constructed or pointed at a service.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A file or batch failed local validation before any network call.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The service answered with a non-success status.
    #[error("Service error ({status}): {message}")]
    Service { status: u16, message: String },

    /// The service answered 2xx but the body broke the contract.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The request never produced an HTTP response.
    #[error("Network error: {}", network_display(.detail, .cors_hint))]
    Network { detail: String, cors_hint: bool },

    /// One direct-to-storage upload was rejected or broke off.
    #[error("Upload of '{file_name}' failed: {detail}")]
    Upload { file_name: String, detail: String },

    /// A file in the batch has no matching grant.
    #[error("No upload grant was issued for '{0}'")]
    MissingGrant(String),

    /// A grant carries no storage key, so its upload cannot be merged.
    #[error("Grant for '{0}' carries no storage key")]
    MissingKey(String),
}

fn network_display(detail: &str, cors_hint: &bool) -> String {
    if *cors_hint {
        format!(
            "{} (if the service is reachable from a browser, check its CORS configuration)",
            detail
        )
    } else {
        detail.to_string()
    }
}

impl ClientError {
    /// Classify a transport-level reqwest failure.
    ///
    /// Connection failures get the CORS hint: a browser surfaces a blocked
    /// cross-origin call as a bare network error, and a misconfigured
    /// service allowlist is the most common cause in practice.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        ClientError::Network {
            detail: err.to_string(),
            cors_hint: err.is_connect() || err.is_request(),
        }
    }
}
