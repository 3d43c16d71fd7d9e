//! Wire models shared by the merge service and the orchestration client.
//!
//! Field names follow the public JSON contract (`fileNames`, `fileKeys`,
//! `originalFileName`, `downloadUrl`), so both sides serialize through the
//! same types and cannot drift apart.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Request body for the "issue upload grants" operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantRequest {
    #[serde(rename = "fileNames")]
    pub file_names: Vec<String>,
}

/// Destination and required form fields for one direct-to-storage upload.
///
/// `fields["key"]` is the canonical storage key for the file from this point
/// forward. Every field must be sent with the upload, with the file content
/// appended last.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetails {
    pub url: String,
    pub fields: BTreeMap<String, String>,
}

/// One upload grant, paired with exactly one file by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadGrant {
    #[serde(rename = "originalFileName")]
    pub original_file_name: String,
    pub post_details: PostDetails,
}

impl UploadGrant {
    /// The storage key assigned to this file, if the grant carries one.
    pub fn storage_key(&self) -> Option<&str> {
        self.post_details.fields.get("key").map(String::as_str)
    }
}

/// Response body for the "issue upload grants" operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantResponse {
    pub uploads: Vec<UploadGrant>,
}

/// Request body for the merge operation. Key order is merge order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeRequest {
    #[serde(rename = "fileKeys")]
    pub file_keys: Vec<String>,
}

/// Response body for a successful merge: a human-readable status message
/// and a time-limited download reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeOutcome {
    pub message: String,
    #[serde(rename = "downloadUrl")]
    pub download_url: String,
}
