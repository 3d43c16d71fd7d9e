//! Service operations: grant issuance and merge triggering.

use pdfbind_core::models::{GrantRequest, GrantResponse, MergeOutcome, MergeRequest, UploadGrant};

use crate::error::ClientError;
use crate::MergeClient;

impl MergeClient {
    /// Request one upload grant per file name.
    ///
    /// The service contract is a bijection: every requested name gets
    /// exactly one grant, matched by name. A response with a different
    /// count or a different name set is a protocol violation, not
    /// something to paper over.
    pub async fn request_upload_grants(
        &self,
        file_names: &[String],
    ) -> Result<GrantResponse, ClientError> {
        let request = GrantRequest {
            file_names: file_names.to_vec(),
        };
        let response: GrantResponse = self.post_json("/upload", &request).await?;

        if response.uploads.len() != file_names.len() {
            return Err(ClientError::Protocol(format!(
                "Requested {} grants, got {}",
                file_names.len(),
                response.uploads.len()
            )));
        }
        let mut requested: Vec<&str> = file_names.iter().map(String::as_str).collect();
        let mut granted: Vec<&str> = response
            .uploads
            .iter()
            .map(|g| g.original_file_name.as_str())
            .collect();
        requested.sort_unstable();
        granted.sort_unstable();
        if requested != granted {
            return Err(ClientError::Protocol(
                "Grant names do not match the requested file names".to_string(),
            ));
        }

        tracing::debug!(count = response.uploads.len(), "Received upload grants");
        Ok(response)
    }

    /// Trigger the merge with grants already ordered for the output.
    ///
    /// The storage key of each grant, in slice order, becomes the merge
    /// order the service honors.
    pub async fn trigger_merge(
        &self,
        ordered_grants: &[UploadGrant],
    ) -> Result<MergeOutcome, ClientError> {
        let mut file_keys = Vec::with_capacity(ordered_grants.len());
        for grant in ordered_grants {
            let key = grant
                .storage_key()
                .ok_or_else(|| ClientError::MissingKey(grant.original_file_name.clone()))?;
            file_keys.push(key.to_string());
        }

        let request = MergeRequest { file_keys };
        let outcome: MergeOutcome = self.post_json("/merge", &request).await?;

        tracing::info!(download_url = %outcome.download_url, "Merge completed");
        Ok(outcome)
    }
}
