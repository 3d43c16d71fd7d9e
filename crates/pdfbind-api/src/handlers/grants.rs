//! Upload grant issuance.
//!
//! `POST /upload` takes a list of file names and answers with one
//! direct-to-storage POST grant per name, in request order. Grants are
//! constrained to `application/pdf` content and the configured byte ceiling,
//! and they expire; the service itself never touches the upload bytes.

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, Json};

use pdfbind_core::constants::{
    MAX_FILES_PER_GRANT_REQUEST, MIN_UPLOAD_SIZE_BYTES, PDF_CONTENT_TYPE,
};
use pdfbind_core::models::{GrantRequest, GrantResponse, PostDetails, UploadGrant};
use pdfbind_core::validation::validate_file_name;
use pdfbind_core::AppError;
use pdfbind_storage::keys;

use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;

pub async fn issue_upload_grants(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<GrantRequest>,
) -> Result<Json<GrantResponse>, HttpAppError> {
    if request.file_names.is_empty() {
        return Err(AppError::BadRequest("fileNames must not be empty".to_string()).into());
    }
    if request.file_names.len() > MAX_FILES_PER_GRANT_REQUEST {
        return Err(AppError::BadRequest(format!(
            "fileNames must contain at most {} names, got {}",
            MAX_FILES_PER_GRANT_REQUEST,
            request.file_names.len()
        ))
        .into());
    }

    // Names become key segments; reject traversal before any key is minted.
    for name in &request.file_names {
        validate_file_name(name).map_err(|e| AppError::InvalidInput(e.to_string()))?;
    }

    let expires_in = Duration::from_secs(state.config.grant_expiry_secs);
    let size_range = (MIN_UPLOAD_SIZE_BYTES, state.config.max_batch_size_bytes);

    let mut uploads = Vec::with_capacity(request.file_names.len());
    for name in &request.file_names {
        let key = keys::upload_key(name);
        let grant = state
            .storage
            .presigned_post(&key, PDF_CONTENT_TYPE, size_range, expires_in)
            .await?;

        tracing::debug!(file_name = %name, key = %key, "Issued upload grant");

        uploads.push(UploadGrant {
            original_file_name: name.clone(),
            post_details: PostDetails {
                url: grant.url,
                fields: grant.fields,
            },
        });
    }

    tracing::info!(count = uploads.len(), "Issued upload grants");

    Ok(Json(GrantResponse { uploads }))
}
