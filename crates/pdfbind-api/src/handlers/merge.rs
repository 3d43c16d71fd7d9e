//! Merge orchestration.
//!
//! `POST /merge` fetches the named source documents in the order given,
//! concatenates them into one PDF, publishes the result under a fresh key,
//! and answers with a time-limited download URL. Source documents are
//! deleted afterwards whether or not the merge succeeded, so abandoned
//! uploads do not accumulate.

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use axum::{extract::State, Json};
use uuid::Uuid;

use pdfbind_core::constants::PDF_CONTENT_TYPE;
use pdfbind_core::models::{MergeOutcome, MergeRequest};
use pdfbind_core::AppError;
use pdfbind_merge::concat;
use pdfbind_storage::keys;

use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;

pub async fn merge_documents(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<MergeRequest>,
) -> Result<Json<MergeOutcome>, HttpAppError> {
    if request.file_keys.len() < 2 {
        return Err(AppError::BadRequest(format!(
            "At least two fileKeys are required to merge, got {}",
            request.file_keys.len()
        ))
        .into());
    }

    // Only keys the grant handler could have minted are readable here.
    for key in &request.file_keys {
        if !keys::is_upload_key(key) {
            return Err(AppError::InvalidInput(format!(
                "'{}' is not an upload key issued by this service",
                key
            ))
            .into());
        }
    }

    let result = fetch_and_publish(&state, &request.file_keys).await;

    // Source cleanup runs on both paths. Failures are logged, never surfaced.
    cleanup_sources(&state, &request.file_keys).await;

    let download_url = result?;

    Ok(Json(MergeOutcome {
        message: "PDFs merged successfully!".to_string(),
        download_url,
    }))
}

/// Fetch sources in order, concatenate, publish, and presign the result.
async fn fetch_and_publish(
    state: &AppState,
    file_keys: &[String],
) -> Result<String, HttpAppError> {
    let start = Instant::now();

    let mut inputs = Vec::with_capacity(file_keys.len());
    for key in file_keys {
        let data = state.storage.get(key).await?;
        let name = key.rsplit('/').next().unwrap_or(key).to_string();
        inputs.push((name, data));
    }

    let input_count = inputs.len();
    let (merged, stats) = tokio::task::spawn_blocking(move || concat(&inputs))
        .await
        .map_err(|e| AppError::Internal(format!("Merge task failed: {}", e)))??;

    let merged_key = keys::merged_key();
    let merged_len = merged.len();
    state
        .storage
        .put(&merged_key, merged, PDF_CONTENT_TYPE)
        .await?;

    let merge_id = merged_key
        .rsplit('/')
        .next()
        .and_then(|f| f.strip_suffix(".pdf"))
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
    let disposition = format!("attachment; filename=\"pdfbind-merged-{}.pdf\"", merge_id);

    let download_url = state
        .storage
        .presigned_get_url(
            &merged_key,
            Duration::from_secs(state.config.grant_expiry_secs),
            Some(&disposition),
        )
        .await?;

    tracing::info!(
        documents = input_count,
        total_pages = stats.total_pages,
        input_bytes = stats.input_bytes,
        output_bytes = merged_len,
        key = %merged_key,
        duration_ms = start.elapsed().as_millis() as u64,
        "Merged documents"
    );

    Ok(download_url)
}

/// Delete source documents, logging each failure and moving on.
async fn cleanup_sources(state: &AppState, file_keys: &[String]) {
    for key in file_keys {
        if let Err(e) = state.storage.delete(key).await {
            tracing::warn!(key = %key, error = %e, "Failed to delete source document");
        }
    }
}
