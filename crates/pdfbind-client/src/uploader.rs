//! Direct-to-storage uploads.
//!
//! Each file is POSTed to the URL in its grant as `multipart/form-data`,
//! with every grant field sent as a form field and the file content as the
//! final `file` part. Uploads fan out concurrently; the first failure
//! cancels the still-running siblings, since a merge cannot proceed with a
//! partial batch anyway.

use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use pdfbind_core::models::UploadGrant;

use crate::batch::SelectedFile;
use crate::error::ClientError;
use crate::progress::{emit, EventSender, WorkflowEvent};
use crate::MergeClient;

const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

/// Upload fan-out options.
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    /// Maximum concurrent uploads. `None` starts every upload at once.
    pub concurrency: Option<usize>,
}

/// Upload every file under its grant, concurrently.
///
/// Progress events are emitted per file as chunks go out, capped at 99
/// until storage acknowledges the upload, then 100. Returns the first
/// failure after aborting the remaining uploads.
pub async fn upload_all(
    client: &MergeClient,
    uploads: Vec<(SelectedFile, UploadGrant)>,
    events: EventSender,
    options: UploadOptions,
) -> Result<(), ClientError> {
    let semaphore = options
        .concurrency
        .map(|limit| Arc::new(Semaphore::new(limit.max(1))));

    let mut tasks = JoinSet::new();
    for (file, grant) in uploads {
        let http = client.http().clone();
        let events = events.clone();
        let semaphore = semaphore.clone();

        tasks.spawn(async move {
            let _permit = match semaphore {
                Some(sem) => {
                    Some(sem.acquire_owned().await.map_err(|_| ClientError::Upload {
                        file_name: file.name.clone(),
                        detail: "upload pool closed".to_string(),
                    })?)
                }
                None => None,
            };
            upload_one(&http, file, grant, events).await
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tasks.abort_all();
                while tasks.join_next().await.is_some() {}
                return Err(e);
            }
            Err(e) if e.is_cancelled() => {}
            Err(e) => {
                tasks.abort_all();
                while tasks.join_next().await.is_some() {}
                return Err(ClientError::Upload {
                    file_name: "<unknown>".to_string(),
                    detail: format!("upload task failed: {}", e),
                });
            }
        }
    }

    Ok(())
}

async fn upload_one(
    http: &reqwest::Client,
    file: SelectedFile,
    grant: UploadGrant,
    events: EventSender,
) -> Result<(), ClientError> {
    let file_name = file.name.clone();
    let total_bytes = file.data.len() as u64;

    tracing::debug!(file_name = %file_name, size_bytes = total_bytes, "Starting upload");

    let mut form = reqwest::multipart::Form::new();
    for (key, value) in &grant.post_details.fields {
        form = form.text(key.clone(), value.clone());
    }

    let part = reqwest::multipart::Part::stream_with_length(
        reqwest::Body::wrap_stream(progress_stream(
            file.data,
            file_name.clone(),
            events.clone(),
        )),
        total_bytes,
    )
    .file_name(file_name.clone())
    .mime_str(&file.content_type)
    .map_err(|e| ClientError::Upload {
        file_name: file_name.clone(),
        detail: format!("invalid content type: {}", e),
    })?;

    // The file content must be the last field of the form.
    form = form.part("file", part);

    let response = http
        .post(&grant.post_details.url)
        .multipart(form)
        .send()
        .await
        .map_err(ClientError::from_transport)?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::Upload {
            file_name,
            detail: format!("storage answered {}: {}", status, body),
        });
    }

    emit(
        &events,
        WorkflowEvent::UploadProgress {
            file_name: file_name.clone(),
            percent: 100,
        },
    );
    tracing::debug!(file_name = %file_name, "Upload complete");
    Ok(())
}

/// Chunk the file bytes into a stream that reports progress as it is
/// consumed. Values are capped at 99; only an acknowledged upload is 100.
fn progress_stream(
    data: Bytes,
    file_name: String,
    events: EventSender,
) -> impl futures::Stream<Item = Result<Bytes, std::io::Error>> {
    let total = data.len().max(1) as u64;
    let chunks: Vec<Bytes> = (0..data.len())
        .step_by(UPLOAD_CHUNK_BYTES)
        .map(|start| data.slice(start..(start + UPLOAD_CHUNK_BYTES).min(data.len())))
        .collect();

    let mut sent = 0u64;
    futures::stream::iter(chunks.into_iter().map(move |chunk| {
        sent += chunk.len() as u64;
        let percent = ((sent * 100 / total) as u8).min(99);
        emit(
            &events,
            WorkflowEvent::UploadProgress {
                file_name: file_name.clone(),
                percent,
            },
        );
        Ok(chunk)
    }))
}
