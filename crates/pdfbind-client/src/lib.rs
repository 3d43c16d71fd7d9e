//! Orchestration client for the pdfbind merge service.
//!
//! Drives the three-phase flow a frontend performs: request upload grants,
//! upload each file straight to storage under its grant, then trigger the
//! merge with the storage keys in the user's chosen order. The service never
//! sees the upload bytes; this client talks to storage directly.

pub mod api;
pub mod batch;
pub mod error;
pub mod progress;
pub mod uploader;
pub mod workflow;

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use batch::{BatchEntry, OrderedFileBatch, SelectedFile};
pub use error::ClientError;
pub use pdfbind_core::models::{GrantResponse, MergeOutcome, UploadGrant};
pub use progress::{event_channel, EventReceiver, EventSender, ProgressTracker, WorkflowEvent};
pub use uploader::UploadOptions;
pub use workflow::{MergeWorkflow, Phase};

/// HTTP client for the merge service.
#[derive(Clone, Debug)]
pub struct MergeClient {
    client: Client,
    base_url: String,
}

impl MergeClient {
    pub fn new(base_url: String) -> Result<Self, ClientError> {
        if base_url.trim().is_empty() {
            return Err(ClientError::Configuration(
                "Service base URL is empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| {
                ClientError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create client from environment: PDFBIND_API_URL.
    pub fn from_env() -> Result<Self, ClientError> {
        let base_url = std::env::var("PDFBIND_API_URL").map_err(|_| {
            ClientError::Configuration("Missing service URL. Set PDFBIND_API_URL".to_string())
        })?;
        Self::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST JSON body and deserialize response.
    ///
    /// Non-success statuses become `ClientError::Service` with the body's
    /// `error` field when the service sent one; a 2xx body that does not
    /// deserialize is `ClientError::Protocol`.
    pub(crate) async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let url = self.build_url(path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(ClientError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&text)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
                .unwrap_or(text);
            return Err(ClientError::Service {
                status: status.as_u16(),
                message,
            });
        }

        response.json().await.map_err(|e| {
            ClientError::Protocol(format!("Failed to parse response as JSON: {}", e))
        })
    }

    /// Raw client for the direct-to-storage uploads.
    pub(crate) fn http(&self) -> &Client {
        &self.client
    }
}
