//! The merge workflow state machine.
//!
//! Drives the batch through grants, uploads, and the merge call. Each run
//! requests fresh grants; a failed run leaves the batch intact so the user
//! can retry or rework the selection, and the retry never reuses keys from
//! the failed attempt.

use std::collections::HashMap;

use pdfbind_core::models::{MergeOutcome, UploadGrant};

use crate::batch::{OrderedFileBatch, SelectedFile};
use crate::error::ClientError;
use crate::progress::{emit, EventSender, WorkflowEvent};
use crate::uploader::{self, UploadOptions};
use crate::MergeClient;

/// Workflow phase. Transitions only move forward within a run; `Failed`
/// and `Succeeded` are terminal until `reset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    RequestingGrants,
    Uploading,
    Merging,
    Succeeded,
    Failed,
}

pub struct MergeWorkflow {
    client: MergeClient,
    batch: OrderedFileBatch,
    phase: Phase,
    events: Option<EventSender>,
    upload_options: UploadOptions,
}

impl MergeWorkflow {
    pub fn new(client: MergeClient, batch: OrderedFileBatch) -> Self {
        MergeWorkflow {
            client,
            batch,
            phase: Phase::Idle,
            events: None,
            upload_options: UploadOptions::default(),
        }
    }

    /// Subscribe an observer to phase and progress events.
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_upload_options(mut self, options: UploadOptions) -> Self {
        self.upload_options = options;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn batch(&self) -> &OrderedFileBatch {
        &self.batch
    }

    /// The batch stays editable between runs.
    pub fn batch_mut(&mut self) -> &mut OrderedFileBatch {
        &mut self.batch
    }

    /// Return to `Idle` so the batch can be rerun or reworked.
    pub fn reset(&mut self) {
        self.set_phase(Phase::Idle);
    }

    /// Run the full flow: grants, uploads, merge.
    ///
    /// On failure the batch is preserved and the phase is `Failed`; calling
    /// `run` again starts over with fresh grants.
    pub async fn run(&mut self) -> Result<MergeOutcome, ClientError> {
        let result = self.run_inner().await;
        match &result {
            Ok(_) => self.set_phase(Phase::Succeeded),
            Err(e) => {
                tracing::warn!(error = %e, "Merge workflow failed");
                self.set_phase(Phase::Failed);
            }
        }
        result
    }

    async fn run_inner(&mut self) -> Result<MergeOutcome, ClientError> {
        self.batch.validate_for_merge()?;

        self.set_phase(Phase::RequestingGrants);
        let file_names = self.batch.file_names();
        let grants = self.client.request_upload_grants(&file_names).await?;

        let uploads = pair_with_grants(self.batch.entries(), &grants.uploads)?;
        // Batch sequence order, regardless of the order grants arrived in.
        let ordered_grants: Vec<UploadGrant> =
            uploads.iter().map(|(_, grant)| grant.clone()).collect();

        self.set_phase(Phase::Uploading);
        // With no observer, progress goes to a channel nobody reads; emit
        // ignores the closed receiver.
        let sender = match &self.events {
            Some(sender) => sender.clone(),
            None => crate::progress::event_channel().0,
        };
        uploader::upload_all(&self.client, uploads, sender, self.upload_options.clone()).await?;

        self.set_phase(Phase::Merging);
        self.client.trigger_merge(&ordered_grants).await
    }

    fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
        if let Some(events) = &self.events {
            emit(events, WorkflowEvent::PhaseChanged(phase));
        }
    }
}

/// Pair each batch entry with its grant by file name, in batch order.
///
/// Batch names are unique, so name lookup is unambiguous. A file without a
/// grant is a `MissingGrant` error, even though the bijection check on the
/// grant response should have caught the mismatch already.
fn pair_with_grants(
    entries: &[crate::batch::BatchEntry],
    grants: &[UploadGrant],
) -> Result<Vec<(SelectedFile, UploadGrant)>, ClientError> {
    let by_name: HashMap<&str, &UploadGrant> = grants
        .iter()
        .map(|grant| (grant.original_file_name.as_str(), grant))
        .collect();

    entries
        .iter()
        .map(|entry| {
            by_name
                .get(entry.file.name.as_str())
                .map(|grant| (entry.file.clone(), (*grant).clone()))
                .ok_or_else(|| ClientError::MissingGrant(entry.file.name.clone()))
        })
        .collect()
}
