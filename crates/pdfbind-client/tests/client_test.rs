//! Orchestration client tests against a mock service and mock storage.
//!
//! Run with: `cargo test -p pdfbind-client --test client_test`.

use bytes::Bytes;
use mockito::Matcher;
use serde_json::json;

use pdfbind_client::{
    event_channel, ClientError, MergeClient, MergeWorkflow, OrderedFileBatch, Phase, SelectedFile,
    UploadOptions, WorkflowEvent,
};

fn pdf(name: &str, size: usize) -> SelectedFile {
    SelectedFile::new(name, "application/pdf", Bytes::from(vec![0u8; size]))
}

fn grant_json(name: &str, key: &str, storage_url: &str) -> serde_json::Value {
    json!({
        "originalFileName": name,
        "post_details": {
            "url": storage_url,
            "fields": {
                "key": key,
                "Content-Type": "application/pdf"
            }
        }
    })
}

#[tokio::test]
async fn test_request_grants_success() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/upload")
        .match_body(Matcher::Json(json!({ "fileNames": ["a.pdf", "b.pdf"] })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "uploads": [
                    grant_json("a.pdf", "uploads/k1/a.pdf", "http://storage.test/"),
                    grant_json("b.pdf", "uploads/k2/b.pdf", "http://storage.test/"),
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = MergeClient::new(server.url()).expect("client");
    let grants = client
        .request_upload_grants(&["a.pdf".to_string(), "b.pdf".to_string()])
        .await
        .expect("grants");

    assert_eq!(grants.uploads.len(), 2);
    assert_eq!(grants.uploads[0].storage_key(), Some("uploads/k1/a.pdf"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_grant_count_mismatch_is_protocol_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/upload")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "uploads": [grant_json("a.pdf", "uploads/k1/a.pdf", "http://storage.test/")]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = MergeClient::new(server.url()).expect("client");
    let result = client
        .request_upload_grants(&["a.pdf".to_string(), "b.pdf".to_string()])
        .await;

    assert!(matches!(result, Err(ClientError::Protocol(_))));
}

#[tokio::test]
async fn test_service_error_payload_is_surfaced() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/merge")
        .with_status(422)
        .with_header("content-type", "application/json")
        .with_body(json!({ "error": "Merge failed", "code": "MERGE_ERROR" }).to_string())
        .create_async()
        .await;

    let client = MergeClient::new(server.url()).expect("client");
    let grants = vec![
        serde_json::from_value(grant_json("a.pdf", "uploads/k1/a.pdf", "u")).expect("grant"),
        serde_json::from_value(grant_json("b.pdf", "uploads/k2/b.pdf", "u")).expect("grant"),
    ];
    let result = client.trigger_merge(&grants).await;

    match result {
        Err(ClientError::Service { status, message }) => {
            assert_eq!(status, 422);
            assert_eq!(message, "Merge failed");
        }
        other => panic!("expected Service error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_merge_sends_keys_in_batch_order() {
    let mut server = mockito::Server::new_async().await;
    let storage_url = format!("{}/storage", server.url());

    server
        .mock("POST", "/upload")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "uploads": [
                    grant_json("b.pdf", "uploads/k2/b.pdf", &storage_url),
                    grant_json("a.pdf", "uploads/k1/a.pdf", &storage_url),
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    server
        .mock("POST", "/storage")
        .with_status(204)
        .expect(2)
        .create_async()
        .await;

    // Key order in the merge call follows the reordered batch, not upload
    // completion order.
    let merge_mock = server
        .mock("POST", "/merge")
        .match_body(Matcher::Json(json!({
            "fileKeys": ["uploads/k2/b.pdf", "uploads/k1/a.pdf"]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "message": "PDFs merged successfully!",
                "downloadUrl": "http://storage.test/merged/x.pdf"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = MergeClient::new(server.url()).expect("client");
    let mut batch = OrderedFileBatch::default();
    let rejected = batch.add_files(vec![pdf("a.pdf", 100), pdf("b.pdf", 100)]);
    assert!(rejected.is_empty());
    batch.reorder("b.pdf", 0).expect("reorder");

    let mut workflow = MergeWorkflow::new(client, batch);
    let outcome = workflow.run().await.expect("workflow");

    assert_eq!(outcome.message, "PDFs merged successfully!");
    assert_eq!(workflow.phase(), Phase::Succeeded);
    merge_mock.assert_async().await;
}

#[tokio::test]
async fn test_workflow_emits_phases_and_full_progress() {
    let mut server = mockito::Server::new_async().await;
    let storage_url = format!("{}/storage", server.url());

    server
        .mock("POST", "/upload")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "uploads": [
                    grant_json("a.pdf", "uploads/k1/a.pdf", &storage_url),
                    grant_json("b.pdf", "uploads/k2/b.pdf", &storage_url),
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;
    server
        .mock("POST", "/storage")
        .with_status(204)
        .expect(2)
        .create_async()
        .await;
    server
        .mock("POST", "/merge")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "message": "PDFs merged successfully!",
                "downloadUrl": "http://storage.test/merged/x.pdf"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = MergeClient::new(server.url()).expect("client");
    let mut batch = OrderedFileBatch::default();
    batch.add_files(vec![pdf("a.pdf", 100), pdf("b.pdf", 100)]);

    let (events, mut rx) = event_channel();
    let mut workflow = MergeWorkflow::new(client, batch)
        .with_events(events)
        .with_upload_options(UploadOptions {
            concurrency: Some(2),
        });
    workflow.run().await.expect("workflow");

    let mut phases = Vec::new();
    let mut completed_files = Vec::new();
    while let Ok(event) = rx.try_recv() {
        match event {
            WorkflowEvent::PhaseChanged(phase) => phases.push(phase),
            WorkflowEvent::UploadProgress { file_name, percent } if percent == 100 => {
                completed_files.push(file_name)
            }
            WorkflowEvent::UploadProgress { .. } => {}
        }
    }

    assert_eq!(
        phases,
        vec![
            Phase::RequestingGrants,
            Phase::Uploading,
            Phase::Merging,
            Phase::Succeeded
        ]
    );
    completed_files.sort();
    completed_files.dedup();
    assert_eq!(completed_files, vec!["a.pdf", "b.pdf"]);
}

#[tokio::test]
async fn test_rejected_upload_names_the_file_and_fails_workflow() {
    let mut server = mockito::Server::new_async().await;
    let good_url = format!("{}/storage-good", server.url());
    let bad_url = format!("{}/storage-bad", server.url());

    server
        .mock("POST", "/upload")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "uploads": [
                    grant_json("a.pdf", "uploads/k1/a.pdf", &good_url),
                    grant_json("b.pdf", "uploads/k2/b.pdf", &bad_url),
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;
    server
        .mock("POST", "/storage-good")
        .with_status(204)
        .create_async()
        .await;
    server
        .mock("POST", "/storage-bad")
        .with_status(403)
        .with_body("Policy condition failed")
        .create_async()
        .await;

    let client = MergeClient::new(server.url()).expect("client");
    let mut batch = OrderedFileBatch::default();
    batch.add_files(vec![pdf("a.pdf", 100), pdf("b.pdf", 100)]);

    let mut workflow = MergeWorkflow::new(client, batch);
    let result = workflow.run().await;

    match result {
        Err(ClientError::Upload { file_name, detail }) => {
            assert_eq!(file_name, "b.pdf");
            assert!(detail.contains("403"));
        }
        other => panic!("expected Upload error, got {:?}", other.map(|_| ())),
    }
    assert_eq!(workflow.phase(), Phase::Failed);
    // The batch survives a failed run.
    assert_eq!(workflow.batch().len(), 2);
}

#[tokio::test]
async fn test_too_few_files_fails_before_any_request() {
    // No mock server at all; validation must fire first.
    let client = MergeClient::new("http://127.0.0.1:1".to_string()).expect("client");
    let mut batch = OrderedFileBatch::default();
    batch.add_files(vec![pdf("only.pdf", 10)]);

    let mut workflow = MergeWorkflow::new(client, batch);
    let result = workflow.run().await;
    assert!(matches!(result, Err(ClientError::Validation(_))));
}

#[tokio::test]
async fn test_each_run_requests_fresh_grants() {
    let mut server = mockito::Server::new_async().await;
    let storage_url = format!("{}/storage", server.url());

    let grants_mock = server
        .mock("POST", "/upload")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "uploads": [
                    grant_json("a.pdf", "uploads/k1/a.pdf", &storage_url),
                    grant_json("b.pdf", "uploads/k2/b.pdf", &storage_url),
                ]
            })
            .to_string(),
        )
        .expect(2)
        .create_async()
        .await;
    server
        .mock("POST", "/storage")
        .with_status(204)
        .expect(4)
        .create_async()
        .await;
    server
        .mock("POST", "/merge")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "message": "PDFs merged successfully!",
                "downloadUrl": "http://storage.test/merged/x.pdf"
            })
            .to_string(),
        )
        .expect(2)
        .create_async()
        .await;

    let client = MergeClient::new(server.url()).expect("client");
    let mut batch = OrderedFileBatch::default();
    batch.add_files(vec![pdf("a.pdf", 100), pdf("b.pdf", 100)]);

    let mut workflow = MergeWorkflow::new(client, batch);
    workflow.run().await.expect("first run");
    workflow.reset();
    workflow.run().await.expect("second run");

    grants_mock.assert_async().await;
}

#[tokio::test]
async fn test_from_env_without_url_is_configuration_error() {
    std::env::remove_var("PDFBIND_API_URL");
    let result = MergeClient::from_env();
    assert!(matches!(result, Err(ClientError::Configuration(_))));
}

#[tokio::test]
async fn test_connection_failure_is_network_error_with_cors_hint() {
    // Nothing listens on this port.
    let client = MergeClient::new("http://127.0.0.1:9".to_string()).expect("client");
    let result = client
        .request_upload_grants(&["a.pdf".to_string(), "b.pdf".to_string()])
        .await;

    match result {
        Err(ClientError::Network { cors_hint, .. }) => assert!(cors_hint),
        other => panic!("expected Network error, got {:?}", other.map(|_| ())),
    }
}
