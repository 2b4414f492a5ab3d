use contact_loader::{
    build_service, ApolloClient, CancellationToken, LocalStorage, RetryingService, RunConfig,
    RunStage, Settings, UploadEngine, UploadError,
};
use contact_loader::utils::error::ErrorSeverity;
use httpmock::prelude::*;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

const API_KEY: &str = "test-key";

fn test_settings(server: &MockServer) -> Settings {
    let mut settings = Settings::default();
    settings.api.base_url = server.url("/v1");
    settings.api.timeout_seconds = 5;
    settings.retry.max_attempts = 3;
    settings.retry.base_delay_ms = 1;
    settings.retry.max_delay_ms = 5;
    settings.upload.pause_ms = 0;
    settings.wait.tick_ms = 1;
    settings
}

fn write_input(dir: &TempDir, content: &str) -> String {
    let path = dir.path().join("leads.csv");
    std::fs::write(&path, content).unwrap();
    path.to_str().unwrap().to_string()
}

fn run_config(
    server: &MockServer,
    list_name: &str,
    input_file: String,
    cleanup: bool,
    export_path: Option<String>,
) -> RunConfig {
    RunConfig {
        api_key: API_KEY.to_string(),
        list_name: list_name.to_string(),
        input_file,
        cleanup,
        wait: Duration::ZERO,
        export_path,
        settings: test_settings(server),
    }
}

type HttpEngine = UploadEngine<RetryingService<ApolloClient>, LocalStorage>;

fn engine_for(config: RunConfig) -> HttpEngine {
    let service = build_service(&config).unwrap();
    UploadEngine::new(service, LocalStorage::default(), config)
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_email_only_rows_upload_without_export() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(
        &temp_dir,
        "Email\nada@example.com\ngrace@example.com\nlinus@example.com\n",
    );

    let server = MockServer::start_async().await;
    let create_list = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/labels")
                .header("X-Api-Key", API_KEY)
                .json_body_partial(r#"{"name": "Q3 Leads", "modality": "contacts"}"#);
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({"label": {"id": "L1", "name": "Q3 Leads"}}));
        })
        .await;
    let create_contact = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/contacts")
                .header("X-Api-Key", API_KEY)
                .json_body_partial(r#"{"label_names": ["Q3 Leads"], "run_dedupe": true}"#);
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({"contact": {"id": "c1"}}));
        })
        .await;
    let search = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/contacts/search");
            then.status(200).json_body(json!({"contacts": []}));
        })
        .await;

    let engine = engine_for(run_config(&server, "Q3 Leads", input, false, None));
    let summary = engine.run(&CancellationToken::new()).await.unwrap();

    create_list.assert_hits_async(1).await;
    create_contact.assert_hits_async(3).await;
    search.assert_hits_async(0).await;

    assert_eq!(summary.stage, RunStage::Done);
    assert_eq!(summary.list_id, "L1");
    assert_eq!(summary.upload.created, 3);
    assert_eq!(summary.upload.failed, 0);
    assert_eq!(summary.email_only, 3);
    assert_eq!(files_in(temp_dir.path()), vec!["leads.csv"]);
}

#[tokio::test]
async fn test_cleanup_deletes_unenriched_and_exports_the_rest() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir, "email,company\nada@acme.test,\nbob@example.com,\n");
    let export_path = temp_dir.path().join("enriched.csv");

    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/labels");
            then.status(200).json_body(json!({"label": {"id": "L1"}}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/contacts");
            then.status(200).json_body(json!({"contact": {"id": "c"}}));
        })
        .await;
    let search = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/contacts/search")
                .json_body_partial(r#"{"label_ids": ["L1"], "page": 1}"#);
            then.status(200).json_body(json!({
                "contacts": [
                    {"id": "c1", "email": "ada@acme.test", "first_name": null, "organization_name": "Acme"},
                    {"id": "c2", "email": "bob@example.com", "first_name": "", "last_name": "", "organization_name": ""}
                ],
                "pagination": {"page": 1, "per_page": 100, "total_pages": 1, "total_entries": 2}
            }));
        })
        .await;
    let delete_kept = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/v1/contacts/c1");
            then.status(200).json_body(json!({"success": true}));
        })
        .await;
    let delete_unenriched = server
        .mock_async(|when, then| {
            when.method(DELETE)
                .path("/v1/contacts/c2")
                .header("X-Api-Key", API_KEY);
            then.status(200).json_body(json!({"success": true}));
        })
        .await;

    let engine = engine_for(run_config(
        &server,
        "Q3 Leads",
        input,
        true,
        Some(export_path.to_str().unwrap().to_string()),
    ));
    let summary = engine.run(&CancellationToken::new()).await.unwrap();

    search.assert_hits_async(1).await;
    delete_unenriched.assert_hits_async(1).await;
    delete_kept.assert_hits_async(0).await;

    assert_eq!(summary.stage, RunStage::Done);
    assert_eq!(summary.drained, Some(2));
    assert_eq!(summary.deleted, 1);
    assert_eq!(summary.exported, Some(1));

    let mut reader = csv::Reader::from_path(&export_path).unwrap();
    let headers = reader.headers().unwrap().clone();
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(&headers[0], "id");
    assert_eq!(&rows[0][0], "c1");
    let org_index = headers.iter().position(|h| h == "organization_name").unwrap();
    assert_eq!(&rows[0][org_index], "Acme");
}

#[tokio::test]
async fn test_existing_list_is_reused_after_conflict() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir, "email\nada@example.com\n");

    let server = MockServer::start_async().await;
    let create_list = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/labels");
            then.status(422)
                .json_body(json!({"error": "Label name has already been taken"}));
        })
        .await;
    let list_lists = server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/labels");
            then.status(200).json_body(json!([
                {"id": "L0", "name": "x", "modality": "contacts"},
                {"id": "L1", "name": "X", "modality": "contacts"}
            ]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/contacts");
            then.status(200).json_body(json!({"contact": {"id": "c1"}}));
        })
        .await;

    let engine = engine_for(run_config(&server, "X", input, false, None));
    let summary = engine.run(&CancellationToken::new()).await.unwrap();

    create_list.assert_hits_async(1).await;
    list_lists.assert_hits_async(1).await;
    assert_eq!(summary.list_id, "L1");
    assert_eq!(summary.upload.created, 1);
}

#[tokio::test]
async fn test_persistent_rate_limit_marks_record_failed_and_continues() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir, "email\nslow@example.com\nok@example.com\n");

    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/labels");
            then.status(200).json_body(json!({"label": {"id": "L1"}}));
        })
        .await;
    let throttled = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/contacts")
                .json_body_partial(r#"{"email": "slow@example.com"}"#);
            then.status(429).json_body(json!({"error": "Too many requests"}));
        })
        .await;
    let accepted = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/contacts")
                .json_body_partial(r#"{"email": "ok@example.com"}"#);
            then.status(200).json_body(json!({"contact": {"id": "c2"}}));
        })
        .await;

    let engine = engine_for(run_config(&server, "Q3 Leads", input, false, None));
    let summary = engine.run(&CancellationToken::new()).await.unwrap();

    throttled.assert_hits_async(3).await;
    accepted.assert_hits_async(1).await;
    assert_eq!(summary.upload.created, 1);
    assert_eq!(summary.upload.failed, 1);
    assert_eq!(summary.upload.failures[0].email, "slow@example.com");
}

#[tokio::test]
async fn test_rejected_email_is_not_retried() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir, "email\nnot-an-email\n");

    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/labels");
            then.status(200).json_body(json!({"label": {"id": "L1"}}));
        })
        .await;
    let rejected = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/contacts");
            then.status(422).json_body(json!({"error": "Email is invalid"}));
        })
        .await;

    let engine = engine_for(run_config(&server, "Q3 Leads", input, false, None));
    let summary = engine.run(&CancellationToken::new()).await.unwrap();

    rejected.assert_hits_async(1).await;
    assert_eq!(summary.upload.failed, 1);
    assert!(summary.upload.failures[0].reason.contains("Email is invalid"));
}

#[tokio::test]
async fn test_missing_input_file_makes_no_network_calls() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("missing.csv");

    let server = MockServer::start_async().await;
    let create_list = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/labels");
            then.status(200).json_body(json!({"label": {"id": "L1"}}));
        })
        .await;

    let engine = engine_for(run_config(
        &server,
        "Q3 Leads",
        missing.to_str().unwrap().to_string(),
        false,
        None,
    ));
    let result = engine.run(&CancellationToken::new()).await;

    assert!(matches!(result, Err(UploadError::ConfigError { .. })));
    create_list.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_invalid_api_key_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir, "email\nada@example.com\n");

    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/labels");
            then.status(401).json_body(json!({"error": "Invalid access credentials."}));
        })
        .await;
    let create_contact = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/contacts");
            then.status(200).json_body(json!({"contact": {"id": "c1"}}));
        })
        .await;

    let engine = engine_for(run_config(&server, "Q3 Leads", input, false, None));
    let result = engine.run(&CancellationToken::new()).await;

    assert!(matches!(result, Err(UploadError::ListResolution { .. })));
    create_contact.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_interrupted_run_sends_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir, "email\nada@example.com\ngrace@example.com\n");

    let server = MockServer::start_async().await;
    let create_list = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/labels");
            then.status(200).json_body(json!({"label": {"id": "L1"}}));
        })
        .await;
    let create_contact = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/contacts");
            then.status(200).json_body(json!({"contact": {"id": "c1"}}));
        })
        .await;

    let shutdown = CancellationToken::new();
    shutdown.cancel();
    let engine = engine_for(run_config(&server, "Q3 Leads", input, false, None));
    let summary = engine.run(&shutdown).await.unwrap();

    assert!(summary.cancelled);
    create_list.assert_hits_async(0).await;
    create_contact.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_unavailable_service_during_list_creation_stays_transient() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir, "email\nada@example.com\n");

    let server = MockServer::start_async().await;
    let create_list = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/labels");
            then.status(503).body("Service Unavailable");
        })
        .await;

    let engine = engine_for(run_config(&server, "Q3 Leads", input, false, None));
    let result = engine.run(&CancellationToken::new()).await;

    // 重試用完後仍保留原本的錯誤型別，才會以 exit 2 結束
    create_list.assert_hits_async(3).await;
    match result {
        Err(error @ UploadError::RemoteTransient { status: 503, .. }) => {
            assert_eq!(error.severity(), ErrorSeverity::Medium);
        }
        other => panic!("expected transient error, got {:?}", other),
    }
}
