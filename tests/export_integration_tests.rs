mod common;

use common::{api_for, project, read_json};
use pdp_cli::entity::Product;
use pdp_cli::error::ErrorKind;
use pdp_cli::export::{export, ExportOptions};
use pdp_cli::validate::Severity;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const fn options() -> ExportOptions {
    ExportOptions {
        keep_volatile: false,
        missing_mappings: Severity::Warning,
    }
}

async fn mount_list(server: &MockServer, api_path: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(api_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_ingestion_and_core(server: &MockServer) {
    mount_list(
        server,
        "/v1/credential",
        json!([{"id": "cred-1", "name": "S3 Creds"}]),
    )
    .await;
    mount_list(
        server,
        "/v1/processor",
        json!([{"id": "proc-999", "name": "OCR Processor", "credentialId": "cred-1"}]),
    )
    .await;
    mount_list(
        server,
        "/v1/pipeline",
        json!([{"id": "pipe-1", "name": "Ingest", "steps": [{"processorId": "proc-999"}]}]),
    )
    .await;
    mount_list(
        server,
        "/v1/seed",
        json!([{
            "id": "seed-1",
            "name": "Web",
            "pipelineId": "pipe-1",
            "creationTimestamp": "2024-03-01T10:00:00Z",
            "lastUpdatedTimestamp": "2024-03-02T10:00:00Z"
        }]),
    )
    .await;
    mount_list(server, "/v1/scheduler", json!([{"id": "sch-1", "seedId": "seed-1"}])).await;
}

#[tokio::test]
async fn test_export_writes_name_references() {
    let server = MockServer::start().await;
    mount_ingestion_and_core(&server).await;
    let dir = TempDir::new().unwrap();

    let report = export(
        &api_for(&server.uri()),
        &project(dir.path()),
        &[Product::Ingestion, Product::Core],
        options(),
    )
    .await
    .unwrap();

    assert!(!report.failed());
    assert_eq!(report.missing_count(), 0);
    assert_eq!(
        read_json(dir.path(), "Ingestion/processors.json"),
        json!([{"id": "proc-999", "name": "OCR Processor", "credentialId": "{{ fromName('s3 creds') }}"}])
    );
    assert_eq!(
        read_json(dir.path(), "Ingestion/pipelines.json"),
        json!([{"id": "pipe-1", "name": "Ingest", "steps": [{"processorId": "{{ fromName('ocr processor') }}"}]}])
    );
    assert_eq!(
        read_json(dir.path(), "Ingestion/seeds.json"),
        json!([{"id": "seed-1", "name": "Web", "pipelineId": "{{ fromName('ingest') }}"}])
    );
    assert_eq!(
        read_json(dir.path(), "Ingestion/schedulers.json"),
        json!([{"id": "sch-1", "seedId": "{{ fromName('web') }}"}])
    );
}

#[tokio::test]
async fn test_export_keeps_volatile_fields_when_asked() {
    let server = MockServer::start().await;
    mount_ingestion_and_core(&server).await;
    let dir = TempDir::new().unwrap();

    export(
        &api_for(&server.uri()),
        &project(dir.path()),
        &[Product::Ingestion, Product::Core],
        ExportOptions {
            keep_volatile: true,
            ..options()
        },
    )
    .await
    .unwrap();

    let seeds = read_json(dir.path(), "Ingestion/seeds.json");
    assert_eq!(seeds[0]["creationTimestamp"], "2024-03-01T10:00:00Z");
}

#[tokio::test]
async fn test_unknown_ids_are_kept_and_reported() {
    let server = MockServer::start().await;
    mount_ingestion_and_core(&server).await;
    let dir = TempDir::new().unwrap();

    // Core is not exported and has no local file, so cred-1 has no name
    let report = export(
        &api_for(&server.uri()),
        &project(dir.path()),
        &[Product::Ingestion],
        ExportOptions {
            missing_mappings: Severity::Error,
            ..options()
        },
    )
    .await
    .unwrap();

    assert_eq!(report.missing_count(), 1);
    assert!(report.failed());
    assert_eq!(
        read_json(dir.path(), "Ingestion/processors.json")[0]["credentialId"],
        "cred-1"
    );
    // The rest of the run is unaffected
    assert_eq!(
        read_json(dir.path(), "Ingestion/pipelines.json")[0]["steps"][0]["processorId"],
        "{{ fromName('ocr processor') }}"
    );
}

#[tokio::test]
async fn test_names_of_unselected_products_come_from_local_files() {
    let server = MockServer::start().await;
    mount_ingestion_and_core(&server).await;
    let dir = TempDir::new().unwrap();
    common::write_json(
        dir.path(),
        "Core/credentials.json",
        &json!([{"id": "cred-1", "name": "S3 Creds"}]),
    );

    let report = export(
        &api_for(&server.uri()),
        &project(dir.path()),
        &[Product::Ingestion],
        options(),
    )
    .await
    .unwrap();

    assert_eq!(report.missing_count(), 0);
    assert_eq!(
        read_json(dir.path(), "Ingestion/processors.json")[0]["credentialId"],
        "{{ fromName('s3 creds') }}"
    );
}

#[tokio::test]
async fn test_paged_listing_is_followed_to_the_last_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/credential"))
        .and(query_param("page", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{"id": "c1", "name": "one"}],
            "last": false
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/credential"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{"id": "c2", "name": "two"}],
            "last": true
        })))
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();

    let report = export(
        &api_for(&server.uri()),
        &project(dir.path()),
        &[Product::Core],
        options(),
    )
    .await
    .unwrap();

    assert_eq!(report.types[0].count, 2);
    assert_eq!(
        read_json(dir.path(), "Core/credentials.json"),
        json!([{"id": "c1", "name": "one"}, {"id": "c2", "name": "two"}])
    );
}

#[tokio::test]
async fn test_failed_listing_only_affects_that_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/credential"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"message": "database unavailable"})),
        )
        .mount(&server)
        .await;
    mount_list(&server, "/v1/processor", json!([{"id": "p", "name": "plain"}])).await;
    mount_list(&server, "/v1/pipeline", json!([])).await;
    mount_list(&server, "/v1/seed", json!([])).await;
    mount_list(&server, "/v1/scheduler", json!([])).await;
    let dir = TempDir::new().unwrap();

    let report = export(
        &api_for(&server.uri()),
        &project(dir.path()),
        &[Product::Core, Product::Ingestion],
        options(),
    )
    .await
    .unwrap();

    let credentials = &report.types[0];
    assert_eq!(credentials.file, "Core/credentials.json");
    assert!(credentials
        .error
        .as_deref()
        .is_some_and(|e| e.contains("database unavailable")));
    assert!(report.failed());
    assert!(!dir.path().join("Core/credentials.json").exists());
    assert_eq!(
        read_json(dir.path(), "Ingestion/processors.json"),
        json!([{"id": "p", "name": "plain"}])
    );
}

#[tokio::test]
async fn test_http_errors_carry_status_and_server_messages() {
    use pdp_cli::api::EntityApi;
    use pdp_cli::entity::{registry, EntityKind};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/seed"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "errors": [{"message": "forbidden for tenant"}]
        })))
        .mount(&server)
        .await;

    let err = api_for(&server.uri())
        .list(registry::get(EntityKind::Seed))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), Some(ErrorKind::HttpRequest));
    assert_eq!(err.http_status(), Some(403));
    assert!(err.to_string().contains("forbidden for tenant"));
}
