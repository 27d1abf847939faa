//! `auth`, `folders` and `search` end to end.

use std::path::Path;

use chrono::{TimeDelta, Utc};
use drivetab_adapter_gdrive::{children_query, folders_query};
use drivetab_cli::cli::AuthAction;
use drivetab_cli::commands::{SearchArgs, cmd_auth, cmd_folders, cmd_search};
use drivetab_core::DrivetabConfig;
use drivetab_gcp_auth::StoredCredentials;
use rust_xlsxwriter::Workbook;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FOLDER_MIME: &str = "application/vnd.google-apps.folder";
const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

fn logged_in_config(dir: &Path, server: &MockServer) -> DrivetabConfig {
    let mut config = DrivetabConfig::default();
    config.auth.client_secrets_path = dir.join("client_secrets.json").display().to_string();
    config.auth.credentials_path = dir.join("credentials.json").display().to_string();
    config.drive.api_base = server.uri();
    StoredCredentials {
        access_token: "ya29.cli".into(),
        refresh_token: Some("1//r".into()),
        expires_at: Some(Utc::now() + TimeDelta::hours(1)),
        scopes: vec![],
        client_id: "c".into(),
        client_secret: "s".into(),
        token_uri: format!("{}/token", server.uri()),
    }
    .save(Path::new(&config.auth.credentials_path))
    .unwrap();
    config
}

fn report() -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "site").unwrap();
    sheet.write_string(0, 1, "tx_curr").unwrap();
    sheet.write_string(1, 0, "Nairobi").unwrap();
    sheet.write_number(1, 1, 120.0).unwrap();
    workbook.save_to_buffer().unwrap()
}

async fn downloads(server: &MockServer, file_id: &str) -> usize {
    let target = format!("/files/{file_id}");
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == target)
        .count()
}

async fn mount_drive(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/files"))
        .and(header("authorization", "Bearer ya29.cli"))
        .and(query_param("q", folders_query(false).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [{"id": "rep", "name": "Reports", "mimeType": FOLDER_MIME}]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files"))
        .and(query_param("q", children_query("rep").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [
                {"id": "a", "name": "TX_CURR 2024.xlsx", "mimeType": XLSX_MIME},
                {"id": "b", "name": "budget.xlsx", "mimeType": XLSX_MIME}
            ]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/a"))
        .and(query_param("alt", "media"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(report()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_search_prints_report_and_exports_csv() {
    let server = MockServer::start().await;
    mount_drive(&server).await;
    let dir = TempDir::new().unwrap();
    let config = logged_in_config(dir.path(), &server);
    let target = dir.path().join("combined.csv");

    let mut buf = Vec::new();
    cmd_search(
        &config,
        SearchArgs {
            folder: "Reports".into(),
            keyword: None,
            extension: None,
            out: Some(target.display().to_string()),
        },
        &mut buf,
    )
    .await
    .unwrap();

    let text = String::from_utf8(buf).unwrap();
    assert!(text.contains("Results for folder: Reports"));
    assert!(text.contains("1 files found!"));
    assert!(text.contains("/TX_CURR 2024.xlsx"));
    assert!(!text.contains("budget"));
    assert!(text.contains("Rows: 1 | Columns: 2"));
    assert_eq!(
        std::fs::read_to_string(&target).unwrap(),
        "site,tx_curr\nNairobi,120\n"
    );
    assert_eq!(downloads(&server, "a").await, 1);
    assert_eq!(downloads(&server, "b").await, 0);
}

#[tokio::test]
async fn test_search_export_write_failure_names_the_path() {
    let server = MockServer::start().await;
    mount_drive(&server).await;
    let dir = TempDir::new().unwrap();
    let config = logged_in_config(dir.path(), &server);
    let target = dir.path().join("missing").join("combined.csv");

    let err = cmd_search(
        &config,
        SearchArgs {
            folder: "rep".into(),
            keyword: None,
            extension: None,
            out: Some(target.display().to_string()),
        },
        &mut Vec::new(),
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("combined.csv"));
    assert!(!target.exists());
}

#[tokio::test]
async fn test_search_rejects_unknown_export_format_before_searching() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = logged_in_config(dir.path(), &server);

    let err = cmd_search(
        &config,
        SearchArgs {
            folder: "rep".into(),
            keyword: None,
            extension: None,
            out: Some("combined.json".into()),
        },
        &mut Vec::new(),
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains(".csv or .xlsx"));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_folders_lists_drive_folders() {
    let server = MockServer::start().await;
    mount_drive(&server).await;
    let dir = TempDir::new().unwrap();
    let config = logged_in_config(dir.path(), &server);

    let mut buf = Vec::new();
    cmd_folders(&config, &mut buf).await.unwrap();
    let text = String::from_utf8(buf).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines, ["ID      NAME", "rep  Reports"]);
    assert_eq!(downloads(&server, "a").await, 0);
}

#[tokio::test]
async fn test_auth_status_and_logout() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = logged_in_config(dir.path(), &server);

    let mut buf = Vec::new();
    cmd_auth(&config, AuthAction::Status, &mut buf).await.unwrap();
    assert!(String::from_utf8(buf).unwrap().contains("Connected with user credentials"));

    let mut buf = Vec::new();
    cmd_auth(&config, AuthAction::Logout, &mut buf).await.unwrap();
    assert!(String::from_utf8(buf).unwrap().contains("Removed cached credentials"));
    assert!(!Path::new(&config.auth.credentials_path).exists());

    // Without credentials or client secrets, status reports the missing file.
    let err = cmd_auth(&config, AuthAction::Status, &mut Vec::new())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("client_secrets.json missing"));
}

#[tokio::test]
async fn test_search_requires_login() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("client_secrets.json"),
        r#"{"installed": {"client_id": "a", "client_secret": "b"}}"#,
    )
    .unwrap();
    let mut config = DrivetabConfig::default();
    config.auth.client_secrets_path = dir.path().join("client_secrets.json").display().to_string();
    config.auth.credentials_path = dir.path().join("credentials.json").display().to_string();

    let err = cmd_folders(&config, &mut Vec::new()).await.unwrap_err();
    assert!(err.to_string().contains("drivetab auth login"));
}
