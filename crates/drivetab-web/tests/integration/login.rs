//! Browser consent flow against a wiremock token endpoint.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use axum::http::StatusCode;
use chrono::{TimeDelta, Utc};
use drivetab_core::DrivetabConfig;
use drivetab_gcp_auth::StoredCredentials;
use drivetab_web::{AppState, Connection};
use reqwest::Url;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::TestClient;

const AUTH_URI: &str = "https://accounts.example.com/o/oauth2/auth";

fn config(dir: &Path, server: &MockServer) -> DrivetabConfig {
    let mut config = DrivetabConfig::default();
    config.auth.client_secrets_path = dir.join("client_secrets.json").display().to_string();
    config.auth.credentials_path = dir.join("credentials.json").display().to_string();
    config.drive.api_base = server.uri();
    config
}

fn write_secrets(dir: &Path, server: &MockServer) {
    let secrets = json!({
        "installed": {
            "client_id": "client-1.apps.googleusercontent.com",
            "client_secret": "s3cret",
            "auth_uri": AUTH_URI,
            "token_uri": format!("{}/token", server.uri()),
        }
    });
    std::fs::write(dir.join("client_secrets.json"), secrets.to_string()).unwrap();
}

async fn mount_folders(server: &MockServer, token: &str) {
    Mock::given(method("GET"))
        .and(path("/files"))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [{
                "id": "reports",
                "name": "Reports",
                "mimeType": "application/vnd.google-apps.folder"
            }]
        })))
        .mount(server)
        .await;
}

async fn start_login(client: &mut TestClient) -> HashMap<String, String> {
    let response = client.post_form("/auth/login", "").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    let location = response.location();
    assert!(location.starts_with(AUTH_URI), "{location}");
    Url::parse(location)
        .unwrap()
        .query_pairs()
        .into_owned()
        .collect()
}

#[tokio::test]
async fn test_consent_flow_connects_and_saves_credentials() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    write_secrets(dir.path(), &server);
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=4%2Fabc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.fresh",
            "expires_in": 3599,
            "refresh_token": "1//refresh",
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_folders(&server, "ya29.fresh").await;

    let config = config(dir.path(), &server);
    let state = Arc::new(AppState::from_config(config.clone()).await);
    assert!(matches!(state.connection().await, Connection::NeedsLogin(_)));

    let mut client = TestClient::new(Arc::clone(&state));
    assert!(client.get("/").await.text().contains("Connect to Google Drive"));

    let params = start_login(&mut client).await;
    assert_eq!(params["client_id"], "client-1.apps.googleusercontent.com");
    assert_eq!(params["redirect_uri"], "http://localhost:8501/oauth2/callback");
    let login_state = &params["state"];

    let callback = client
        .get(&format!("/oauth2/callback?code=4%2Fabc&state={login_state}"))
        .await;
    assert_eq!(callback.status, StatusCode::SEE_OTHER);
    assert_eq!(callback.location(), "/");

    assert!(matches!(state.connection().await, Connection::Connected { .. }));
    let saved = StoredCredentials::load(Path::new(&config.auth.credentials_path)).unwrap();
    assert_eq!(saved.access_token, "ya29.fresh");
    assert_eq!(saved.refresh_token.as_deref(), Some("1//refresh"));

    let html = client.get("/").await.text();
    assert!(html.contains("✅ Connected to Google Drive"));
    assert!(html.contains(r#"<option value="reports">Reports</option>"#));
}

#[tokio::test]
async fn test_callback_with_wrong_state_is_rejected() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    write_secrets(dir.path(), &server);
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let state = Arc::new(AppState::from_config(config(dir.path(), &server)).await);
    let mut client = TestClient::new(Arc::clone(&state));
    start_login(&mut client).await;

    client.get("/oauth2/callback?code=4%2Fabc&state=forged").await;
    assert!(matches!(state.connection().await, Connection::NeedsLogin(_)));
    assert!(client.get("/").await.text().contains("authorization state mismatch"));
}

#[tokio::test]
async fn test_callback_without_login_in_progress() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    write_secrets(dir.path(), &server);

    let state = Arc::new(AppState::from_config(config(dir.path(), &server)).await);
    let mut client = TestClient::new(state);
    client.get("/oauth2/callback?code=x&state=y").await;
    assert!(client.get("/").await.text().contains("no login in progress"));
}

#[tokio::test]
async fn test_denied_consent_is_reported() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    write_secrets(dir.path(), &server);

    let state = Arc::new(AppState::from_config(config(dir.path(), &server)).await);
    let mut client = TestClient::new(state);
    let params = start_login(&mut client).await;
    client
        .get(&format!(
            "/oauth2/callback?error=access_denied&state={}",
            params["state"]
        ))
        .await;
    assert!(client.get("/").await.text().contains("access_denied"));
}

#[tokio::test]
async fn test_cached_credentials_skip_consent() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_folders(&server, "ya29.cached").await;
    let config = config(dir.path(), &server);
    StoredCredentials {
        access_token: "ya29.cached".into(),
        refresh_token: Some("1//r".into()),
        expires_at: Some(Utc::now() + TimeDelta::hours(1)),
        scopes: vec![],
        client_id: "c".into(),
        client_secret: "s".into(),
        token_uri: format!("{}/token", server.uri()),
    }
    .save(Path::new(&config.auth.credentials_path))
    .unwrap();

    let state = Arc::new(AppState::from_config(config).await);
    assert!(matches!(state.connection().await, Connection::Connected { .. }));

    let mut client = TestClient::new(state);
    let response = client.post_form("/auth/login", "").await;
    assert_eq!(response.location(), "/");
    assert!(client.get("/").await.text().contains("Reports"));
}

#[tokio::test]
async fn test_missing_secrets_stay_unavailable() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let state = Arc::new(AppState::from_config(config(dir.path(), &server)).await);
    assert!(matches!(state.connection().await, Connection::Unavailable(_)));

    let mut client = TestClient::new(state);
    let response = client.post_form("/auth/login", "").await;
    assert_eq!(response.location(), "/");
    assert!(client.get("/").await.text().contains("client_secrets.json missing"));
}

#[tokio::test]
async fn test_revoked_credentials_offer_renewed_consent() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    write_secrets(dir.path(), &server);
    Mock::given(method("GET"))
        .and(path("/files"))
        .and(header("authorization", "Bearer ya29.revoked"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"code": 401, "message": "Invalid Credentials"}
        })))
        .mount(&server)
        .await;
    let config = config(dir.path(), &server);
    let credentials_path = config.auth.credentials_path.clone();
    StoredCredentials {
        access_token: "ya29.revoked".into(),
        refresh_token: Some("1//r".into()),
        expires_at: Some(Utc::now() + TimeDelta::hours(1)),
        scopes: vec![],
        client_id: "c".into(),
        client_secret: "s".into(),
        token_uri: format!("{}/token", server.uri()),
    }
    .save(Path::new(&credentials_path))
    .unwrap();

    let state = Arc::new(AppState::from_config(config).await);
    let mut client = TestClient::new(state);
    let html = client.get("/").await.text();
    assert!(html.contains("refused the saved credentials"));
    assert!(html.contains("Invalid Credentials"));
    assert!(html.contains(r#"action="/auth/login?renew=true""#));

    // A plain login keeps the cached credentials and stays connected.
    let response = client.post_form("/auth/login", "").await;
    assert_eq!(response.location(), "/");
    assert!(Path::new(&credentials_path).exists());

    let response = client.post_form("/auth/login?renew=true", "").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert!(response.location().starts_with(AUTH_URI));
    assert!(!Path::new(&credentials_path).exists());
    assert!(matches!(
        client.state.connection().await,
        Connection::NeedsLogin(_)
    ));
}
