//! Page rendering across connection states, and sessions.

use std::sync::atomic::Ordering;

use axum::http::{StatusCode, header};
use drivetab_core::DrivetabConfig;
use drivetab_web::Connection;

use crate::common::{FakeDrive, TestClient, connected, drive};

#[tokio::test]
async fn test_health() {
    let mut client = TestClient::with_connection(
        DrivetabConfig::default(),
        Connection::Unavailable("x".into()),
    );
    let response = client.get("/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text(), "ok");
    assert!(response.headers.get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_missing_client_secrets() {
    let mut client = TestClient::with_connection(
        DrivetabConfig::default(),
        Connection::Unavailable("Authentication error: client_secrets.json missing".into()),
    );
    let page = client.get("/").await;
    assert_eq!(page.status, StatusCode::OK);
    let html = page.text();
    assert!(html.contains("client_secrets.json missing"));
    assert!(html.contains("Connect to Google Drive"));
    assert!(!html.contains("Select the root folder"));
}

#[tokio::test]
async fn test_connected_shows_search_form() {
    let mut client = TestClient::with_connection(DrivetabConfig::default(), connected(drive()));
    let html = client.get("/").await.text();
    assert!(html.contains("✅ Connected to Google Drive"));
    assert!(html.contains(r#"<option value="reports">Reports</option>"#));
    assert!(html.contains(r#"<option value="archive">archive</option>"#));
    assert!(html.contains(r#"value="tx_curr""#));
    assert!(html.contains("Run search"));
}

#[tokio::test]
async fn test_folder_listing_is_cached() {
    let drive = std::sync::Arc::new(drive());
    let state = std::sync::Arc::new(drivetab_web::AppState::new(
        DrivetabConfig::default(),
        Connection::Connected {
            api: drive.clone(),
            label: "static token".into(),
        },
    ));
    let mut client = TestClient::new(state);
    client.get("/").await;
    client.get("/?tab=export").await;
    assert_eq!(drive.listings.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_drive_without_folders() {
    let mut client =
        TestClient::with_connection(DrivetabConfig::default(), connected(FakeDrive::default()));
    let html = client.get("/").await.text();
    assert!(html.contains("No folder found in your Google Drive."));
    assert!(!html.contains("Run search"));
}

#[tokio::test]
async fn test_unknown_tab_is_rejected() {
    let mut client =
        TestClient::with_connection(DrivetabConfig::default(), connected(drive()));
    let response = client.get("/?tab=nope").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_session_cookie_is_set_once() {
    let mut client =
        TestClient::with_connection(DrivetabConfig::default(), connected(drive()));
    let first = client.get("/").await;
    let cookie = first.header(header::SET_COOKIE).to_string();
    assert!(cookie.starts_with("drivetab_session="));
    assert!(cookie.contains("HttpOnly"));

    let second = client.get("/").await;
    assert!(second.headers.get(header::SET_COOKIE).is_none());
    assert_eq!(client.state.sessions.len().await, 1);
}

#[tokio::test]
async fn test_cookieless_requests_do_not_grow_sessions_unbounded() {
    let mut config = DrivetabConfig::default();
    config.server.max_sessions = 20;
    let mut client = TestClient::with_connection(config, Connection::Unavailable("x".into()));
    client.get("/").await;

    for _ in 0..200 {
        client.second_browser().get("/").await;
        let again = client.get("/").await;
        assert!(again.headers.get(header::SET_COOKIE).is_none());
    }
    assert_eq!(client.state.sessions.len().await, 20);
}
