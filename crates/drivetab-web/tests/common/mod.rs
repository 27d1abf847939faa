//! Shared fixtures: a fake Drive, workbook builders and a cookie-aware client.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use drivetab_adapter_gdrive::{DriveApi, children_query, folders_query};
use drivetab_core::types::FOLDER_MIME_TYPE;
use drivetab_core::{DriveItem, DrivetabConfig, Error, FoundFile, Result};
use drivetab_web::{AppState, Connection, router};
use rust_xlsxwriter::Workbook;
use tower::ServiceExt;

// ============================================================================
// Fake Drive
// ============================================================================

/// Folder tree held in memory.
#[derive(Default)]
pub struct FakeDrive {
    folders: Vec<DriveItem>,
    children: HashMap<String, Vec<DriveItem>>,
    contents: HashMap<String, Vec<u8>>,
    pub listings: AtomicUsize,
}

impl FakeDrive {
    pub fn folder(mut self, parent: &str, id: &str, name: &str) -> Self {
        let item = DriveItem {
            id: id.into(),
            name: name.into(),
            mime_type: FOLDER_MIME_TYPE.into(),
            download_url: None,
        };
        self.folders.push(item.clone());
        self.children.entry(parent.into()).or_default().push(item);
        self
    }

    pub fn file(mut self, parent: &str, id: &str, name: &str, content: Vec<u8>) -> Self {
        self.children.entry(parent.into()).or_default().push(DriveItem {
            id: id.into(),
            name: name.into(),
            mime_type: "application/octet-stream".into(),
            download_url: Some(format!("fake://{id}")),
        });
        self.contents.insert(id.into(), content);
        self
    }
}

#[async_trait]
impl DriveApi for FakeDrive {
    async fn list(&self, query: &str) -> Result<Vec<DriveItem>> {
        if query == folders_query(false) || query == folders_query(true) {
            self.listings.fetch_add(1, Ordering::SeqCst);
            return Ok(self.folders.clone());
        }
        Ok(self
            .children
            .iter()
            .find(|(parent, _)| children_query(parent) == query)
            .map(|(_, items)| items.clone())
            .unwrap_or_default())
    }

    async fn download(&self, file: &FoundFile) -> Result<Vec<u8>> {
        self.contents
            .get(&file.id)
            .cloned()
            .ok_or_else(|| Error::http(404, format!("{} not found", file.id)))
    }
}

/// A site report with one numeric column.
pub fn report(rows: &[(&str, f64)]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "site").unwrap();
    sheet.write_string(0, 1, "tx_curr").unwrap();
    for (i, (site, value)) in rows.iter().enumerate() {
        let r = i as u32 + 1;
        sheet.write_string(r, 0, *site).unwrap();
        sheet.write_number(r, 1, *value).unwrap();
    }
    workbook.save_to_buffer().unwrap()
}

/// Two folders; `Reports` holds two matching workbooks (one nested) and noise.
pub fn drive() -> FakeDrive {
    FakeDrive::default()
        .folder("root", "reports", "Reports")
        .folder("root", "empty", "Empty")
        .file("reports", "q1", "TX_CURR Q1.xlsx", report(&[("Nairobi", 120.0), ("Kisumu", 80.0)]))
        .file("reports", "notes", "notes.txt", b"hello".to_vec())
        .folder("reports", "archive", "archive")
        .file("archive", "q2", "tx_curr q2.xlsx", report(&[("Mombasa", 60.0)]))
}

pub fn connected(api: FakeDrive) -> Connection {
    Connection::Connected {
        api: Arc::new(api),
        label: "static token".into(),
    }
}

// ============================================================================
// Client
// ============================================================================

/// A response with its body collected.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn location(&self) -> &str {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    pub fn header(&self, name: header::HeaderName) -> &str {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }
}

/// Sends requests through the router like a browser: keeps the session cookie.
pub struct TestClient {
    pub state: Arc<AppState>,
    router: Router,
    cookie: Option<String>,
}

impl TestClient {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            router: router(Arc::clone(&state)),
            state,
            cookie: None,
        }
    }

    pub fn with_connection(config: DrivetabConfig, connection: Connection) -> Self {
        Self::new(Arc::new(AppState::new(config, connection)))
    }

    /// Another browser on the same server.
    pub fn second_browser(&self) -> Self {
        Self::new(Arc::clone(&self.state))
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let request = self.request("GET", uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post_form(&mut self, uri: &str, form: &str) -> TestResponse {
        let request = self
            .request("POST", uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap();
        self.send(request).await
    }

    fn request(&self, method: &str, uri: &str) -> axum::http::request::Builder {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::HOST, "localhost:8501");
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie.as_str());
        }
        builder
    }

    async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        if let Some(set) = response.headers().get(header::SET_COOKIE) {
            let pair = set.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();
        TestResponse {
            status,
            headers,
            body,
        }
    }
}
