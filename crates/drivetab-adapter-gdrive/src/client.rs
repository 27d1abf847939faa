//! Drive v3 REST client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use drivetab_core::config::DriveSettings;
use drivetab_core::{DriveItem, Error, FoundFile, Result};
use drivetab_gcp_auth::TokenProvider;
use serde::Deserialize;

use crate::api::DriveApi;

const LIST_FIELDS: &str = "nextPageToken,files(id,name,mimeType)";

/// One page of a `files.list` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    next_page_token: Option<String>,
    #[serde(default)]
    files: Vec<FileResource>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileResource {
    id: String,
    name: String,
    mime_type: String,
}

/// Drive client authenticating with bearer tokens from a [`TokenProvider`].
///
/// Requests failing with a retryable error (transport failure, 429, 5xx)
/// are retried with exponential backoff up to `max_retries` times.
#[derive(Clone)]
pub struct DriveClient {
    http: reqwest::Client,
    tokens: Arc<dyn TokenProvider>,
    api_base: String,
    page_size: u32,
    max_retries: usize,
    retry_delay: Duration,
}

impl std::fmt::Debug for DriveClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriveClient")
            .field("api_base", &self.api_base)
            .field("tokens", &self.tokens.describe())
            .finish_non_exhaustive()
    }
}

impl DriveClient {
    /// Create a client from the `[drive]` settings.
    pub fn new(tokens: Arc<dyn TokenProvider>, settings: &DriveSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            tokens,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            page_size: settings.page_size,
            max_retries: settings.max_retries,
            retry_delay: Duration::from_millis(500),
        }
    }

    /// Use an existing HTTP client.
    pub fn with_http(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Set the first backoff delay.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Content link for a binary file.
    pub fn download_url(&self, file_id: &str) -> String {
        format!("{}/files/{file_id}?alt=media", self.api_base)
    }

    fn item(&self, file: FileResource) -> DriveItem {
        let mut item = DriveItem {
            id: file.id,
            name: file.name,
            mime_type: file.mime_type,
            download_url: None,
        };
        if !item.is_google_native() {
            item.download_url = Some(self.download_url(&item.id));
        }
        item
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.retry_delay)
            .with_max_delay(self.retry_delay * 16)
            .with_max_times(self.max_retries)
            .with_jitter()
    }

    /// GET `url` with retries and return the body.
    async fn get_bytes(&self, url: &str, query: &[(&str, &str)]) -> Result<Vec<u8>> {
        (|| self.get_once(url, query))
            .retry(self.backoff())
            .when(Error::is_retryable)
            .notify(|err, delay| {
                tracing::warn!(error = %err, ?delay, url, "drive request failed, retrying");
            })
            .await
    }

    async fn get_once(&self, url: &str, query: &[(&str, &str)]) -> Result<Vec<u8>> {
        let token = self.tokens.access_token().await?;
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::transport(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::transport(format!("reading response from {url} failed: {e}")))?;

        if !status.is_success() {
            let message = api_error_message(&body)
                .unwrap_or_else(|| String::from_utf8_lossy(&body).into_owned());
            return Err(Error::http(status.as_u16(), message));
        }
        Ok(body.to_vec())
    }
}

/// Extract `error.message` from a Drive error body.
fn api_error_message(body: &[u8]) -> Option<String> {
    #[derive(Deserialize)]
    struct Envelope {
        error: Detail,
    }
    #[derive(Deserialize)]
    struct Detail {
        message: String,
    }
    serde_json::from_slice::<Envelope>(body)
        .ok()
        .map(|e| e.error.message)
}

#[async_trait]
impl DriveApi for DriveClient {
    async fn list(&self, query: &str) -> Result<Vec<DriveItem>> {
        let url = format!("{}/files", self.api_base);
        let page_size = self.page_size.to_string();
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let mut params: Vec<(&str, &str)> = vec![
                ("q", query),
                ("fields", LIST_FIELDS),
                ("pageSize", page_size.as_str()),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ];
            if let Some(token) = page_token.as_deref() {
                params.push(("pageToken", token));
            }

            let body = self.get_bytes(&url, &params).await?;
            let page: FileList = serde_json::from_slice(&body)?;
            pages += 1;
            items.extend(page.files.into_iter().map(|f| self.item(f)));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        tracing::debug!(query, pages, items = items.len(), "listed drive items");
        Ok(items)
    }

    async fn download(&self, file: &FoundFile) -> Result<Vec<u8>> {
        let url = file
            .download_url
            .as_deref()
            .ok_or_else(|| Error::not_found(format!("download link for {}", file.name)))?;
        let bytes = self.get_bytes(url, &[]).await?;
        tracing::debug!(file = %file.name, bytes = bytes.len(), "downloaded");
        Ok(bytes)
    }
}
