//! The listing/download interface and Drive query strings.

use async_trait::async_trait;
use drivetab_core::types::FOLDER_MIME_TYPE;
use drivetab_core::{DriveItem, FoundFile, Result};

/// Operations the search and load steps need from Drive.
#[async_trait]
pub trait DriveApi: Send + Sync {
    /// Every item matching the Drive query `query`, across all pages.
    async fn list(&self, query: &str) -> Result<Vec<DriveItem>>;

    /// The content of `file`.
    async fn download(&self, file: &FoundFile) -> Result<Vec<u8>>;
}

/// Query for non-trashed folders, optionally only those directly under
/// "My Drive".
pub fn folders_query(root_only: bool) -> String {
    let mut query = format!("mimeType = '{FOLDER_MIME_TYPE}' and trashed = false");
    if root_only {
        query.push_str(" and 'root' in parents");
    }
    query
}

/// Query for the non-trashed children of `folder_id`.
pub fn children_query(folder_id: &str) -> String {
    format!("'{}' in parents and trashed = false", quote(folder_id))
}

/// Escape a value for use inside a single-quoted query literal.
fn quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
