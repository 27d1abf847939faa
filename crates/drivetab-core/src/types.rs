//! Drive records shared between the adapter, the web UI and the CLI.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// MIME type Google Drive uses for folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Prefix of MIME types for Google-native documents (Docs, Sheets, ...).
///
/// These have no binary content and cannot be downloaded directly.
pub const GOOGLE_APPS_MIME_PREFIX: &str = "application/vnd.google-apps.";

/// A file or folder as returned by a Drive listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveItem {
    /// Drive file ID.
    pub id: String,
    /// Display name (title).
    pub name: String,
    /// MIME type.
    pub mime_type: String,
    /// Direct content link, absent for folders and Google-native documents.
    pub download_url: Option<String>,
}

impl DriveItem {
    /// Returns `true` if this item is a folder.
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }

    /// Returns `true` if this item is a Google-native document.
    pub fn is_google_native(&self) -> bool {
        self.mime_type.starts_with(GOOGLE_APPS_MIME_PREFIX)
    }
}

/// A folder offered in the folder picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderEntry {
    /// Drive folder ID.
    pub id: String,
    /// Folder name.
    pub name: String,
}

/// A spreadsheet found by a recursive search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoundFile {
    /// File name.
    pub name: String,
    /// Slash-joined path from the searched folder, e.g. `/2023/q1/tx_curr.xlsx`.
    pub path: String,
    /// Drive file ID.
    pub id: String,
    /// Content link, if the file can be downloaded.
    pub download_url: Option<String>,
}

/// Parameters of one search run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Folder to search under.
    pub folder_id: String,
    /// Case-insensitive substring the file name must contain.
    pub keyword: String,
    /// Case-sensitive suffix the file name must end with, e.g. `.xlsx`.
    pub extension: String,
}

impl SearchRequest {
    /// Create a new search request.
    pub fn new(
        folder_id: impl Into<String>,
        keyword: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            folder_id: folder_id.into(),
            keyword: keyword.into(),
            extension: extension.into(),
        }
    }

    /// Check the request before any API call is made.
    ///
    /// An empty keyword is allowed and matches every file with the extension.
    pub fn validate(&self) -> Result<()> {
        if self.folder_id.trim().is_empty() {
            return Err(Error::validation_field("folder_id", "must not be empty"));
        }
        validate_extension(&self.extension)
    }

    /// Returns `true` if a file named `name` satisfies this request.
    pub fn matches(&self, name: &str) -> bool {
        matches(name, &self.keyword, &self.extension)
    }
}

/// Check that an extension is non-trivial and starts with a dot.
pub fn validate_extension(extension: &str) -> Result<()> {
    if extension.len() < 2 || !extension.starts_with('.') {
        return Err(Error::validation_field(
            "extension",
            format!("'{extension}' must start with '.' and name a file type"),
        ));
    }
    Ok(())
}

/// Keyword/extension filter used by the recursive search.
///
/// The keyword is matched case-insensitively anywhere in the name; the
/// extension is a case-sensitive suffix.
pub fn matches(name: &str, keyword: &str, extension: &str) -> bool {
    name.to_lowercase().contains(&keyword.to_lowercase()) && name.ends_with(extension)
}
