//! OAuth client configuration (`client_secrets.json`).

use std::path::Path;

use drivetab_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Google's consent endpoint, used when the secrets file omits `auth_uri`.
pub const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";

/// Google's token endpoint, used when the secrets file omits `token_uri`.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// OAuth client identity as downloaded from the Cloud console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSecrets {
    /// OAuth client ID.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Consent endpoint.
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    /// Token endpoint.
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    /// Registered redirect URIs.
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The console wraps the client under `installed` (desktop apps) or `web`.
#[derive(Debug, Deserialize)]
struct SecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Load a `client_secrets.json` file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::auth(format!("{} missing", display_name(path))));
        }
        let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        Self::from_json(&content)
    }

    /// Parse the contents of a `client_secrets.json` file.
    pub fn from_json(content: &str) -> Result<Self> {
        let file: SecretsFile = serde_json::from_str(content)?;
        file.installed
            .or(file.web)
            .ok_or_else(|| {
                Error::auth("client secrets have neither an 'installed' nor a 'web' section")
            })
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
