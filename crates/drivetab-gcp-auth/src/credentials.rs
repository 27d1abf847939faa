//! Cached user credentials (`credentials.json`) and token endpoint responses.

use std::path::Path;

use chrono::{DateTime, TimeDelta, Utc};
use drivetab_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Tokens expiring within this window are treated as already expired.
const EXPIRY_SKEW_SECS: i64 = 60;

/// User credentials persisted between runs.
///
/// The client identity and token endpoint are stored alongside the tokens so
/// that a refresh does not need `client_secrets.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentials {
    /// Bearer token for API calls.
    pub access_token: String,
    /// Long-lived token used to mint new access tokens.
    pub refresh_token: Option<String>,
    /// Access token expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// Granted scopes.
    #[serde(default)]
    pub scopes: Vec<String>,
    /// OAuth client ID the tokens were issued to.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Token endpoint for refreshes.
    pub token_uri: String,
}

impl StoredCredentials {
    /// Load credentials from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load credentials if the file exists.
    pub fn load_optional(path: &Path) -> Result<Option<Self>> {
        if path.exists() {
            Self::load(path).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Write credentials to a JSON file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| Error::io_with_path(e, path))?;
        tracing::debug!(path = %path.display(), "saved credentials");
        Ok(())
    }

    /// Whether the access token is expired (or about to be) at `now`.
    ///
    /// Credentials without an expiry never expire.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at - TimeDelta::seconds(EXPIRY_SKEW_SECS) <= now)
    }

    /// Merge a refresh response into these credentials.
    ///
    /// Google usually omits the refresh token from refresh responses; the
    /// previous one is kept in that case.
    pub fn apply_refresh(&mut self, response: TokenResponse, now: DateTime<Utc>) {
        self.expires_at = response.expires_at(now);
        self.access_token = response.access_token;
        if let Some(refresh) = response.refresh_token {
            self.refresh_token = Some(refresh);
        }
        if let Some(scope) = response.scope {
            self.scopes = split_scopes(&scope);
        }
    }
}

/// Successful response from an OAuth2 token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// New access token.
    pub access_token: String,
    /// Lifetime in seconds.
    pub expires_in: Option<i64>,
    /// Refresh token, present on first consent.
    pub refresh_token: Option<String>,
    /// Space-separated granted scopes.
    pub scope: Option<String>,
    /// Usually `Bearer`.
    pub token_type: Option<String>,
}

impl TokenResponse {
    /// Absolute expiry computed from `expires_in`.
    pub fn expires_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.expires_in
            .and_then(TimeDelta::try_seconds)
            .map(|lifetime| now + lifetime)
    }
}

/// Error body returned by an OAuth2 token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenErrorResponse {
    /// Error code, e.g. `invalid_grant`.
    pub error: String,
    /// Human-readable description.
    pub error_description: Option<String>,
}

impl std::fmt::Display for TokenErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.error_description {
            Some(desc) => write!(f, "{}: {desc}", self.error),
            None => write!(f, "{}", self.error),
        }
    }
}

/// Split a space-separated scope string.
pub fn split_scopes(scope: &str) -> Vec<String> {
    scope.split_whitespace().map(str::to_string).collect()
}
