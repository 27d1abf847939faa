//! Access-token providers and the startup authentication decision.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use drivetab_core::config::AuthSettings;
use drivetab_core::{Error, Result};
use tokio::sync::Mutex;

use crate::credentials::StoredCredentials;
use crate::flow::{OAuthFlow, refresh_credentials};
use crate::secrets::ClientSecrets;
use crate::service_account::ServiceAccountKey;

/// Source of bearer tokens for API calls.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return a currently valid access token, refreshing it if needed.
    async fn access_token(&self) -> Result<String>;

    /// Short description for status displays.
    fn describe(&self) -> String;
}

// ============================================================================
// UserTokenProvider
// ============================================================================

/// Tokens from a user's consent, refreshed and persisted on expiry.
pub struct UserTokenProvider {
    credentials: Mutex<StoredCredentials>,
    path: Option<PathBuf>,
    http: reqwest::Client,
}

impl UserTokenProvider {
    /// Wrap credentials; refreshed tokens are written back to `path` if given.
    pub fn new(
        credentials: StoredCredentials,
        path: Option<PathBuf>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            credentials: Mutex::new(credentials),
            path,
            http,
        }
    }

    /// Refresh unconditionally and persist the result.
    pub async fn refresh_now(&self) -> Result<()> {
        let mut credentials = self.credentials.lock().await;
        self.refresh_locked(&mut credentials).await
    }

    async fn refresh_locked(&self, credentials: &mut StoredCredentials) -> Result<()> {
        refresh_credentials(&self.http, credentials).await?;
        if let Some(path) = &self.path {
            credentials.save(path)?;
        }
        Ok(())
    }
}

#[async_trait]
impl TokenProvider for UserTokenProvider {
    async fn access_token(&self) -> Result<String> {
        let mut credentials = self.credentials.lock().await;
        if credentials.is_expired(Utc::now()) {
            tracing::debug!("access token expired, refreshing");
            self.refresh_locked(&mut credentials).await?;
        }
        Ok(credentials.access_token.clone())
    }

    fn describe(&self) -> String {
        match &self.path {
            Some(path) => format!("user credentials ({})", path.display()),
            None => "user credentials".to_string(),
        }
    }
}

// ============================================================================
// ServiceAccountTokenProvider
// ============================================================================

struct MintedToken {
    access_token: String,
    expires_at: Option<DateTime<Utc>>,
}

/// Tokens minted from a service-account key, cached until expiry.
pub struct ServiceAccountTokenProvider {
    key: ServiceAccountKey,
    scopes: Vec<String>,
    http: reqwest::Client,
    cached: Mutex<Option<MintedToken>>,
}

impl ServiceAccountTokenProvider {
    /// Create a provider for `key` requesting `scopes`.
    pub fn new(key: ServiceAccountKey, scopes: Vec<String>, http: reqwest::Client) -> Self {
        Self {
            key,
            scopes,
            http,
            cached: Mutex::new(None),
        }
    }
}

#[async_trait]
impl TokenProvider for ServiceAccountTokenProvider {
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();
        if let Some(token) = cached.as_ref() {
            let fresh = token
                .expires_at
                .is_none_or(|at| at - chrono::TimeDelta::seconds(60) > now);
            if fresh {
                return Ok(token.access_token.clone());
            }
        }

        let response = self.key.fetch_token(&self.http, &self.scopes).await?;
        let expires_at = response.expires_at(now);
        let access_token = response.access_token;
        *cached = Some(MintedToken {
            access_token: access_token.clone(),
            expires_at,
        });
        Ok(access_token)
    }

    fn describe(&self) -> String {
        format!("service account {}", self.key.client_email)
    }
}

// ============================================================================
// StaticTokenProvider
// ============================================================================

/// A fixed token, for tests and pre-issued tokens.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    /// Always return `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }

    fn describe(&self) -> String {
        "static token".to_string()
    }
}

// ============================================================================
// authenticate
// ============================================================================

/// Outcome of [`authenticate`].
pub enum AuthState {
    /// Credentials are usable.
    Ready(Arc<dyn TokenProvider>),
    /// No cached credentials; the caller must run the consent flow.
    NeedsLogin(OAuthFlow),
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthState::Ready(provider) => write!(f, "Ready({})", provider.describe()),
            AuthState::NeedsLogin(_) => write!(f, "NeedsLogin"),
        }
    }
}

/// Decide how to obtain tokens from the configured credential files.
///
/// In order: a configured service-account key; cached user credentials
/// (refreshed first if expired); otherwise the client secrets, which the
/// caller uses to run the consent flow. Missing client secrets are an
/// [`Error::Auth`].
pub async fn authenticate(settings: &AuthSettings, http: reqwest::Client) -> Result<AuthState> {
    if let Some(sa_path) = &settings.service_account_path {
        let key = ServiceAccountKey::load(Path::new(sa_path))?;
        tracing::info!(account = %key.client_email, "using service account credentials");
        let provider = ServiceAccountTokenProvider::new(key, settings.scopes.clone(), http);
        return Ok(AuthState::Ready(Arc::new(provider)));
    }

    let credentials_path = PathBuf::from(&settings.credentials_path);
    if let Some(credentials) = StoredCredentials::load_optional(&credentials_path)? {
        let expired = credentials.is_expired(Utc::now());
        let provider = UserTokenProvider::new(credentials, Some(credentials_path), http);
        if expired {
            tracing::info!("cached credentials expired, refreshing");
            provider.refresh_now().await?;
        } else {
            tracing::debug!("using cached credentials");
        }
        return Ok(AuthState::Ready(Arc::new(provider)));
    }

    let secrets = ClientSecrets::load(Path::new(&settings.client_secrets_path))?;
    Ok(AuthState::NeedsLogin(OAuthFlow::with_client(
        secrets,
        settings.scopes.clone(),
        http,
    )))
}

/// Persist credentials from a completed consent and wrap them in a provider.
pub fn complete_login(
    settings: &AuthSettings,
    credentials: StoredCredentials,
    http: reqwest::Client,
) -> Result<Arc<dyn TokenProvider>> {
    let path = PathBuf::from(&settings.credentials_path);
    credentials.save(&path)?;
    tracing::info!(path = %path.display(), "credentials saved");
    Ok(Arc::new(UserTokenProvider::new(credentials, Some(path), http)))
}

/// Delete cached user credentials. Returns `true` if a file was removed.
pub fn logout(settings: &AuthSettings) -> Result<bool> {
    let path = Path::new(&settings.credentials_path);
    if !path.exists() {
        return Ok(false);
    }
    std::fs::remove_file(path).map_err(|e| Error::io_with_path(e, path))?;
    Ok(true)
}
