//! OAuth2 authorization-code flow for installed applications.

use chrono::Utc;
use drivetab_core::{Error, Result};
use reqwest::Url;
use serde::Deserialize;

use crate::credentials::{
    StoredCredentials, TokenErrorResponse, TokenResponse, split_scopes,
};
use crate::secrets::ClientSecrets;

/// Consent flow for one OAuth client and scope set.
#[derive(Debug, Clone)]
pub struct OAuthFlow {
    secrets: ClientSecrets,
    scopes: Vec<String>,
    http: reqwest::Client,
}

impl OAuthFlow {
    /// Create a flow for the given client and scopes.
    pub fn new(secrets: ClientSecrets, scopes: Vec<String>) -> Self {
        Self::with_client(secrets, scopes, reqwest::Client::new())
    }

    /// Create a flow that reuses an existing HTTP client.
    pub fn with_client(secrets: ClientSecrets, scopes: Vec<String>, http: reqwest::Client) -> Self {
        Self {
            secrets,
            scopes,
            http,
        }
    }

    /// The OAuth client this flow authenticates as.
    pub fn secrets(&self) -> &ClientSecrets {
        &self.secrets
    }

    /// Build the consent URL the user must visit.
    ///
    /// Requests offline access and forces the consent prompt so that Google
    /// returns a refresh token even for previously authorized clients.
    pub fn authorization_url(&self, redirect_uri: &str, state: &str) -> Result<String> {
        let scope = self.scopes.join(" ");
        let url = Url::parse_with_params(
            &self.secrets.auth_uri,
            &[
                ("client_id", self.secrets.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("state", state),
            ],
        )
        .map_err(|e| Error::auth(format!("invalid auth_uri '{}': {e}", self.secrets.auth_uri)))?;
        Ok(url.into())
    }

    /// Exchange an authorization code for credentials.
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<StoredCredentials> {
        let response = self
            .token_request(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", self.secrets.client_id.as_str()),
                ("client_secret", self.secrets.client_secret.as_str()),
                ("redirect_uri", redirect_uri),
            ])
            .await?;

        let now = Utc::now();
        let expires_at = response.expires_at(now);
        let scopes = response
            .scope
            .as_deref()
            .map(split_scopes)
            .unwrap_or_else(|| self.scopes.clone());
        tracing::info!("authorization code exchanged for credentials");

        Ok(StoredCredentials {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at,
            scopes,
            client_id: self.secrets.client_id.clone(),
            client_secret: self.secrets.client_secret.clone(),
            token_uri: self.secrets.token_uri.clone(),
        })
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenResponse> {
        post_token_form(&self.http, &self.secrets.token_uri, form).await
    }
}

/// Refresh stored credentials in place using their own client identity.
pub async fn refresh_credentials(
    http: &reqwest::Client,
    credentials: &mut StoredCredentials,
) -> Result<()> {
    let refresh_token = credentials
        .refresh_token
        .clone()
        .ok_or_else(|| Error::auth("credentials have no refresh token; log in again"))?;

    let response = post_token_form(
        http,
        &credentials.token_uri,
        &[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
        ],
    )
    .await?;

    credentials.apply_refresh(response, Utc::now());
    tracing::debug!(expires_at = ?credentials.expires_at, "access token refreshed");
    Ok(())
}

/// POST a form to a token endpoint and decode the success or error body.
pub(crate) async fn post_token_form(
    http: &reqwest::Client,
    token_uri: &str,
    form: &[(&str, &str)],
) -> Result<TokenResponse> {
    let response = http
        .post(token_uri)
        .form(form)
        .send()
        .await
        .map_err(|e| Error::transport(format!("token request failed: {e}")))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| Error::transport(format!("token response unreadable: {e}")))?;

    if !status.is_success() {
        let message = serde_json::from_str::<TokenErrorResponse>(&body)
            .map(|e| e.to_string())
            .unwrap_or(body);
        if status.is_client_error() {
            return Err(Error::auth(format!("token endpoint rejected request: {message}")));
        }
        return Err(Error::http(status.as_u16(), message));
    }

    serde_json::from_str(&body)
        .map_err(|e| Error::auth(format!("token response parse failed: {e}")))
}

/// Query parameters Google appends to the redirect URI.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    /// Authorization code on success.
    pub code: Option<String>,
    /// Echo of the `state` sent with the consent URL.
    pub state: Option<String>,
    /// Error code when the user denied consent.
    pub error: Option<String>,
}

impl CallbackParams {
    /// Extract the code after checking `state` and the provider's error.
    pub fn into_code(self, expected_state: &str) -> Result<String> {
        if let Some(error) = self.error {
            return Err(Error::auth(format!("authorization denied: {error}")));
        }
        if self.state.as_deref() != Some(expected_state) {
            return Err(Error::auth("authorization state mismatch"));
        }
        self.code
            .filter(|c| !c.is_empty())
            .ok_or_else(|| Error::auth("authorization response has no code"))
    }
}
