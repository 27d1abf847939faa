//! Service-account keys and the JWT-bearer grant.

use std::path::Path;

use chrono::{DateTime, Utc};
use drivetab_core::{Error, Result};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};

use crate::credentials::TokenResponse;
use crate::flow::post_token_form;
use crate::secrets::DEFAULT_TOKEN_URI;

/// Lifetime requested for assertions; Google caps it at one hour.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// The fields of a service-account key file that the grant needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    /// Account e-mail, used as the assertion issuer.
    pub client_email: String,
    /// PKCS#8 PEM private key.
    pub private_key: String,
    /// Key ID, placed in the JWT header when present.
    pub private_key_id: Option<String>,
    /// Token endpoint and assertion audience.
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

impl ServiceAccountKey {
    /// Load a key file downloaded from the Cloud console.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        Self::from_json(&content)
    }

    /// Parse a key file's contents.
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| Error::auth(format!("invalid service account key: {e}")))
    }

    /// Build a signed RS256 assertion for `scopes`, issued at `now`.
    pub fn assertion(&self, scopes: &[String], now: DateTime<Utc>) -> Result<String> {
        let iat = now.timestamp();
        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: scopes.join(" "),
            aud: &self.token_uri,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();

        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .map_err(|e| Error::auth(format!("invalid service account private key: {e}")))?;
        encode(&header, &claims, &key)
            .map_err(|e| Error::auth(format!("failed to sign assertion: {e}")))
    }

    /// Exchange a fresh assertion for an access token.
    pub async fn fetch_token(
        &self,
        http: &reqwest::Client,
        scopes: &[String],
    ) -> Result<TokenResponse> {
        let assertion = self.assertion(scopes, Utc::now())?;
        tracing::debug!(account = %self.client_email, "requesting service account token");
        post_token_form(
            http,
            &self.token_uri,
            &[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())],
        )
        .await
    }
}
