//! Google OAuth2 credential management for drivetab.
//!
//! Covers the credential sources drivetab supports:
//! - [`ClientSecrets`]: the OAuth client from `client_secrets.json`
//! - [`StoredCredentials`]: cached user tokens in `credentials.json`, refreshed on expiry
//! - [`OAuthFlow`] + [`LoopbackReceiver`]: interactive consent
//! - [`ServiceAccountKey`]: JWT-bearer grant for unattended use
//!
//! [`authenticate`] picks between them and yields a [`TokenProvider`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod credentials;
pub mod flow;
pub mod loopback;
pub mod provider;
pub mod secrets;
pub mod service_account;

pub use credentials::StoredCredentials;
pub use flow::{CallbackParams, OAuthFlow, refresh_credentials};
pub use loopback::LoopbackReceiver;
pub use provider::{
    AuthState, ServiceAccountTokenProvider, StaticTokenProvider, TokenProvider, UserTokenProvider,
    authenticate, complete_login, logout,
};
pub use secrets::ClientSecrets;
pub use service_account::ServiceAccountKey;

/// Random value for the OAuth `state` parameter.
pub fn new_state() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
