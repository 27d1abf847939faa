//! Application state shared by every request.

use std::sync::Arc;

use drivetab_adapter_gdrive::{DriveApi, DriveClient, list_folders};
use drivetab_core::{DrivetabConfig, FolderEntry};
use drivetab_gcp_auth::{AuthState, OAuthFlow, TokenProvider, authenticate};
use tokio::sync::RwLock;

use crate::session::SessionStore;

/// How the server currently reaches Drive.
#[derive(Clone)]
pub enum Connection {
    /// Authenticated; `label` describes the credentials.
    Connected {
        /// Drive access.
        api: Arc<dyn DriveApi>,
        /// Credential description for the sidebar.
        label: String,
    },
    /// Client secrets are present but the user has not consented yet.
    NeedsLogin(OAuthFlow),
    /// Authentication cannot proceed; the message says why.
    Unavailable(String),
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Connection::Connected { label, .. } => write!(f, "Connected({label})"),
            Connection::NeedsLogin(_) => f.write_str("NeedsLogin"),
            Connection::Unavailable(message) => write!(f, "Unavailable({message})"),
        }
    }
}

/// The connection and a counter bumped each time it is replaced.
struct Current {
    generation: u64,
    connection: Connection,
}

/// State behind the router.
pub struct AppState {
    /// Loaded configuration.
    pub config: DrivetabConfig,
    /// Shared HTTP client for token requests.
    pub http: reqwest::Client,
    /// Per-browser sessions.
    pub sessions: SessionStore,
    // Lock order: `current` before `folders`.
    current: RwLock<Current>,
    folders: RwLock<Option<(u64, Arc<Vec<FolderEntry>>)>>,
}

impl AppState {
    /// State with an explicit connection.
    pub fn new(config: DrivetabConfig, connection: Connection) -> Self {
        let sessions = SessionStore::new(config.server.session_ttl(), config.server.max_sessions);
        Self {
            config,
            http: reqwest::Client::new(),
            sessions,
            current: RwLock::new(Current {
                generation: 0,
                connection,
            }),
            folders: RwLock::new(None),
        }
    }

    /// State whose connection comes from the configured credential files.
    pub async fn from_config(config: DrivetabConfig) -> Self {
        let state = Self::new(config, Connection::Unavailable(String::new()));
        state.reconnect().await;
        state
    }

    /// The current connection.
    pub async fn connection(&self) -> Connection {
        self.current.read().await.connection.clone()
    }

    /// Re-run the credential decision and replace the connection.
    pub async fn reconnect(&self) -> Connection {
        let connection = match authenticate(&self.config.auth, self.http.clone()).await {
            Ok(AuthState::Ready(provider)) => self.connected(provider),
            Ok(AuthState::NeedsLogin(flow)) => {
                tracing::info!("no cached credentials, login required");
                Connection::NeedsLogin(flow)
            }
            Err(e) => {
                tracing::warn!(error = %e, "authentication unavailable");
                Connection::Unavailable(e.to_string())
            }
        };
        self.set_connection(connection.clone()).await;
        connection
    }

    /// Connect with tokens from `provider`.
    pub fn connected(&self, provider: Arc<dyn TokenProvider>) -> Connection {
        let label = provider.describe();
        let client = DriveClient::new(provider, &self.config.drive).with_http(self.http.clone());
        Connection::Connected {
            api: Arc::new(client),
            label,
        }
    }

    /// Replace the connection and forget cached folders.
    pub async fn set_connection(&self, connection: Connection) {
        let mut current = self.current.write().await;
        current.generation += 1;
        current.connection = connection;
        *self.folders.write().await = None;
    }

    /// Folders for the picker, listed once per connection.
    ///
    /// `None` when not connected. A listing that finishes after the
    /// connection was replaced is returned but not cached.
    pub async fn folders(&self) -> Option<drivetab_core::Result<Arc<Vec<FolderEntry>>>> {
        let (generation, api) = {
            let current = self.current.read().await;
            match &current.connection {
                Connection::Connected { api, .. } => (current.generation, Arc::clone(api)),
                _ => return None,
            }
        };
        if let Some((cached, folders)) = self.folders.read().await.as_ref()
            && *cached == generation
        {
            return Some(Ok(Arc::clone(folders)));
        }

        let listed = match list_folders(api.as_ref(), self.config.drive.root_only).await {
            Ok(folders) => Arc::new(folders),
            Err(e) => return Some(Err(e)),
        };
        let current = self.current.read().await;
        if current.generation == generation {
            *self.folders.write().await = Some((generation, Arc::clone(&listed)));
        } else {
            tracing::debug!("connection replaced during folder listing, not caching");
        }
        Some(Ok(listed))
    }
}
