//! Cookie-keyed browser sessions.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, header};
use axum::middleware::Next;
use axum::response::Response;
use drivetab_adapter_gdrive::SearchOutcome;
use drivetab_core::config::ServerSettings;
use drivetab_frame::Summary;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::time::Instant;
use uuid::Uuid;

use crate::state::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "drivetab_session";

/// Session ID attached to each request by [`session_layer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

/// Banner severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Green.
    Success,
    /// Blue.
    Info,
    /// Amber.
    Warning,
    /// Red.
    Error,
}

/// A message shown once on the next page render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    /// Severity.
    pub level: Level,
    /// Text.
    pub message: String,
}

impl Flash {
    /// An error banner.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
        }
    }
}

/// A finished search and everything derived from it.
#[derive(Debug, Clone)]
pub struct SearchResults {
    /// Display name of the searched folder.
    pub folder_name: String,
    /// Files, combined frame and load warnings.
    pub outcome: SearchOutcome,
    /// Statistics of the combined frame.
    pub summary: Summary,
}

/// What one browser has entered and produced.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Last selected folder.
    pub folder_id: Option<String>,
    /// Last keyword.
    pub keyword: Option<String>,
    /// Last extension.
    pub extension: Option<String>,
    /// Last search, if any.
    pub results: Option<Arc<SearchResults>>,
    /// `state` of a consent request in progress.
    pub login_state: Option<String>,
    /// Redirect URI registered with that consent request.
    pub login_redirect: Option<String>,
    /// Pending banner.
    pub flash: Option<Flash>,
}

#[derive(Debug)]
struct Entry {
    session: Session,
    last_seen: Instant,
}

impl Entry {
    fn new(now: Instant) -> Self {
        Self {
            session: Session::default(),
            last_seen: now,
        }
    }
}

/// All live sessions.
///
/// Sessions idle for longer than the TTL are purged whenever a new one is
/// created; at capacity the least recently seen session is evicted.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Entry>>,
    ttl: Duration,
    capacity: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        let server = ServerSettings::default();
        Self::new(server.session_ttl(), server.max_sessions)
    }
}

impl SessionStore {
    /// A store keeping at most `capacity` sessions, each for `ttl` of idleness.
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Return `id` if it names a live session, otherwise create a new one.
    ///
    /// The flag is `true` when a session was created.
    pub async fn resolve(&self, id: Option<Uuid>) -> (Uuid, bool) {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        if let Some(id) = id
            && let Some(entry) = sessions.get_mut(&id)
            && now.duration_since(entry.last_seen) <= self.ttl
        {
            entry.last_seen = now;
            return (id, false);
        }

        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_seen) <= self.ttl);
        while sessions.len() >= self.capacity {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| *id);
            match oldest {
                Some(oldest) => {
                    sessions.remove(&oldest);
                }
                None => break,
            }
        }
        let dropped = before - sessions.len();
        if dropped > 0 {
            tracing::debug!(dropped, "sessions evicted");
        }

        let id = Uuid::new_v4();
        sessions.insert(id, Entry::new(now));
        tracing::debug!(session = %id, live = sessions.len(), "session created");
        (id, true)
    }

    /// A snapshot of the session.
    pub async fn get(&self, id: SessionId) -> Session {
        self.sessions
            .read()
            .await
            .get(&id.0)
            .map(|entry| entry.session.clone())
            .unwrap_or_default()
    }

    /// Modify the session in place.
    pub async fn update<R>(&self, id: SessionId, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .entry(id.0)
            .or_insert_with(|| Entry::new(Instant::now()));
        f(&mut entry.session)
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns `true` when there are no sessions.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// Value of cookie `name` from the request headers.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
}

/// Middleware that attaches a [`SessionId`] and sets the cookie for new sessions.
pub async fn session_layer(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let presented =
        cookie_value(request.headers(), SESSION_COOKIE).and_then(|v| Uuid::parse_str(v).ok());
    let (id, created) = state.sessions.resolve(presented).await;
    request.extensions_mut().insert(SessionId(id));

    let mut response = next.run(request).await;
    if created {
        let cookie = format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax");
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}
