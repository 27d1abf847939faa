//! Browser UI for drivetab.
//!
//! A small server-rendered application: the sidebar handles Google login and
//! the search form, the main area shows the combined dataset, its statistics
//! and distribution plots, and offers CSV/XLSX downloads. Each browser gets a
//! cookie-keyed [`Session`] holding its last search.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod handlers;
pub mod page;
pub mod session;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use drivetab_core::Result;
use tokio::net::TcpListener;

pub use error::{WebError, WebResult};
pub use handlers::CALLBACK_PATH;
pub use session::{Session, SessionStore};
pub use state::{AppState, Connection};

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/auth/login", post(handlers::login))
        .route(CALLBACK_PATH, get(handlers::oauth_callback))
        .route("/search", post(handlers::search))
        .route("/plots/{name}", get(handlers::plot))
        .route("/export/{format}", get(handlers::export))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            session::session_layer,
        ))
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// Serve the UI on `listener` until Ctrl-C.
pub async fn serve(state: Arc<AppState>, listener: TcpListener) -> Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "drivetab UI listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
