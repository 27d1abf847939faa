//! One-shot loopback listener that receives the OAuth redirect.
//!
//! Used by the command-line login: the consent URL redirects to
//! `http://127.0.0.1:<port>/`, the listener answers the browser with a short
//! page, hands the query parameters back and shuts down.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use drivetab_core::{Error, Result};
use tokio::net::TcpListener;
use tokio::sync::{Mutex, oneshot};

use crate::flow::CallbackParams;

type Slot = Arc<Mutex<Option<oneshot::Sender<CallbackParams>>>>;

/// A bound loopback listener waiting for one redirect.
pub struct LoopbackReceiver {
    listener: TcpListener,
    addr: SocketAddr,
}

impl LoopbackReceiver {
    /// Bind on `127.0.0.1:port`; port 0 picks a free port.
    pub async fn bind(port: u16) -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", port)).await?;
        let addr = listener.local_addr()?;
        Ok(Self { listener, addr })
    }

    /// Redirect URI to register in the consent request.
    pub fn redirect_uri(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Serve until the redirect arrives (or `timeout` passes) and return its code.
    pub async fn wait_for_code(self, expected_state: &str, timeout: Duration) -> Result<String> {
        let (tx, rx) = oneshot::channel();
        let slot: Slot = Arc::new(Mutex::new(Some(tx)));
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let app = Router::new()
            .route("/", get(receive))
            .with_state(slot);

        let listener = self.listener;
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        let outcome = tokio::time::timeout(timeout, rx).await;
        let _ = shutdown_tx.send(());
        if let Err(e) = server.await {
            tracing::warn!(error = %e, "loopback server task failed");
        }

        match outcome {
            Ok(Ok(params)) => params.into_code(expected_state),
            Ok(Err(_)) => Err(Error::auth("loopback listener closed before redirect")),
            Err(_) => Err(Error::auth(format!(
                "no authorization response within {}s",
                timeout.as_secs()
            ))),
        }
    }
}

async fn receive(
    State(slot): State<Slot>,
    Query(params): Query<CallbackParams>,
) -> Html<&'static str> {
    // Browsers may request the page again (reload, favicon requests); only the
    // first request carrying a code or an error completes the flow.
    if params.code.is_none() && params.error.is_none() {
        return Html(WAITING_PAGE);
    }
    let denied = params.error.is_some();
    if let Some(tx) = slot.lock().await.take() {
        let _ = tx.send(params);
    }
    if denied {
        Html(DENIED_PAGE)
    } else {
        Html(DONE_PAGE)
    }
}

const DONE_PAGE: &str = "<!doctype html><html><body><h3>drivetab: authentication complete.</h3>\
<p>You can close this window.</p></body></html>";

const DENIED_PAGE: &str = "<!doctype html><html><body><h3>drivetab: authorization was denied.</h3>\
<p>You can close this window.</p></body></html>";

const WAITING_PAGE: &str = "<!doctype html><html><body><p>drivetab: waiting for authorization.</p>\
</body></html>";
