//! Route handlers.

use std::sync::Arc;

use axum::Extension;
use axum::extract::{Form, Path, Query, State};
use axum::http::{HeaderMap, HeaderName, header};
use axum::response::{Html, IntoResponse, Redirect, Response};
use drivetab_adapter_gdrive::run_search;
use drivetab_core::{Error, Result, SearchRequest};
use drivetab_frame::export::{CSV_MIME, XLSX_MIME, to_csv, to_xlsx};
use drivetab_frame::plot::{PlotOptions, render_distribution};
use drivetab_frame::describe;
use drivetab_gcp_auth::{CallbackParams, TokenProvider, complete_login, logout, new_state};
use serde::Deserialize;

use crate::error::WebResult;
use crate::page::{AuthView, FolderView, PageView, Tab, render_page};
use crate::session::{Flash, SearchResults, SessionId};
use crate::state::{AppState, Connection};

/// Path Google redirects to after consent.
pub const CALLBACK_PATH: &str = "/oauth2/callback";

// ============================================================================
// Page
// ============================================================================

/// Query string of the main page.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// Selected tab.
    #[serde(default)]
    pub tab: Tab,
}

/// `GET /`
pub async fn index(
    State(state): State<Arc<AppState>>,
    Extension(id): Extension<SessionId>,
    Query(query): Query<PageQuery>,
) -> Html<String> {
    let connection = state.connection().await;
    let flash = state.sessions.update(id, |s| s.flash.take()).await;
    let session = state.sessions.get(id).await;

    let listing = state.folders().await;
    let listing_error = match &listing {
        Some(Err(e)) => {
            tracing::warn!(error = %e, "folder listing failed");
            Some((e.to_string(), e.is_auth_failure()))
        }
        _ => None,
    };

    let auth = match &connection {
        Connection::Connected { label, .. } => AuthView::Connected(label),
        Connection::NeedsLogin(_) => AuthView::NeedsLogin,
        Connection::Unavailable(message) => AuthView::Unavailable(message),
    };
    let folders = match (&listing, &listing_error) {
        (Some(Ok(folders)), _) => FolderView::Listed(folders.as_slice()),
        (_, Some((message, true))) => FolderView::Refused(message),
        (_, Some((message, false))) => FolderView::Failed(message),
        _ => FolderView::Hidden,
    };

    Html(render_page(&PageView {
        config: &state.config,
        auth,
        folders,
        session: &session,
        flash: flash.as_ref(),
        tab: query.tab,
    }))
}

/// `GET /health`
pub async fn health() -> &'static str {
    "ok"
}

// ============================================================================
// Login
// ============================================================================

/// Query string of `POST /auth/login`.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    /// Discard cached user credentials before deciding.
    #[serde(default)]
    pub renew: bool,
}

/// `POST /auth/login`: reuse cached credentials or start the consent flow.
///
/// With `?renew=true` the cached user credentials are deleted first, so
/// credentials Drive has stopped accepting lead to a fresh consent.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Extension(id): Extension<SessionId>,
    Query(query): Query<LoginQuery>,
    headers: HeaderMap,
) -> WebResult<Redirect> {
    if query.renew && logout(&state.config.auth)? {
        tracing::info!("cached credentials discarded for renewal");
    }
    let Connection::NeedsLogin(flow) = state.reconnect().await else {
        return Ok(Redirect::to("/"));
    };

    let redirect_uri = callback_uri(&state, &headers);
    let login_state = new_state();
    let url = flow.authorization_url(&redirect_uri, &login_state)?;
    state
        .sessions
        .update(id, |s| {
            s.login_state = Some(login_state);
            s.login_redirect = Some(redirect_uri);
        })
        .await;
    tracing::info!("redirecting to Google consent");
    Ok(Redirect::to(&url))
}

/// `GET /oauth2/callback`: finish the consent flow.
pub async fn oauth_callback(
    State(state): State<Arc<AppState>>,
    Extension(id): Extension<SessionId>,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    let pending = state
        .sessions
        .update(id, |s| (s.login_state.take(), s.login_redirect.take()))
        .await;

    let outcome = match pending {
        (Some(expected), Some(redirect_uri)) => {
            finish_login(&state, params, &expected, &redirect_uri).await
        }
        _ => Err(Error::auth("no login in progress for this session")),
    };

    match outcome {
        Ok(provider) => {
            let connection = state.connected(provider);
            state.set_connection(connection).await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "login failed");
            state
                .sessions
                .update(id, |s| s.flash = Some(Flash::error(format!("❌ {e}"))))
                .await;
        }
    }
    Redirect::to("/")
}

async fn finish_login(
    state: &AppState,
    params: CallbackParams,
    expected_state: &str,
    redirect_uri: &str,
) -> Result<Arc<dyn TokenProvider>> {
    let code = params.into_code(expected_state)?;
    let Connection::NeedsLogin(flow) = state.connection().await else {
        return Err(Error::auth("no login in progress"));
    };
    let credentials = flow.exchange_code(&code, redirect_uri).await?;
    complete_login(&state.config.auth, credentials, state.http.clone())
}

/// Callback URL as the browser sees this server.
fn callback_uri(state: &AppState, headers: &HeaderMap) -> String {
    let base = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(|host| format!("http://{host}"))
        .unwrap_or_else(|| state.config.server.base_url());
    format!("{base}{CALLBACK_PATH}")
}

// ============================================================================
// Search
// ============================================================================

/// Fields of the search form.
#[derive(Debug, Deserialize)]
pub struct SearchForm {
    /// Folder to search under.
    pub folder_id: String,
    /// Keyword.
    #[serde(default)]
    pub keyword: String,
    /// Extension.
    pub extension: String,
}

/// `POST /search`: run the search and keep the results in the session.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Extension(id): Extension<SessionId>,
    Form(form): Form<SearchForm>,
) -> Redirect {
    let Connection::Connected { api, .. } = state.connection().await else {
        state
            .sessions
            .update(id, |s| s.flash = Some(Flash::error("❌ Not connected to Google Drive.")))
            .await;
        return Redirect::to("/");
    };

    let folder_name = match state.folders().await {
        Some(Ok(folders)) => folders
            .iter()
            .find(|f| f.id == form.folder_id)
            .map(|f| f.name.clone()),
        _ => None,
    }
    .unwrap_or_else(|| form.folder_id.clone());

    let request = SearchRequest::new(&form.folder_id, &form.keyword, &form.extension);
    let drive = &state.config.drive;
    let result = run_search(
        api.as_ref(),
        &request,
        drive.max_depth,
        drive.download_concurrency,
    )
    .await;

    let (results, flash) = match result {
        Ok(outcome) => {
            tracing::info!(
                folder = %folder_name,
                files = outcome.files.len(),
                rows = outcome.frame.shape().0,
                warnings = outcome.warnings.len(),
                "search finished"
            );
            let summary = describe(&outcome.frame);
            let results = SearchResults {
                folder_name,
                outcome,
                summary,
            };
            (Some(Arc::new(results)), None)
        }
        Err(e) => {
            tracing::warn!(error = %e, "search failed");
            (None, Some(Flash::error(format!("❌ Search failed: {e}"))))
        }
    };

    state
        .sessions
        .update(id, |s| {
            s.folder_id = Some(form.folder_id);
            s.keyword = Some(form.keyword);
            s.extension = Some(form.extension);
            s.results = results;
            s.flash = flash;
        })
        .await;
    Redirect::to("/?tab=dataset")
}

async fn current_results(state: &AppState, id: SessionId) -> Result<Arc<SearchResults>> {
    state
        .sessions
        .get(id)
        .await
        .results
        .ok_or_else(|| Error::not_found("no search results in this session"))
}

// ============================================================================
// Plots and downloads
// ============================================================================

/// `GET /plots/{index}.svg`: distribution figure of a numeric column.
pub async fn plot(
    State(state): State<Arc<AppState>>,
    Extension(id): Extension<SessionId>,
    Path(name): Path<String>,
) -> WebResult<Response> {
    let results = current_results(&state, id).await?;
    let frame = &results.outcome.frame;
    let index = name
        .strip_suffix(".svg")
        .and_then(|i| i.parse::<usize>().ok())
        .filter(|&i| i < frame.columns().len() && frame.column_kind(i).is_numeric())
        .ok_or_else(|| Error::not_found(format!("plot {name}")))?;

    let options = PlotOptions::from(&state.config.analysis);
    let svg = render_distribution(&frame.columns()[index], &frame.numeric_values(index), &options)
        .ok_or_else(|| Error::not_found(format!("plot {name}")))?;
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response())
}

/// `GET /export/{format}`: the combined dataset as `csv` or `xlsx`.
pub async fn export(
    State(state): State<Arc<AppState>>,
    Extension(id): Extension<SessionId>,
    Path(format): Path<String>,
) -> WebResult<Response> {
    let results = current_results(&state, id).await?;
    let frame = &results.outcome.frame;
    if frame.is_empty() {
        return Err(Error::not_found("no data to export").into());
    }

    let names = &state.config.export;
    let (bytes, mime, file_name) = match format.as_str() {
        "csv" => (to_csv(frame)?, CSV_MIME, &names.csv_file_name),
        "xlsx" => (to_xlsx(frame)?, XLSX_MIME, &names.xlsx_file_name),
        other => return Err(Error::not_found(format!("export format '{other}'")).into()),
    };
    tracing::debug!(format = %format, bytes = bytes.len(), "export");

    let disposition = format!("attachment; filename=\"{}\"", file_name.replace('"', ""));
    let headers: [(HeaderName, String); 2] = [
        (header::CONTENT_TYPE, mime.to_string()),
        (header::CONTENT_DISPOSITION, disposition),
    ];
    Ok((headers, bytes).into_response())
}
