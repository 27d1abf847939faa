//! Handlers for the Drive-facing commands.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use drivetab_adapter_gdrive::{DriveApi, DriveClient, SearchOutcome, list_folders, run_search};
use drivetab_core::{DrivetabConfig, Error, FolderEntry, Result, SearchRequest};
use drivetab_frame::export::{to_csv, to_xlsx};
use drivetab_frame::{Frame, describe};
use drivetab_gcp_auth::{
    AuthState, LoopbackReceiver, TokenProvider, authenticate, complete_login, logout, new_state,
};
use drivetab_web::AppState;
use tokio::net::TcpListener;

use crate::cli::AuthAction;

/// How long `auth login` waits for the browser redirect.
const LOGIN_TIMEOUT: Duration = Duration::from_secs(300);

// ============================================================================
// serve
// ============================================================================

/// Run the web UI until Ctrl-C.
pub async fn cmd_serve(
    config: DrivetabConfig,
    host: Option<String>,
    port: Option<u16>,
    open: bool,
) -> Result<()> {
    let config = with_server_overrides(config, host, port)?;
    let open = open || config.server.open_browser;
    let url = config.server.base_url();

    let listener = TcpListener::bind(config.server.bind_addr()).await?;
    let state = Arc::new(AppState::from_config(config).await);
    println!("drivetab UI at {url}");
    if open {
        open_browser(&url);
    }
    drivetab_web::serve(state, listener).await
}

/// Apply `--host`/`--port` and validate the merged configuration.
pub fn with_server_overrides(
    mut config: DrivetabConfig,
    host: Option<String>,
    port: Option<u16>,
) -> Result<DrivetabConfig> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config.validate()?;
    Ok(config)
}

fn open_browser(url: &str) {
    if let Err(e) = webbrowser::open(url) {
        tracing::warn!(error = %e, %url, "could not open a browser");
    }
}

// ============================================================================
// auth
// ============================================================================

/// Handle an `auth` subcommand.
pub async fn cmd_auth(
    config: &DrivetabConfig,
    action: AuthAction,
    out: &mut impl Write,
) -> Result<()> {
    match action {
        AuthAction::Login { no_browser } => login(config, !no_browser, out).await,
        AuthAction::Status => match authenticate(&config.auth, reqwest_client()).await {
            Ok(AuthState::Ready(provider)) => {
                writeln!(out, "Connected with {}", provider.describe())?;
                Ok(())
            }
            Ok(AuthState::NeedsLogin(_)) => {
                writeln!(out, "Not logged in. Run `drivetab auth login`.")?;
                Ok(())
            }
            Err(e) => Err(e),
        },
        AuthAction::Logout => {
            let path = &config.auth.credentials_path;
            if logout(&config.auth)? {
                writeln!(out, "Removed cached credentials at {path}")?;
            } else {
                writeln!(out, "No cached credentials at {path}")?;
            }
            Ok(())
        }
    }
}

async fn login(config: &DrivetabConfig, browser: bool, out: &mut impl Write) -> Result<()> {
    let http = reqwest_client();
    let flow = match authenticate(&config.auth, http.clone()).await? {
        AuthState::Ready(provider) => {
            writeln!(out, "Already connected with {}", provider.describe())?;
            return Ok(());
        }
        AuthState::NeedsLogin(flow) => flow,
    };

    let receiver = LoopbackReceiver::bind(config.auth.redirect_port).await?;
    let redirect_uri = receiver.redirect_uri();
    let state = new_state();
    let url = flow.authorization_url(&redirect_uri, &state)?;

    writeln!(out, "Open this URL to authorize drivetab:\n\n  {url}\n")?;
    out.flush()?;
    if browser {
        open_browser(&url);
    }

    let code = receiver.wait_for_code(&state, LOGIN_TIMEOUT).await?;
    let credentials = flow.exchange_code(&code, &redirect_uri).await?;
    complete_login(&config.auth, credentials, http)?;
    writeln!(out, "Logged in; credentials saved to {}", config.auth.credentials_path)?;
    Ok(())
}

fn reqwest_client() -> reqwest::Client {
    reqwest::Client::new()
}

/// Drive access for commands that need credentials.
async fn drive_client(config: &DrivetabConfig) -> Result<DriveClient> {
    let state = authenticate(&config.auth, reqwest_client()).await?;
    let provider: Arc<dyn TokenProvider> = match state {
        AuthState::Ready(provider) => provider,
        AuthState::NeedsLogin(_) => {
            return Err(Error::auth("not logged in; run `drivetab auth login`"));
        }
    };
    Ok(DriveClient::new(provider, &config.drive))
}

// ============================================================================
// folders
// ============================================================================

/// Print the folders offered for searching.
pub async fn cmd_folders(config: &DrivetabConfig, out: &mut impl Write) -> Result<()> {
    let client = drive_client(config).await?;
    let folders = list_folders(&client, config.drive.root_only).await?;
    if folders.is_empty() {
        writeln!(out, "No folder found in your Google Drive.")?;
        return Ok(());
    }
    let mut rows = vec![vec!["ID".to_string(), "NAME".to_string()]];
    rows.extend(folders.into_iter().map(|f| vec![f.id, f.name]));
    write!(out, "{}", render_table(&rows))?;
    Ok(())
}

// ============================================================================
// search
// ============================================================================

/// Arguments of `drivetab search`.
#[derive(Debug, Clone)]
pub struct SearchArgs {
    /// Folder ID or exact folder name.
    pub folder: String,
    /// Keyword; defaults to `search.default_keyword`.
    pub keyword: Option<String>,
    /// Extension; defaults to the first of `search.extensions`.
    pub extension: Option<String>,
    /// Export target.
    pub out: Option<String>,
}

/// Output format chosen from the `--out` file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values.
    Csv,
    /// Excel workbook.
    Xlsx,
}

impl ExportFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("csv") => Ok(ExportFormat::Csv),
            Some("xlsx") => Ok(ExportFormat::Xlsx),
            _ => Err(Error::validation_field(
                "out",
                format!("'{}' must end with .csv or .xlsx", path.display()),
            )),
        }
    }

    /// Encode `frame` in this format.
    pub fn encode(self, frame: &Frame) -> Result<Vec<u8>> {
        match self {
            ExportFormat::Csv => to_csv(frame),
            ExportFormat::Xlsx => to_xlsx(frame),
        }
    }
}

/// Search, print a report and optionally export the combined dataset.
pub async fn cmd_search(
    config: &DrivetabConfig,
    args: SearchArgs,
    out: &mut impl Write,
) -> Result<()> {
    let export = args
        .out
        .as_deref()
        .map(|p| ExportFormat::from_path(Path::new(p)).map(|f| (p, f)))
        .transpose()?;

    let client = drive_client(config).await?;
    let folder = resolve_folder(&client, config.drive.root_only, &args.folder).await?;
    let keyword = args.keyword.unwrap_or_else(|| config.search.default_keyword.clone());
    let extension = match args.extension {
        Some(ext) => ext,
        None => config
            .search
            .extensions
            .first()
            .cloned()
            .ok_or_else(|| Error::validation_field("extension", "no extension configured"))?,
    };

    let request = SearchRequest::new(&folder.id, keyword, extension);
    let outcome = run_search(
        &client,
        &request,
        config.drive.max_depth,
        config.drive.download_concurrency,
    )
    .await?;

    write_report(out, &folder.name, &outcome, config.analysis.preview_rows)?;

    if let Some((path, format)) = export {
        if outcome.frame.is_empty() {
            writeln!(out, "\nNo data to export.")?;
        } else {
            let bytes = format.encode(&outcome.frame)?;
            std::fs::write(path, &bytes).map_err(|e| Error::io_with_path(e, path))?;
            writeln!(out, "\nSaved combined dataset to {path}")?;
        }
    }
    Ok(())
}

/// Find a folder by ID or exact name; unknown values are used as an ID.
pub async fn resolve_folder<A>(api: &A, root_only: bool, folder: &str) -> Result<FolderEntry>
where
    A: DriveApi + ?Sized,
{
    let folders = list_folders(api, root_only).await?;
    let found = folders
        .iter()
        .find(|f| f.id == folder)
        .or_else(|| folders.iter().find(|f| f.name == folder))
        .cloned();
    Ok(found.unwrap_or_else(|| FolderEntry {
        id: folder.to_string(),
        name: folder.to_string(),
    }))
}

/// Print the files found, load warnings, a preview and the statistics.
pub fn write_report(
    out: &mut impl Write,
    folder_name: &str,
    outcome: &SearchOutcome,
    preview_rows: usize,
) -> Result<()> {
    writeln!(out, "Results for folder: {folder_name}")?;
    if outcome.is_empty() {
        writeln!(out, "No file found with this keyword.")?;
        return Ok(());
    }
    writeln!(out, "{} files found!", outcome.files.len())?;
    for file in &outcome.files {
        writeln!(out, "  {}", file.path)?;
    }
    for warning in &outcome.warnings {
        writeln!(out, "warning: {warning}")?;
    }

    let frame = &outcome.frame;
    if frame.is_empty() {
        writeln!(out, "\nNo data to display.")?;
        return Ok(());
    }
    let (rows, cols) = frame.shape();
    writeln!(out, "\nRows: {rows} | Columns: {cols}\n")?;

    let head = frame.head(preview_rows);
    let mut table = vec![head.columns().to_vec()];
    table.extend(
        head.rows()
            .iter()
            .map(|row| row.iter().map(ToString::to_string).collect()),
    );
    write!(out, "{}", render_table(&table))?;

    writeln!(out, "\nDescriptive statistics\n")?;
    write!(out, "{}", render_table(&describe(frame).to_table()))?;
    Ok(())
}

/// Align rows into columns: first column left-aligned, the rest right-aligned.
pub fn render_table(rows: &[Vec<String>]) -> String {
    let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0; cols];
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut text = String::new();
    for row in rows {
        let mut line = String::new();
        for (i, width) in widths.iter().enumerate() {
            let cell = row.get(i).map(String::as_str).unwrap_or("");
            if i > 0 {
                line.push_str("  ");
            }
            let pad = width - cell.chars().count();
            if i == 0 {
                line.push_str(cell);
                line.push_str(&" ".repeat(pad));
            } else {
                line.push_str(&" ".repeat(pad));
                line.push_str(cell);
            }
        }
        text.push_str(line.trim_end());
        text.push('\n');
    }
    text
}
