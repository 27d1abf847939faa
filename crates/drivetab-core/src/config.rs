//! Configuration for drivetab.
//!
//! Configuration is read from a TOML file and then overlaid with
//! `DRIVETAB_<SECTION>_<KEY>` environment variables. The file is located by
//! [`ConfigManager::resolve_config_path`]: an explicit path wins, then the
//! `DRIVETAB_CONFIG` variable, then `<config dir>/drivetab/config.toml`.
//! A missing file is not an error; defaults are used instead.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::types::validate_extension;
use crate::{Error, Result};

/// Google Drive read-only scope.
pub const DRIVE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";

// ============================================================================
// ConfigManager
// ============================================================================

/// Loading, locating and flattening of a TOML-backed configuration type.
pub trait ConfigManager: Default + Serialize + DeserializeOwned {
    /// Short project name used for directory and variable names.
    fn project_name() -> &'static str;

    /// Environment variable prefix, e.g. `DRIVETAB`.
    fn env_prefix() -> String {
        Self::project_name().to_uppercase().replace(['-', ' '], "_")
    }

    /// Dotted keys whose default is absent, so they cannot be discovered
    /// from the serialized defaults but may still be set from the environment.
    fn optional_keys() -> &'static [&'static str] {
        &[]
    }

    /// Default config file location for this platform.
    fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(Self::project_name()).join("config.toml"))
    }

    /// Resolve the config file path from an explicit path, the
    /// `<PREFIX>_CONFIG` variable, or the platform default.
    fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }
        if let Ok(path) = std::env::var(format!("{}_CONFIG", Self::env_prefix())) {
            if !path.is_empty() {
                return Some(PathBuf::from(path));
            }
        }
        Self::default_config_path()
    }

    /// Load the configuration, falling back to defaults when the file is absent.
    fn load(explicit: Option<&str>) -> Result<Self> {
        let mut value = match Self::resolve_config_path(explicit) {
            Some(path) if path.exists() => read_toml(&path)?,
            Some(path) => {
                tracing::debug!(path = %path.display(), "config file not found, using defaults");
                toml::Value::try_from(Self::default()).map_err(|e| Error::config(e.to_string()))?
            }
            None => {
                toml::Value::try_from(Self::default()).map_err(|e| Error::config(e.to_string()))?
            }
        };
        apply_env_overrides::<Self>(&mut value, |key| std::env::var(key).ok())?;
        value
            .try_into()
            .map_err(|e: toml::de::Error| Error::config(e.to_string()))
    }

    /// Serialize the configuration as pretty TOML.
    fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Flatten the configuration into `(PREFIX_SECTION_KEY, value)` pairs.
    fn to_env_vars(&self) -> Result<Vec<(String, String)>> {
        let value = toml::Value::try_from(self).map_err(|e| Error::config(e.to_string()))?;
        let mut vars = Vec::new();
        flatten_value(&value, "", &mut vars);
        Ok(vars
            .into_iter()
            .map(|(key, val)| (env_var_name(&Self::env_prefix(), &key), val))
            .collect())
    }
}

fn read_toml(path: &Path) -> Result<toml::Value> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
    toml::from_str(&content)
        .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))
}

/// Build the variable name for a dotted key: `server.port` → `DRIVETAB_SERVER_PORT`.
pub fn env_var_name(prefix: &str, dotted_key: &str) -> String {
    format!(
        "{prefix}_{}",
        dotted_key.to_uppercase().replace(['.', '-'], "_")
    )
}

/// Overlay environment values onto `value` for every key the defaults know.
///
/// Keys are taken from `C::default()` so that underscores inside key names
/// never need to be guessed back from the variable name.
pub fn apply_env_overrides<C: ConfigManager>(
    value: &mut toml::Value,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    let defaults = toml::Value::try_from(C::default()).map_err(|e| Error::config(e.to_string()))?;
    let mut keys = Vec::new();
    collect_keys(&defaults, "", &mut keys);
    keys.extend(C::optional_keys().iter().map(|k| k.to_string()));
    for key in keys {
        let var = env_var_name(&C::env_prefix(), &key);
        if let Some(raw) = lookup(&var) {
            let template = get_nested_value(&defaults, &key);
            tracing::debug!(%var, "applying config override from environment");
            set_nested_value(value, &key, parse_env_value(&raw, template))?;
        }
    }
    Ok(())
}

fn collect_keys(value: &toml::Value, prefix: &str, out: &mut Vec<String>) {
    if let toml::Value::Table(table) = value {
        for (k, v) in table {
            let key = join_key(prefix, k);
            if v.is_table() {
                collect_keys(v, &key, out);
            } else {
                out.push(key);
            }
        }
    }
}

fn flatten_value(value: &toml::Value, prefix: &str, out: &mut Vec<(String, String)>) {
    match value {
        toml::Value::Table(table) => {
            for (k, v) in table {
                flatten_value(v, &join_key(prefix, k), out);
            }
        }
        toml::Value::Array(items) => {
            let joined = items
                .iter()
                .map(format_toml_value)
                .collect::<Vec<_>>()
                .join(",");
            out.push((prefix.to_string(), joined));
        }
        other => out.push((prefix.to_string(), format_toml_value(other))),
    }
}

fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Parse an environment value, using the default's type as a hint so that
/// list-valued keys accept comma-separated input.
fn parse_env_value(raw: &str, template: Option<&toml::Value>) -> toml::Value {
    match template {
        Some(toml::Value::Array(_)) => toml::Value::Array(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| toml::Value::String(s.to_string()))
                .collect(),
        ),
        Some(toml::Value::String(_)) => toml::Value::String(raw.to_string()),
        _ => parse_value(raw),
    }
}

// ============================================================================
// TOML dotted-key helpers
// ============================================================================

/// Navigate a dotted key path in a TOML value tree.
pub fn get_nested_value<'a>(value: &'a toml::Value, key: &str) -> Option<&'a toml::Value> {
    let mut current = value;
    for part in key.split('.') {
        current = current.as_table()?.get(part)?;
    }
    Some(current)
}

/// Set a value at a dotted key path, creating intermediate tables as needed.
pub fn set_nested_value(root: &mut toml::Value, key: &str, value: toml::Value) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    let Some((last, parents)) = parts.split_last() else {
        return Err(Error::config("Empty key path"));
    };

    let mut current = root;
    for part in parents {
        let table = current
            .as_table_mut()
            .ok_or_else(|| Error::config("Cannot navigate into a non-table value"))?;
        current = table
            .entry(part.to_string())
            .or_insert(toml::Value::Table(toml::map::Map::new()));
    }

    let table = current
        .as_table_mut()
        .ok_or_else(|| Error::config("Cannot set key on a non-table value"))?;
    table.insert(last.to_string(), value);
    Ok(())
}

/// Parse a string value into a TOML value, auto-detecting the type.
///
/// Priority: bool → integer → float → string.
pub fn parse_value(s: &str) -> toml::Value {
    if s == "true" {
        return toml::Value::Boolean(true);
    }
    if s == "false" {
        return toml::Value::Boolean(false);
    }
    if let Ok(i) = s.parse::<i64>() {
        return toml::Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return toml::Value::Float(f);
    }
    toml::Value::String(s.to_string())
}

/// Format a TOML value for display on stdout.
pub fn format_toml_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Datetime(dt) => dt.to_string(),
        toml::Value::Array(_) | toml::Value::Table(_) => {
            toml::to_string_pretty(value).unwrap_or_else(|_| format!("{value:?}"))
        }
    }
}

// ============================================================================
// DrivetabConfig
// ============================================================================

/// Top-level drivetab configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DrivetabConfig {
    /// OAuth2 credentials.
    pub auth: AuthSettings,
    /// Drive API access.
    pub drive: DriveSettings,
    /// Search form defaults.
    pub search: SearchSettings,
    /// Web UI server.
    pub server: ServerSettings,
    /// Statistics and plots.
    pub analysis: AnalysisSettings,
    /// Download file names.
    pub export: ExportSettings,
}

/// OAuth2 credential locations and scopes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// OAuth client configuration downloaded from the Cloud console.
    pub client_secrets_path: String,
    /// Cached user credentials, written after a successful login.
    pub credentials_path: String,
    /// Service-account key; when set, user login is bypassed.
    pub service_account_path: Option<String>,
    /// Requested OAuth scopes.
    pub scopes: Vec<String>,
    /// Loopback port for the CLI login flow; 0 picks a free port.
    pub redirect_port: u16,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            client_secrets_path: "client_secrets.json".to_string(),
            credentials_path: "credentials.json".to_string(),
            service_account_path: None,
            scopes: vec![DRIVE_READONLY_SCOPE.to_string()],
            redirect_port: 0,
        }
    }
}

/// Drive API endpoints and traversal limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveSettings {
    /// Drive v3 API base URL.
    pub api_base: String,
    /// Items requested per listing page.
    pub page_size: u32,
    /// Maximum folder depth below the searched folder; unbounded when absent.
    pub max_depth: Option<usize>,
    /// Offer only folders directly under "My Drive" in the picker.
    pub root_only: bool,
    /// Parallel downloads.
    pub download_concurrency: usize,
    /// Retries for rate-limited or failed API calls.
    pub max_retries: usize,
}

impl Default for DriveSettings {
    fn default() -> Self {
        Self {
            api_base: "https://www.googleapis.com/drive/v3".to_string(),
            page_size: 1000,
            max_depth: None,
            root_only: false,
            download_concurrency: 4,
            max_retries: 3,
        }
    }
}

/// Defaults for the search form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Keyword pre-filled in the search box.
    pub default_keyword: String,
    /// Extensions offered in the extension picker.
    pub extensions: Vec<String>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_keyword: "tx_curr".to_string(),
            extensions: vec![".xlsx".to_string()],
        }
    }
}

/// Web UI bind address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Open the UI in a browser on startup.
    pub open_browser: bool,
    /// Seconds a browser session may sit idle before it is dropped.
    pub session_ttl_secs: u64,
    /// Most sessions kept at once; the least recently used go first.
    pub max_sessions: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            open_browser: false,
            session_ttl_secs: 8 * 60 * 60,
            max_sessions: 1000,
        }
    }
}

impl ServerSettings {
    /// `host:port` bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Idle lifetime of a browser session.
    pub fn session_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.session_ttl_secs)
    }

    /// Base URL the browser uses to reach the UI.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.bind_addr())
    }
}

/// Preview and plot sizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Rows shown in the dataset preview.
    pub preview_rows: usize,
    /// Plot width in pixels.
    pub plot_width: u32,
    /// Plot height in pixels.
    pub plot_height: u32,
    /// Overlay a kernel density estimate on histograms.
    pub kde: bool,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            preview_rows: 10,
            plot_width: 1200,
            plot_height: 400,
            kde: true,
        }
    }
}

/// Names of exported files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// CSV download name.
    pub csv_file_name: String,
    /// Excel download name.
    pub xlsx_file_name: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            csv_file_name: "dataset_combine.csv".to_string(),
            xlsx_file_name: "dataset_combine.xlsx".to_string(),
        }
    }
}

impl ConfigManager for DrivetabConfig {
    fn project_name() -> &'static str {
        "drivetab"
    }

    fn optional_keys() -> &'static [&'static str] {
        &["auth.service_account_path", "drive.max_depth"]
    }
}

impl DrivetabConfig {
    /// Reject settings that would make the tool misbehave at runtime.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::validation_field("server.port", "must not be 0"));
        }
        if self.server.max_sessions == 0 {
            return Err(Error::validation_field("server.max_sessions", "must be positive"));
        }
        if self.drive.page_size == 0 {
            return Err(Error::validation_field("drive.page_size", "must be positive"));
        }
        if self.drive.download_concurrency == 0 {
            return Err(Error::validation_field(
                "drive.download_concurrency",
                "must be positive",
            ));
        }
        if self.search.extensions.is_empty() {
            return Err(Error::validation_field(
                "search.extensions",
                "at least one extension is required",
            ));
        }
        for ext in &self.search.extensions {
            validate_extension(ext)?;
        }
        if self.auth.scopes.is_empty() {
            return Err(Error::validation_field("auth.scopes", "must not be empty"));
        }
        Ok(())
    }
}
