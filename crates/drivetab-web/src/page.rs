//! HTML for the single-page UI.

use std::fmt::Write;

use drivetab_core::text::escape_markup;
use drivetab_core::{DrivetabConfig, FolderEntry};
use drivetab_frame::Frame;
use serde::Deserialize;

use crate::session::{Flash, Level, SearchResults, Session};

/// Result tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    /// Combined table preview.
    #[default]
    Dataset,
    /// Statistics and plots.
    Analysis,
    /// Download links.
    Export,
}

impl Tab {
    const ALL: [Tab; 3] = [Tab::Dataset, Tab::Analysis, Tab::Export];

    fn slug(self) -> &'static str {
        match self {
            Tab::Dataset => "dataset",
            Tab::Analysis => "analysis",
            Tab::Export => "export",
        }
    }

    fn title(self) -> &'static str {
        match self {
            Tab::Dataset => "📄 Combined dataset",
            Tab::Analysis => "📊 Descriptive analysis",
            Tab::Export => "💾 Export",
        }
    }
}

/// Authentication status as shown in the sidebar.
#[derive(Debug, Clone, Copy)]
pub enum AuthView<'a> {
    /// Connected with the described credentials.
    Connected(&'a str),
    /// Consent needed.
    NeedsLogin,
    /// Cannot authenticate.
    Unavailable(&'a str),
}

/// Folder picker state.
#[derive(Debug, Clone, Copy)]
pub enum FolderView<'a> {
    /// Not connected yet.
    Hidden,
    /// Listing failed.
    Failed(&'a str),
    /// Listing was refused because the credentials are no longer valid.
    Refused(&'a str),
    /// Listed folders.
    Listed(&'a [FolderEntry]),
}

/// Everything a page render needs.
#[derive(Debug, Clone, Copy)]
pub struct PageView<'a> {
    /// Configuration (defaults, file names, preview size).
    pub config: &'a DrivetabConfig,
    /// Sidebar authentication block.
    pub auth: AuthView<'a>,
    /// Sidebar folder picker.
    pub folders: FolderView<'a>,
    /// The browser's session.
    pub session: &'a Session,
    /// Banner to show once.
    pub flash: Option<&'a Flash>,
    /// Selected tab.
    pub tab: Tab,
}

/// Render the full page.
pub fn render_page(view: &PageView<'_>) -> String {
    let mut sidebar = String::new();
    let mut main = String::new();

    main.push_str("<h1>📁 Search &amp; analyse from Google Drive</h1>\n");
    main.push_str("<p>Select a folder and search for Excel files automatically.</p>\n");
    if let Some(flash) = view.flash {
        banner(&mut main, flash.level, &escape_markup(&flash.message));
    }

    sidebar.push_str("<h2>🔐 Authentication</h2>\n");
    match view.auth {
        AuthView::Connected(label) => {
            banner(&mut sidebar, Level::Success, "✅ Connected to Google Drive");
            let _ = writeln!(sidebar, r#"<p class="muted">{}</p>"#, escape_markup(label));
        }
        AuthView::NeedsLogin => {
            login_button(&mut sidebar);
            return layout(&sidebar, &main);
        }
        AuthView::Unavailable(message) => {
            banner(&mut sidebar, Level::Error, &format!("❌ {}", escape_markup(message)));
            login_button(&mut sidebar);
            return layout(&sidebar, &main);
        }
    }

    let folders = match view.folders {
        FolderView::Hidden => return layout(&sidebar, &main),
        FolderView::Failed(message) => {
            banner(
                &mut main,
                Level::Error,
                &format!("❌ Could not list folders: {}", escape_markup(message)),
            );
            return layout(&sidebar, &main);
        }
        FolderView::Refused(message) => {
            banner(
                &mut main,
                Level::Error,
                &format!(
                    "❌ Google Drive refused the saved credentials: {}",
                    escape_markup(message)
                ),
            );
            renew_button(&mut sidebar);
            return layout(&sidebar, &main);
        }
        FolderView::Listed(folders) => folders,
    };
    if folders.is_empty() {
        banner(&mut main, Level::Warning, "⚠️ No folder found in your Google Drive.");
        return layout(&sidebar, &main);
    }

    search_form(&mut sidebar, view, folders);

    if let Some(results) = &view.session.results {
        found_files_sidebar(&mut sidebar, results);
        results_main(&mut main, view, results);
    }

    layout(&sidebar, &main)
}

fn login_button(out: &mut String) {
    out.push_str(
        r#"<form method="post" action="/auth/login"><button type="submit">🔑 Connect to Google Drive</button></form>"#,
    );
    out.push('\n');
}

fn renew_button(out: &mut String) {
    out.push_str(
        r#"<form method="post" action="/auth/login?renew=true"><button type="submit">🔑 Reconnect to Google Drive</button></form>"#,
    );
    out.push('\n');
}

fn search_form(out: &mut String, view: &PageView<'_>, folders: &[FolderEntry]) {
    let session = view.session;
    let search = &view.config.search;
    let keyword = session.keyword.as_deref().unwrap_or(&search.default_keyword);

    out.push_str("<form method=\"post\" action=\"/search\">\n");
    out.push_str("<label for=\"folder_id\">📁 Select the root folder</label>\n");
    out.push_str("<select id=\"folder_id\" name=\"folder_id\">\n");
    for folder in folders {
        let selected = if session.folder_id.as_deref() == Some(folder.id.as_str()) {
            " selected"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            r#"<option value="{}"{selected}>{}</option>"#,
            escape_markup(&folder.id),
            escape_markup(&folder.name)
        );
    }
    out.push_str("</select>\n");

    let _ = writeln!(
        out,
        r#"<label for="keyword">🔍 Keyword to search</label><input id="keyword" name="keyword" value="{}">"#,
        escape_markup(keyword)
    );

    out.push_str("<label for=\"extension\">📄 File extension</label>\n");
    out.push_str("<select id=\"extension\" name=\"extension\">\n");
    for ext in &search.extensions {
        let selected = if session.extension.as_deref() == Some(ext.as_str()) {
            " selected"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            r#"<option value="{0}"{selected}>{0}</option>"#,
            escape_markup(ext)
        );
    }
    out.push_str("</select>\n");
    out.push_str("<button type=\"submit\">🔎 Run search</button>\n</form>\n");
}

fn found_files_sidebar(out: &mut String, results: &SearchResults) {
    let files = &results.outcome.files;
    if files.is_empty() {
        banner(out, Level::Error, "❌ No file found.");
        return;
    }
    banner(out, Level::Info, &format!("📚 Files found: {}", files.len()));
    out.push_str("<p><strong>📜 File list:</strong></p>\n<ul>\n");
    for file in files {
        let _ = writeln!(
            out,
            r#"<li title="{}">{}</li>"#,
            escape_markup(&file.path),
            escape_markup(&file.name)
        );
    }
    out.push_str("</ul>\n");
}

fn results_main(out: &mut String, view: &PageView<'_>, results: &SearchResults) {
    let _ = writeln!(
        out,
        "<h2>🔍 Results for folder: <code>{}</code></h2>",
        escape_markup(&results.folder_name)
    );
    let outcome = &results.outcome;
    if outcome.files.is_empty() {
        banner(out, Level::Error, "❌ No file found with this keyword.");
        return;
    }
    banner(
        out,
        Level::Success,
        &format!("✅ {} files found!", outcome.files.len()),
    );
    for warning in &outcome.warnings {
        banner(
            out,
            Level::Warning,
            &format!(
                "⚠️ {}: {}",
                escape_markup(&warning.name),
                escape_markup(&warning.reason)
            ),
        );
    }

    out.push_str("<nav class=\"tabs\">\n");
    for tab in Tab::ALL {
        let class = if tab == view.tab { " class=\"active\"" } else { "" };
        let _ = writeln!(out, r#"<a href="/?tab={}"{class}>{}</a>"#, tab.slug(), tab.title());
    }
    out.push_str("</nav>\n<section>\n");

    let frame = &outcome.frame;
    match view.tab {
        Tab::Dataset => dataset_tab(out, frame, view.config.analysis.preview_rows),
        Tab::Analysis => analysis_tab(out, results),
        Tab::Export => export_tab(out, frame),
    }
    out.push_str("</section>\n");
}

fn dataset_tab(out: &mut String, frame: &Frame, preview_rows: usize) {
    if frame.is_empty() {
        banner(out, Level::Warning, "⚠️ No data to display.");
        return;
    }
    let (rows, cols) = frame.shape();
    out.push_str("<h3>🧾 Dataset dimensions</h3>\n");
    let _ = writeln!(
        out,
        "<p><strong>Rows:</strong> {rows} | <strong>Columns:</strong> {cols}</p>"
    );
    out.push_str("<h3>📋 Data preview</h3>\n");

    let head = frame.head(preview_rows);
    let mut table = Vec::with_capacity(head.rows().len() + 1);
    let mut header = vec![String::new()];
    header.extend(head.columns().iter().cloned());
    table.push(header);
    for (i, row) in head.rows().iter().enumerate() {
        let mut cells = vec![i.to_string()];
        cells.extend(row.iter().map(ToString::to_string));
        table.push(cells);
    }
    html_table(out, &table);
}

fn analysis_tab(out: &mut String, results: &SearchResults) {
    let frame = &results.outcome.frame;
    if frame.is_empty() {
        banner(out, Level::Warning, "⚠️ No data to analyse.");
        return;
    }
    out.push_str("<h3>📈 Descriptive statistics</h3>\n");
    html_table(out, &results.summary.to_table());

    let numeric = frame.numeric_columns();
    if numeric.is_empty() {
        banner(out, Level::Info, "ℹ️ No numeric variable to visualise.");
        return;
    }
    out.push_str("<h3>📊 Distribution of numeric variables</h3>\n");
    for index in numeric {
        let name = escape_markup(&frame.columns()[index]);
        if frame.numeric_values(index).is_empty() {
            banner(
                out,
                Level::Warning,
                &format!("⚠️ Column <code>{name}</code> has no values and is skipped."),
            );
            continue;
        }
        let _ = writeln!(
            out,
            r#"<figure><img src="/plots/{index}.svg" alt="Distribution of {name}" loading="lazy"></figure>"#
        );
    }
}

fn export_tab(out: &mut String, frame: &Frame) {
    if frame.is_empty() {
        banner(out, Level::Warning, "⚠️ No data to export.");
        return;
    }
    out.push_str("<h3>💾 Export the combined dataset</h3>\n");
    out.push_str(
        r#"<p><a class="button" href="/export/csv">📥 Download as CSV</a> <a class="button" href="/export/xlsx">📥 Download as Excel</a></p>"#,
    );
    out.push('\n');
}

/// A table whose first row is the header.
fn html_table(out: &mut String, rows: &[Vec<String>]) {
    out.push_str("<div class=\"scroll\"><table>\n");
    for (i, row) in rows.iter().enumerate() {
        let cell = if i == 0 { "th" } else { "td" };
        out.push_str("<tr>");
        for value in row {
            let _ = write!(out, "<{cell}>{}</{cell}>", escape_markup(value));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</table></div>\n");
}

/// `text` must already be escaped.
fn banner(out: &mut String, level: Level, text: &str) {
    let class = match level {
        Level::Success => "success",
        Level::Info => "info",
        Level::Warning => "warning",
        Level::Error => "error",
    };
    let _ = writeln!(out, r#"<div class="banner {class}">{text}</div>"#);
}

fn layout(sidebar: &str, main: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>drivetab</title>
<style>{STYLE}</style>
</head>
<body>
<aside>
{sidebar}</aside>
<main>
{main}</main>
</body>
</html>
"#
    )
}

const STYLE: &str = "body{margin:0;display:flex;font-family:sans-serif;color:#262730}\
aside{width:300px;min-height:100vh;padding:1rem;background:#f0f2f6;box-sizing:border-box}\
aside label{display:block;margin-top:.8rem;font-size:.9rem}\
aside select,aside input{width:100%;padding:.3rem;margin-top:.2rem}\
button,.button{margin-top:1rem;padding:.4rem .8rem;border:1px solid #ccc;border-radius:.4rem;background:white;cursor:pointer;text-decoration:none;color:inherit}\
main{flex:1;padding:1rem 2rem;min-width:0}\
.banner{padding:.6rem .8rem;border-radius:.4rem;margin:.5rem 0}\
.success{background:#dff5e3}.info{background:#e1ecfb}.warning{background:#fff4d6}.error{background:#fde2e2}\
.muted{color:#777;font-size:.8rem}\
.tabs{display:flex;gap:1rem;border-bottom:1px solid #ddd;margin-top:1rem}\
.tabs a{padding:.5rem 0;text-decoration:none;color:inherit}\
.tabs a.active{border-bottom:2px solid #ff4b4b;color:#ff4b4b}\
.scroll{overflow-x:auto}table{border-collapse:collapse;font-size:.85rem}\
th,td{border:1px solid #e6e6e6;padding:.25rem .5rem;text-align:right;white-space:nowrap}\
th{background:#fafafa}img{max-width:100%}";
