//! Downloading and decoding found files, and the combined search run.

use drivetab_core::{FoundFile, Result, SearchRequest};
use drivetab_frame::{Frame, concat, read_table};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use crate::api::DriveApi;
use crate::search::find_files;

/// A file that could not be loaded, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadWarning {
    /// File name.
    pub name: String,
    /// Human-readable reason.
    pub reason: String,
}

impl std::fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.reason)
    }
}

/// A file decoded into a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedFile {
    /// The file.
    pub file: FoundFile,
    /// Its first worksheet.
    pub frame: Frame,
}

/// Result of [`load_files`]: successes and warnings, each in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// Files that decoded.
    pub loaded: Vec<LoadedFile>,
    /// Files that did not.
    pub warnings: Vec<LoadWarning>,
}

impl LoadReport {
    /// Concatenate the loaded frames in order.
    pub fn combined(&self) -> Frame {
        concat(self.loaded.iter().map(|l| l.frame.clone()))
    }
}

/// Download and decode `files` with at most `concurrency` transfers in flight.
///
/// A file without a download link, a failed download or an undecodable file
/// becomes a [`LoadWarning`]; the remaining files still load.
pub async fn load_files<A>(api: &A, files: &[FoundFile], concurrency: usize) -> LoadReport
where
    A: DriveApi + ?Sized,
{
    // Collected first: a `map` closure borrowing `api` is not `Send` for
    // every lifetime, which axum handlers require.
    let pending: Vec<_> = files.iter().map(|file| load_one(api, file)).collect();
    let outcomes: Vec<std::result::Result<LoadedFile, LoadWarning>> = stream::iter(pending)
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut report = LoadReport::default();
    for outcome in outcomes {
        match outcome {
            Ok(loaded) => report.loaded.push(loaded),
            Err(warning) => {
                tracing::warn!(file = %warning.name, reason = %warning.reason, "file skipped");
                report.warnings.push(warning);
            }
        }
    }
    tracing::info!(
        loaded = report.loaded.len(),
        skipped = report.warnings.len(),
        "files loaded"
    );
    report
}

async fn load_one<A>(api: &A, file: &FoundFile) -> std::result::Result<LoadedFile, LoadWarning>
where
    A: DriveApi + ?Sized,
{
    let warn = |reason: String| LoadWarning {
        name: file.name.clone(),
        reason,
    };
    if file.download_url.is_none() {
        return Err(warn("cannot be downloaded (no download link)".to_string()));
    }

    let bytes = api
        .download(file)
        .await
        .map_err(|e| warn(format!("download failed: {e}")))?;

    let name = file.name.clone();
    let frame = tokio::task::spawn_blocking(move || read_table(&name, &bytes))
        .await
        .map_err(|e| warn(format!("decoding task failed: {e}")))?
        .map_err(|e| warn(format!("load failed: {e}")))?;

    Ok(LoadedFile {
        file: file.clone(),
        frame,
    })
}

/// Everything one search produces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOutcome {
    /// Matching files in traversal order.
    pub files: Vec<FoundFile>,
    /// Row-wise union of the files that loaded.
    pub frame: Frame,
    /// Files that did not load.
    pub warnings: Vec<LoadWarning>,
}

impl SearchOutcome {
    /// Returns `true` when the search found nothing.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Search, then download and combine what was found.
///
/// Finding no files is not an error; the outcome is simply empty and no
/// download is attempted.
pub async fn run_search<A>(
    api: &A,
    request: &SearchRequest,
    max_depth: Option<usize>,
    concurrency: usize,
) -> Result<SearchOutcome>
where
    A: DriveApi + ?Sized,
{
    let files = find_files(api, request, max_depth).await?;
    if files.is_empty() {
        return Ok(SearchOutcome::default());
    }
    let report = load_files(api, &files, concurrency).await;
    Ok(SearchOutcome {
        frame: report.combined(),
        files,
        warnings: report.warnings,
    })
}
