//! Download of exported result files.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use axum::extract::{Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use super::super::types::{ApiError, AppState};

/// Query string of `GET /download`
#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    file: Option<String>,
}

/// `GET /download?file=`: serves a file from the results directory as a CSV
/// attachment.
pub async fn download_handler(
    State(state): State<AppState>,
    Query(params): Query<DownloadParams>,
) -> Result<Response, ApiError> {
    let requested = params
        .file
        .filter(|f| !f.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("File is required"))?;
    let path = resolve_download_path(&state.results_dir, requested.trim())
        .ok_or_else(|| ApiError::bad_request("Invalid file path"))?;

    let contents = match tokio::fs::read(&path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ApiError::not_found("File not found"))
        }
        Err(e) => {
            return Err(ApiError::Internal(format!(
                "Failed to read {}: {e}",
                path.display()
            )))
        }
    };

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("results.csv");
    let disposition = format!("attachment; filename=\"{file_name}\"");
    Ok((
        [
            (CONTENT_TYPE, "text/csv".to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        contents,
    )
        .into_response())
}

fn without_cur_dir(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Maps a requested file onto a path inside `results_dir`.
///
/// Accepts either a path that already starts with `results_dir` (what
/// `/search` returns) or a path relative to it. Anything with a `..`
/// component, or an absolute path elsewhere, is rejected.
fn resolve_download_path(results_dir: &Path, requested: &str) -> Option<PathBuf> {
    let requested = Path::new(requested);
    if requested
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return None;
    }

    let base = without_cur_dir(results_dir);
    let requested = without_cur_dir(requested);
    let inner = match requested.strip_prefix(&base) {
        Ok(rest) => rest.to_path_buf(),
        Err(_) if requested.is_relative() => requested,
        Err(_) => return None,
    };
    if inner.as_os_str().is_empty() || inner.is_absolute() {
        return None;
    }
    Some(results_dir.join(inner))
}
