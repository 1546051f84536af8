//! Keyword search with CSV export.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::export::write_search_results;
use crate::storage::StorageSink;

use super::super::types::{ApiError, AppState};

/// Query string of `GET /search`
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    keyword: Option<String>,
}

/// JSON body returned by a successful search
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    /// Path of the CSV file holding the matches
    pub filepath: String,
}

/// `GET /search?keyword=`: writes the matching records to a results file and
/// returns its path.
pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let keyword = params
        .keyword
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| ApiError::bad_request("Keyword is required"))?;

    let records = state.harvester.sink().find_by_keyword(keyword).await?;
    if records.is_empty() {
        return Err(ApiError::not_found("No results found"));
    }

    let dir = state.results_dir.clone();
    let path = tokio::task::spawn_blocking(move || write_search_results(&dir, &records))
        .await
        .map_err(|e| ApiError::Internal(format!("Export task failed: {e}")))?
        .map_err(|e| ApiError::Internal(format!("{e:#}")))?;

    Ok(Json(SearchResponse {
        filepath: path.display().to_string(),
    }))
}
