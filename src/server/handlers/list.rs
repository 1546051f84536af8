//! Full record listing.

use axum::extract::State;
use axum::Json;

use crate::storage::{ResolvedRecord, StorageSink};

use super::super::types::{ApiError, AppState};

/// `GET /list`: every stored record as a JSON array
pub async fn list_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<ResolvedRecord>>, ApiError> {
    let records = state.harvester.sink().list_all().await?;
    log::debug!("Listing {} records", records.len());
    Ok(Json(records))
}
