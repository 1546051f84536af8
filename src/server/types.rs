//! Server state and error responses.

use std::path::PathBuf;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::error_handling::StorageError;
use crate::harvest::Harvester;
use crate::storage::SqliteSink;

/// Shared state for the HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Engine that runs uploaded batches and owns the record sink
    pub harvester: Arc<Harvester>,
    /// Where batch start/end rows are written, if anywhere
    pub batch_log: Option<SqliteSink>,
    /// Directory search exports are written to and downloads served from
    pub results_dir: PathBuf,
}

/// Handler failure, rendered as a plain-text body with a matching status.
#[derive(Error, Debug)]
pub enum ApiError {
    /// 400
    #[error("{0}")]
    BadRequest(String),

    /// 404
    #[error("{0}")]
    NotFound(String),

    /// 500
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub(crate) fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub(crate) fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(msg) = &self {
            log::error!("Request failed: {msg}");
        }
        (self.status(), self.to_string()).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        Self::Internal(e.to_string())
    }
}
