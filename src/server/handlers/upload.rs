//! Domain list upload with streamed progress.

use std::convert::Infallible;
use std::path::Path;

use axum::body::{Body, Bytes};
use axum::extract::{Multipart, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use futures::{stream, StreamExt};
use log::{error, info};
use tokio::sync::oneshot;

use crate::app::print_batch_summary;
use crate::config::{ALLOWED_UPLOAD_EXTENSIONS, UPLOAD_FIELD_NAME};
use crate::harvest::BatchHandle;
use crate::input::parse_domains;
use crate::run::{record_batch_begin, record_batch_end};
use crate::storage::SqliteSink;

use super::super::types::{ApiError, AppState};

/// `POST /upload`: starts a batch for the uploaded file and streams its
/// progress, one percent per line.
///
/// If the batch fails as a whole, a final `error: <message>` line follows the
/// last percent. Closing the connection cancels the batch.
pub async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let (file_name, contents) = read_domains_file(&mut multipart).await?;
    let domains = parse_domains(&String::from_utf8_lossy(&contents))
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let batch_id = format!("{}_{}", file_name, chrono::Utc::now().timestamp());
    let (progress, handle) = state
        .harvester
        .start_batch(&batch_id, &domains)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    info!(
        "Upload {file_name}: batch {batch_id} with {} domains",
        handle.progress().total
    );

    if let Some(batch_log) = &state.batch_log {
        record_batch_begin(batch_log, &batch_id, &file_name, handle.progress().total).await;
    }

    let (error_tx, error_rx) = oneshot::channel();
    tokio::spawn(finish_batch(handle, state.batch_log.clone(), error_tx));

    let percents = progress.map(|pct| Ok::<_, Infallible>(format!("{pct}\n")));
    let trailer = stream::once(error_rx).filter_map(|message| async move {
        match message {
            Ok(Some(message)) => Some(Ok(format!("error: {message}\n"))),
            _ => None,
        }
    });

    Ok((
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(percents.chain(trailer)),
    )
        .into_response())
}

async fn finish_batch(
    handle: BatchHandle,
    batch_log: Option<SqliteSink>,
    error_tx: oneshot::Sender<Option<String>>,
) {
    let batch_id = handle.batch_id().to_string();
    let result = handle.wait().await;
    if let Some(batch_log) = &batch_log {
        record_batch_end(batch_log, &batch_id, &result).await;
    }

    let message = match &result {
        Ok(report) => {
            print_batch_summary(report);
            None
        }
        Err(e) => {
            error!("Batch {batch_id} failed: {e}");
            Some(e.to_string())
        }
    };
    // The client may already be gone
    let _ = error_tx.send(message);
}

async fn read_domains_file(multipart: &mut Multipart) -> Result<(String, Bytes), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Error retrieving the file: {e}")))?
    {
        if field.name() != Some(UPLOAD_FIELD_NAME) {
            continue;
        }

        let file_name = field
            .file_name()
            .and_then(upload_file_name)
            .ok_or_else(|| ApiError::bad_request("Error retrieving the file"))?;
        if !has_allowed_extension(&file_name) {
            return Err(ApiError::bad_request("Invalid file type"));
        }

        let contents = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Error reading the file: {e}")))?;
        return Ok((file_name, contents));
    }
    Err(ApiError::bad_request("Error retrieving the file"))
}

/// Last path component of a client-supplied file name.
fn upload_file_name(raw: &str) -> Option<String> {
    Path::new(raw)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

fn has_allowed_extension(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ALLOWED_UPLOAD_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
}
