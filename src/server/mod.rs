//! HTTP surface for the web client.
//!
//! Routes:
//! - `POST /upload` - start a batch from a `.csv`/`.txt` file, streaming progress
//! - `GET /search?keyword=` - export matching records to a CSV file
//! - `GET /list` - every stored record as JSON
//! - `GET /download?file=` - fetch an exported CSV file
//!
//! Every route passes through the CORS middleware.

mod cors;
mod handlers;
mod types;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::{middleware, Router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::app::cancel_on_ctrl_c;
use crate::config::MAX_UPLOAD_BYTES;

use handlers::{download_handler, list_handler, search_handler, upload_handler};
pub use types::{ApiError, AppState};

/// Builds the application router.
pub fn router(state: AppState, cors_origin: HeaderValue) -> Router {
    Router::new()
        .route(
            "/upload",
            post(upload_handler).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/search", get(search_handler))
        .route("/list", get(list_handler))
        .route("/download", get(download_handler))
        .layer(middleware::from_fn_with_state(cors_origin, cors::cors))
        .with_state(state)
}

/// Serves `app` on `listener` until `shutdown` is cancelled.
///
/// Open upload streams end once their batches see the cancellation.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: CancellationToken,
) -> Result<(), anyhow::Error> {
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("Server error")
}

/// Binds `bind` and serves the API until Ctrl-C.
pub async fn start_server(
    bind: &str,
    state: AppState,
    cors_origin: &str,
) -> Result<(), anyhow::Error> {
    let cors_origin = HeaderValue::from_str(cors_origin)
        .with_context(|| format!("Invalid CORS origin: {cors_origin}"))?;
    let listener = TcpListener::bind(bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind server to {}: {}", bind, e))?;

    let addr = listener.local_addr().context("Failed to read bound address")?;
    log::info!("Server listening on http://{}/", addr);
    log::info!("  - Results directory: {}", state.results_dir.display());

    let shutdown = state.harvester.shutdown_token();
    let _ctrl_c = cancel_on_ctrl_c(shutdown.clone());
    serve(listener, router(state, cors_origin), shutdown).await?;

    log::info!("Server stopped");
    Ok(())
}
