//! Batch finalization and cleanup.

use anyhow::Result;
use log::{debug, warn};

use crate::app::{print_batch_summary, print_error_statistics};
use crate::error_handling::{HarvestError, ProcessingStats};
use crate::harvest::BatchReport;
use crate::storage::SqliteSink;

/// Finishes a CLI batch and turns its outcome into the command result.
///
/// This function performs the following steps:
/// 1. Print failure and info counters
/// 2. Print the one-line summary (successful or cancelled batches)
/// 3. Checkpoint the WAL file
/// 4. Close the database pool
///
/// # Errors
///
/// Returns the batch-level error if the batch failed.
pub(super) async fn finalize_batch(
    sink: &SqliteSink,
    stats: &ProcessingStats,
    result: Result<BatchReport, HarvestError>,
) -> Result<BatchReport> {
    print_error_statistics(stats);
    if let Ok(report) = &result {
        print_batch_summary(report);
    }

    if let Err(e) = sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
        .execute(sink.pool())
        .await
    {
        warn!("Failed to checkpoint WAL file (this is non-critical): {}", e);
    }
    sink.pool().close().await;
    debug!("Database pool closed");

    Ok(result?)
}
