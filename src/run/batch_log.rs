//! Batch bookkeeping in the `batches` table.
//!
//! Failures here are logged and never fail the batch.

use chrono::Utc;
use log::warn;

use crate::error_handling::HarvestError;
use crate::harvest::BatchReport;
use crate::storage::{BatchFinish, BatchStart, BatchStatus, SqliteSink};

/// Records that a batch started.
pub(crate) async fn record_batch_begin(
    batch_log: &SqliteSink,
    batch_id: &str,
    source_name: &str,
    total_domains: usize,
) {
    let start = BatchStart {
        batch_id,
        source_name,
        started_at_ms: Utc::now().timestamp_millis(),
        total_domains,
    };
    if let Err(e) = batch_log.record_batch_start(&start).await {
        warn!("Failed to record start of batch {batch_id}: {e}");
    }
}

/// Records how a batch ended.
pub(crate) async fn record_batch_end(
    batch_log: &SqliteSink,
    batch_id: &str,
    result: &Result<BatchReport, HarvestError>,
) {
    let finish = batch_finish(batch_id, result);
    if let Err(e) = batch_log.record_batch_finish(&finish).await {
        warn!("Failed to record end of batch {batch_id}: {e}");
    }
}

fn batch_finish<'a>(
    batch_id: &'a str,
    result: &Result<BatchReport, HarvestError>,
) -> BatchFinish<'a> {
    let (report, status) = match result {
        Ok(report) => (Some(report), report.status()),
        Err(HarvestError::StorageUnavailable { report, .. }) => {
            (Some(report.as_ref()), BatchStatus::Failed)
        }
        Err(HarvestError::Driver(_)) => (None, BatchStatus::Failed),
    };
    BatchFinish {
        batch_id,
        completed_domains: report.map_or(0, |r| r.completed),
        stored_records: report.map_or(0, |r| r.stored),
        elapsed_seconds: report.map_or(0.0, |r| r.elapsed_seconds),
        status,
    }
}
