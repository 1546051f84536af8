//! Progress logging utilities.

use log::info;
use std::time::Instant;

use crate::progress::BatchProgress;

/// Logs how far a batch has come and its throughput so far.
pub fn log_progress(batch_id: &str, start_time: Instant, progress: BatchProgress) {
    let elapsed_secs = start_time.elapsed().as_secs_f64();
    info!(
        "Batch {}: {}/{} domains ({}%) in {:.2} seconds (~{:.2} domains/sec)",
        batch_id,
        progress.completed,
        progress.total,
        progress.percent(),
        elapsed_secs,
        rate(progress.completed, elapsed_secs)
    );
}

fn rate(completed: usize, elapsed_secs: f64) -> f64 {
    if elapsed_secs > 0.0 {
        completed as f64 / elapsed_secs
    } else {
        0.0
    }
}
