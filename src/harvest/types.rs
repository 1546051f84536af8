//! Harvest settings and batch reports.

use std::time::Duration;

use serde::Serialize;

use crate::config::{Config, DEFAULT_MAX_CONCURRENCY, STORAGE_FAILURE_THRESHOLD};
use crate::retry::RetryPolicy;
use crate::storage::BatchStatus;

/// Engine parameters shared by every batch of a [`Harvester`](super::Harvester).
#[derive(Debug, Clone)]
pub struct HarvestSettings {
    /// Maximum concurrent lookups per batch
    pub capacity: usize,
    /// Retry behaviour for each lookup
    pub policy: RetryPolicy,
    /// Consecutive insert failures that make storage count as unavailable
    pub storage_failure_threshold: u32,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_MAX_CONCURRENCY,
            policy: RetryPolicy::default(),
            storage_failure_threshold: STORAGE_FAILURE_THRESHOLD,
        }
    }
}

impl HarvestSettings {
    /// Settings taken from a validated [`Config`].
    pub fn from_config(config: &Config) -> Self {
        Self {
            capacity: config.max_concurrency,
            policy: RetryPolicy::new(config.max_attempts, config.retry_delay()),
            storage_failure_threshold: config.storage_failure_threshold,
        }
    }
}

/// Summary of one finished batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    /// Batch identifier
    pub batch_id: String,
    /// Domains in the batch
    pub total: usize,
    /// Domains whose outcome was known before the batch ended
    pub completed: usize,
    /// Records written to storage
    pub stored: usize,
    /// Lookups that ended with "no such host"
    pub permanent_failures: usize,
    /// Lookups that failed on every attempt
    pub transient_failures: usize,
    /// Lookups that succeeded but could not be stored
    pub storage_failures: usize,
    /// Successful lookups without usable TXT values
    pub empty_results: usize,
    /// Tasks that panicked
    pub panicked: usize,
    /// Whether the batch was cancelled before every task finished
    pub cancelled: bool,
    /// Wall-clock duration of the batch
    pub elapsed_seconds: f64,
}

impl BatchReport {
    /// Status recorded in the `batches` table.
    pub fn status(&self) -> BatchStatus {
        if self.cancelled {
            BatchStatus::Cancelled
        } else {
            BatchStatus::Completed
        }
    }

    /// Elapsed time as a [`Duration`].
    pub fn elapsed(&self) -> Duration {
        Duration::from_secs_f64(self.elapsed_seconds.max(0.0))
    }
}
