//! Circuit breaker for storage inserts.
//!
//! Counts consecutive insert failures within one batch. Once the threshold is
//! reached the breaker opens and stays open; the engine then cancels the batch
//! and reports the storage as unavailable.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use crate::config::STORAGE_FAILURE_THRESHOLD;

/// Consecutive-failure breaker scoped to one batch.
pub struct StorageCircuitBreaker {
    /// Number of consecutive failures before opening
    failure_threshold: u32,
    /// Current consecutive failure count
    failure_count: AtomicU32,
    /// Whether the breaker has opened
    is_open: AtomicBool,
    /// Message of the failure that opened the breaker
    trip_error: Mutex<Option<String>>,
}

impl StorageCircuitBreaker {
    /// Creates a breaker with the default threshold.
    pub fn new() -> Self {
        Self::with_threshold(STORAGE_FAILURE_THRESHOLD)
    }

    /// Creates a breaker that opens after `failure_threshold` consecutive
    /// failures (minimum 1).
    pub fn with_threshold(failure_threshold: u32) -> Self {
        StorageCircuitBreaker {
            failure_threshold: failure_threshold.max(1),
            failure_count: AtomicU32::new(0),
            is_open: AtomicBool::new(false),
            trip_error: Mutex::new(None),
        }
    }

    /// Records a successful insert, resetting the consecutive count.
    pub fn record_success(&self) {
        self.failure_count.store(0, Ordering::SeqCst);
    }

    /// Records a failed insert.
    ///
    /// Returns `true` only for the call that opens the breaker.
    pub fn record_failure(&self, error: &str) -> bool {
        let count = self.failure_count.fetch_add(1, Ordering::SeqCst) + 1;
        if count < self.failure_threshold {
            return false;
        }
        if self
            .is_open
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }

        if let Ok(mut slot) = self.trip_error.lock() {
            *slot = Some(error.to_string());
        }
        log::error!(
            "Storage circuit breaker opened after {count} consecutive insert failures: {error}"
        );
        true
    }

    /// Whether the breaker has opened.
    pub fn is_open(&self) -> bool {
        self.is_open.load(Ordering::SeqCst)
    }

    /// Current consecutive failure count.
    pub fn failure_count(&self) -> u32 {
        self.failure_count.load(Ordering::SeqCst)
    }

    /// Configured threshold.
    pub fn threshold(&self) -> u32 {
        self.failure_threshold
    }

    /// The failure message that opened the breaker, if it is open.
    pub fn trip_error(&self) -> Option<String> {
        self.trip_error.lock().ok().and_then(|slot| slot.clone())
    }
}

impl Default for StorageCircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}
