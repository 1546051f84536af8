//! Error handling and processing statistics.
//!
//! This module provides:
//! - Error type definitions for initialization, storage and input
//! - Processing statistics tracking (terminal failures and info events)
//!
//! Per-domain failures never become errors of the batch. They are counted here
//! and logged, and only the batch-level errors travel back to the caller.

mod stats;
mod types;

// Re-export public API
pub use stats::ProcessingStats;
pub use types::{
    DatabaseError, ErrorType, HarvestError, InfoType, InitializationError, InputError, PoolError,
    StorageError,
};
