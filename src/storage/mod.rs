//! Durable storage for resolved records.
//!
//! The engine only sees the [`StorageSink`] trait; [`SqliteSink`] is the
//! production implementation.

pub mod circuit_breaker;
pub mod migrations;
pub mod models;
pub mod pool;
pub mod sink;
pub mod sqlite;

#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used items
pub use circuit_breaker::StorageCircuitBreaker;
pub use migrations::run_migrations;
pub use models::{BatchFinish, BatchStart, BatchStatus, BatchSummary, ResolvedRecord};
pub use pool::{init_db_pool_with_path, DEFAULT_DB_CONNECTIONS};
pub use sink::StorageSink;
pub use sqlite::SqliteSink;
