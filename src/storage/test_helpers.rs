//! Shared test helpers for storage module tests.

use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::storage::{run_migrations, SqliteSink};

/// Creates an in-memory database pool with migrations applied.
///
/// A single connection keeps every query on the same in-memory database.
pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database pool");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// A [`SqliteSink`] over a fresh in-memory database.
pub async fn create_test_sink() -> SqliteSink {
    SqliteSink::new(Arc::new(create_test_pool().await))
}
