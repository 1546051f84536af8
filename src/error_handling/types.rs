//! Error type definitions.
//!
//! This module defines the library error enums and the categories counted by
//! [`ProcessingStats`](super::ProcessingStats).

use log::SetLoggerError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

use crate::harvest::BatchReport;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the DNS resolver.
    #[error("DNS resolver initialization error: {0}")]
    DnsResolverError(String),
}

/// Error types for database setup.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error creating the database file.
    #[error("Database file creation error: {0}")]
    FileCreationError(String),

    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),

    /// Migration error.
    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
}

/// Errors raised by a storage sink.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The underlying database rejected the operation.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be decoded.
    #[error("corrupt stored record {id}: {reason}")]
    Corrupt {
        /// Row identifier
        id: i64,
        /// What was wrong with it
        reason: String,
    },

    /// The sink is not accepting writes.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while turning batch input into tasks.
///
/// These are surfaced before any task is submitted.
#[derive(Error, Debug)]
pub enum InputError {
    /// The input contained no domains after blank lines were dropped.
    #[error("batch input contains no domains")]
    Empty,

    /// The input could not be read.
    #[error("failed to read batch input: {0}")]
    Read(#[from] std::io::Error),
}

/// Batch-level failures returned by the completion barrier.
#[derive(Error, Debug)]
pub enum HarvestError {
    /// Consecutive insert failures reached the breaker threshold and the batch
    /// was cancelled.
    #[error("storage unavailable after {consecutive_failures} consecutive insert failures: {last_error}")]
    StorageUnavailable {
        /// Failures counted when the breaker opened
        consecutive_failures: u32,
        /// Message of the failure that opened the breaker
        last_error: String,
        /// Counts at the moment the batch stopped
        report: Box<BatchReport>,
    },

    /// The batch driver task itself failed.
    #[error("batch driver failed: {0}")]
    Driver(String),
}

/// Errors returned by the worker pool.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// The batch was cancelled; no further tasks are admitted.
    #[error("worker pool cancelled")]
    Cancelled,

    /// The pool's semaphore was closed.
    #[error("worker pool closed")]
    Closed,
}

/// Terminal failure categories counted per batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorType {
    /// The domain does not exist (NXDOMAIN); never retried.
    DnsNoSuchHost,
    /// Every attempt failed with a transient error.
    DnsTransientExhausted,
    /// The sink rejected a resolved record.
    StorageInsertError,
    /// The task panicked and was converted into a failure.
    TaskPanicked,
}

/// Informational events counted per batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum InfoType {
    /// The lookup succeeded but returned no usable TXT values.
    EmptyTxtResult,
    /// The lookup succeeded only after one or more retries.
    SucceededAfterRetry,
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorType {
    /// Human readable label used in summaries.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::DnsNoSuchHost => "No such host",
            ErrorType::DnsTransientExhausted => "DNS lookup failed after retries",
            ErrorType::StorageInsertError => "Storage insert error",
            ErrorType::TaskPanicked => "Task panicked",
        }
    }
}

impl std::fmt::Display for InfoType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl InfoType {
    /// Human readable label used in summaries.
    pub fn as_str(&self) -> &'static str {
        match self {
            InfoType::EmptyTxtResult => "No TXT records",
            InfoType::SucceededAfterRetry => "Succeeded after retry",
        }
    }
}
