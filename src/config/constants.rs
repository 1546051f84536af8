//! Configuration constants.
//!
//! This module defines the defaults and limits used throughout the application.

use std::time::Duration;

/// Default SQLite database path.
pub const DB_PATH: &str = "./txt_harvest.db";

/// Maximum number of concurrent TXT lookups per batch (worker pool capacity).
pub const DEFAULT_MAX_CONCURRENCY: usize = 200;
/// Upper bound accepted by `Config::validate`.
/// Above this the host runs out of sockets before DNS throughput improves.
pub const MAX_CONCURRENCY_LIMIT: usize = 1000;

// Retry strategy
/// Total resolution attempts per domain (1 initial attempt + 3 retries).
pub const RETRY_MAX_ATTEMPTS: u32 = 4;
/// Upper bound accepted by `Config::validate`.
pub const RETRY_MAX_ATTEMPTS_LIMIT: u32 = 10;
/// Fixed delay between attempts in milliseconds.
pub const RETRY_DELAY_MS: u64 = 200;

/// DNS query timeout in seconds (one query, no resolver-level retries)
pub const DNS_TIMEOUT_SECS: u64 = 5;

/// Consecutive storage insert failures before the batch is aborted.
pub const STORAGE_FAILURE_THRESHOLD: u32 = 5;

// HTTP surface
/// Default listen address for `serve`.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
/// Directory that search exports are written to and downloads are served from.
pub const DEFAULT_RESULTS_DIR: &str = "./results";
/// Origin allowed by the CORS middleware (the web client dev server).
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";
/// Maximum accepted upload body (10MB)
pub const MAX_UPLOAD_BYTES: usize = 10 << 20;
/// Multipart field carrying the domain list.
pub const UPLOAD_FIELD_NAME: &str = "domainsFile";
/// File extensions accepted by the upload endpoint (lowercase, without dot).
pub const ALLOWED_UPLOAD_EXTENSIONS: &[&str] = &["csv", "txt"];

/// Interval between progress log lines while a CLI batch is running.
pub const PROGRESS_LOG_INTERVAL: Duration = Duration::from_secs(5);
