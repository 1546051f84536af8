//! txt_harvest library: bulk DNS TXT record harvesting
//!
//! This library resolves the TXT records of large domain lists with bounded
//! concurrency and a fixed-delay retry policy, stores the non-empty results in
//! SQLite, and reports per-batch progress as a stream of percentages.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use futures::StreamExt;
//! use txt_harvest::{HarvestSettings, Harvester, HickoryTxtResolver, SqliteSink};
//! use txt_harvest::initialization::init_resolver;
//! use txt_harvest::storage::{init_db_pool_with_path, run_migrations, DEFAULT_DB_CONNECTIONS};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = init_db_pool_with_path("./records.db".as_ref(), DEFAULT_DB_CONNECTIONS).await?;
//! run_migrations(&pool).await?;
//!
//! let resolver = init_resolver(std::time::Duration::from_secs(5))?;
//! let harvester = Harvester::new(
//!     Arc::new(HickoryTxtResolver::new(resolver)),
//!     Arc::new(SqliteSink::new(pool)),
//!     HarvestSettings::default(),
//! );
//!
//! let (mut progress, handle) = harvester.start_batch("demo", ["example.com", "example.org"])?;
//! while let Some(pct) = progress.next().await {
//!     println!("{pct}%");
//! }
//! let report = handle.wait().await?;
//! println!("{} of {} domains stored", report.stored, report.total);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

#![warn(missing_docs)]

pub mod app;
pub mod cli;
pub mod config;
pub mod dns;
pub mod error_handling;
pub mod export;
pub mod harvest;
pub mod initialization;
pub mod input;
pub mod progress;
pub mod retry;
pub mod run;
pub mod server;
pub mod storage;
pub mod worker_pool;

// Re-export public API
pub use config::{Config, LogFormat, LogLevel};
pub use dns::{HickoryTxtResolver, LookupError, TxtResolver};
pub use error_handling::{HarvestError, InputError, StorageError};
pub use harvest::{BatchHandle, BatchReport, HarvestSettings, Harvester};
pub use progress::{BatchProgress, ProgressStream};
pub use retry::{OutcomeKind, ResolutionOutcome, RetryPolicy};
pub use storage::{run_migrations, ResolvedRecord, SqliteSink, StorageSink};
pub use worker_pool::WorkerPool;
