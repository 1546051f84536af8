//! The bulk harvesting engine.
//!
//! [`Harvester::start_batch`] turns a domain list into one task per domain,
//! runs them through a [`WorkerPool`](crate::worker_pool::WorkerPool) with the
//! configured [`RetryPolicy`](crate::retry::RetryPolicy), stores successful
//! lookups and streams progress back to the caller.

mod engine;
mod task;
mod types;

pub use engine::{BatchHandle, Harvester};
pub use types::{BatchReport, HarvestSettings};
