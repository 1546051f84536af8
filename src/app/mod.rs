//! Application-level helpers shared by the CLI and the HTTP server.
//!
//! This module provides progress logging, shutdown handling and statistics
//! printing around the harvest engine.

pub mod logging;
pub mod shutdown;
pub mod statistics;

// Re-export public API
pub use logging::log_progress;
pub use shutdown::{cancel_on_ctrl_c, wait_for_ctrl_c};
pub use statistics::{print_batch_summary, print_error_statistics, summary_line};
