//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (defaults, limits, etc.)
//! - The library `Config` struct and its validation
//! - Logging option types shared with the CLI

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{Config, ConfigError, LogFormat, LogLevel};
