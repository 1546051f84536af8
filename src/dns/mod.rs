//! DNS TXT resolution.
//!
//! This module provides the single-query resolver used by the harvest engine:
//! - [`TxtResolver`]: one TXT query per call, no internal retries
//! - [`HickoryTxtResolver`]: the `hickory-resolver` backed implementation
//! - [`classify_lookup_error`]: permanent ("no such host") vs transient errors
//!
//! Retrying is the job of [`crate::retry::RetryPolicy`].

mod classify;
mod lookup;

// Re-export public API
pub use classify::{classify_lookup_error, is_no_such_host_message, FailureClass};
pub use lookup::{HickoryTxtResolver, LookupError, TxtResolver};
