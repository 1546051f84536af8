//! DNS resolver initialization.
//!
//! This module builds the hickory resolver shared by every lookup task.

use std::sync::Arc;
use std::time::Duration;

use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;

use crate::error_handling::InitializationError;

/// Initializes the DNS resolver used for TXT lookups.
///
/// The system configuration (`/etc/resolv.conf` or the platform equivalent) is
/// used when it can be read, otherwise hickory's default upstreams.
///
/// `attempts` is pinned to 1 so each lookup sends exactly one query; retries are
/// done by `RetryPolicy`, where they can be classified and counted.
///
/// # Errors
///
/// Returns `InitializationError::DnsResolverError` if `timeout` is zero.
pub fn init_resolver(timeout: Duration) -> Result<Arc<TokioAsyncResolver>, InitializationError> {
    if timeout.is_zero() {
        return Err(InitializationError::DnsResolverError(
            "DNS timeout must be greater than zero".to_string(),
        ));
    }

    let (config, mut opts) = match hickory_resolver::system_conf::read_system_conf() {
        Ok((config, opts)) => (config, opts),
        Err(e) => {
            log::warn!("Failed to read system DNS configuration ({e}), using defaults");
            (ResolverConfig::default(), ResolverOpts::default())
        }
    };

    opts.timeout = timeout;
    opts.attempts = 1;
    // Set ndots to 0 to prevent search domain appending
    opts.ndots = 0;

    Ok(Arc::new(TokioAsyncResolver::tokio(config, opts)))
}
