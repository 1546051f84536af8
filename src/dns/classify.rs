//! Lookup failure classification.

use super::lookup::LookupError;

/// Whether a failed lookup is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The domain does not exist. Retrying cannot help.
    Permanent,
    /// Timeouts, refusals, network and protocol errors.
    Transient,
}

/// Default classifier used by [`crate::retry::RetryPolicy`].
///
/// `NoSuchHost` is permanent. `Other` errors are permanent only when their
/// message reads like an NXDOMAIN answer, which covers resolvers that report it
/// as free text. Everything else is transient.
pub fn classify_lookup_error(error: &LookupError) -> FailureClass {
    match error {
        LookupError::NoSuchHost(_) => FailureClass::Permanent,
        LookupError::Timeout(_) => FailureClass::Transient,
        LookupError::Other(msg) if is_no_such_host_message(msg) => FailureClass::Permanent,
        LookupError::Other(_) => FailureClass::Transient,
    }
}

/// True for free-text resolver errors that mean "domain does not exist".
pub fn is_no_such_host_message(msg: &str) -> bool {
    let msg = msg.to_lowercase();
    msg.contains("no such host") || msg.contains("nxdomain")
}
