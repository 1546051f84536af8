//! TXT record queries.

use std::sync::Arc;

use async_trait::async_trait;
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::proto::op::ResponseCode;
use hickory_resolver::TokioAsyncResolver;
use thiserror::Error;

/// Failure of a single TXT query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The domain does not exist (NXDOMAIN).
    #[error("no such host: {0}")]
    NoSuchHost(String),

    /// The query did not complete within the resolver timeout.
    #[error("lookup timed out for {0}")]
    Timeout(String),

    /// Any other resolver failure (refused, servfail, network, malformed).
    #[error("{0}")]
    Other(String),
}

/// Performs exactly one DNS TXT query per call.
#[async_trait]
pub trait TxtResolver: Send + Sync {
    /// Returns the TXT strings of `domain` in resolver order.
    ///
    /// A domain that exists but has no TXT data yields `Ok` with an empty vector.
    async fn lookup_txt(&self, domain: &str) -> Result<Vec<String>, LookupError>;
}

/// [`TxtResolver`] backed by a shared hickory `TokioAsyncResolver`.
#[derive(Clone)]
pub struct HickoryTxtResolver {
    resolver: Arc<TokioAsyncResolver>,
}

impl HickoryTxtResolver {
    /// Wraps an initialised resolver (see `initialization::init_resolver`).
    pub fn new(resolver: Arc<TokioAsyncResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl TxtResolver for HickoryTxtResolver {
    async fn lookup_txt(&self, domain: &str) -> Result<Vec<String>, LookupError> {
        match self.resolver.txt_lookup(domain).await {
            Ok(lookup) => Ok(lookup
                .iter()
                .map(|txt| {
                    // TXT records can contain multiple strings - join them
                    txt.iter()
                        .map(|bytes| String::from_utf8_lossy(bytes))
                        .collect::<String>()
                })
                .collect()),
            Err(e) => map_resolve_error(domain, &e),
        }
    }
}

/// Maps a hickory error onto [`LookupError`].
///
/// NOERROR with an empty answer is not an error for TXT harvesting, so it is
/// turned into an empty success here.
fn map_resolve_error(domain: &str, error: &ResolveError) -> Result<Vec<String>, LookupError> {
    match error.kind() {
        ResolveErrorKind::NoRecordsFound { response_code, .. }
            if *response_code == ResponseCode::NXDomain =>
        {
            Err(LookupError::NoSuchHost(domain.to_string()))
        }
        ResolveErrorKind::NoRecordsFound { response_code, .. }
            if *response_code == ResponseCode::NoError =>
        {
            Ok(Vec::new())
        }
        ResolveErrorKind::Timeout => Err(LookupError::Timeout(domain.to_string())),
        _ => Err(LookupError::Other(error.to_string())),
    }
}
