//! Bounded retry around single TXT lookups.
//!
//! A [`RetryPolicy`] calls a [`TxtResolver`] up to `max_attempts` times with a
//! fixed delay between attempts. Errors the classifier marks permanent stop the
//! loop at once; transient errors are retried until the budget is spent.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio_retry::strategy::FixedInterval;
use tokio_retry::RetryIf;

use crate::config::{RETRY_DELAY_MS, RETRY_MAX_ATTEMPTS};
use crate::dns::{classify_lookup_error, FailureClass, LookupError, TxtResolver};

/// Classifies a lookup error as permanent or transient.
pub type ErrorClassifier = fn(&LookupError) -> FailureClass;

/// Terminal state of one domain after the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    /// A lookup succeeded (possibly with zero records).
    Success,
    /// The classifier marked an error permanent; no further attempts were made.
    PermanentFailure,
    /// Every attempt failed with a transient error.
    TransientFailureExhausted,
}

/// Result of [`RetryPolicy::resolve_with_retry`] for one domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionOutcome {
    /// The domain that was resolved
    pub domain: String,
    /// TXT values in resolver order; empty unless `kind` is `Success`
    pub records: Vec<String>,
    /// How the retry loop ended
    pub kind: OutcomeKind,
    /// Number of resolver calls made, including the first
    pub attempts: u32,
    /// The error that ended the loop, for failures
    pub last_error: Option<LookupError>,
}

impl ResolutionOutcome {
    /// Outcome used when a task dies without producing one (panic at the task
    /// boundary). Counted like an exhausted transient failure.
    pub fn aborted(domain: &str, reason: &str) -> Self {
        Self {
            domain: domain.to_string(),
            records: Vec::new(),
            kind: OutcomeKind::TransientFailureExhausted,
            attempts: 0,
            last_error: Some(LookupError::Other(reason.to_string())),
        }
    }
}

/// Fixed-delay retry policy with a pluggable error classifier.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
    classifier: ErrorClassifier,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RETRY_MAX_ATTEMPTS, Duration::from_millis(RETRY_DELAY_MS))
    }
}

impl RetryPolicy {
    /// Creates a policy using [`classify_lookup_error`].
    ///
    /// `max_attempts` counts the first attempt; values below 1 are raised to 1.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            classifier: classify_lookup_error,
        }
    }

    /// Replaces the error classifier.
    pub fn with_classifier(mut self, classifier: ErrorClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Total attempts per domain, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay slept between attempts.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Classifies `error` with this policy's classifier.
    pub fn classify(&self, error: &LookupError) -> FailureClass {
        (self.classifier)(error)
    }

    /// Delays between attempts; one entry per retry.
    fn strategy(&self) -> std::iter::Take<FixedInterval> {
        FixedInterval::new(self.delay).take(self.max_attempts as usize - 1)
    }

    /// Resolves `domain`, retrying transient failures.
    pub async fn resolve_with_retry(
        &self,
        resolver: &dyn TxtResolver,
        domain: &str,
    ) -> ResolutionOutcome {
        let attempts = AtomicU32::new(0);
        let max_attempts = self.max_attempts;

        let result = RetryIf::spawn(
            self.strategy(),
            || {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    let result = resolver.lookup_txt(domain).await;
                    if let Err(ref e) = result {
                        log::debug!(
                            "TXT lookup for {domain} failed (attempt {attempt}/{max_attempts}): {e}"
                        );
                    }
                    result
                }
            },
            |e: &LookupError| self.classify(e) == FailureClass::Transient,
        )
        .await;

        let attempts = attempts.load(Ordering::SeqCst);
        match result {
            Ok(records) => ResolutionOutcome {
                domain: domain.to_string(),
                records,
                kind: OutcomeKind::Success,
                attempts,
                last_error: None,
            },
            Err(e) => {
                let kind = match self.classify(&e) {
                    FailureClass::Permanent => OutcomeKind::PermanentFailure,
                    FailureClass::Transient => OutcomeKind::TransientFailureExhausted,
                };
                ResolutionOutcome {
                    domain: domain.to_string(),
                    records: Vec::new(),
                    kind,
                    attempts,
                    last_error: Some(e),
                }
            }
        }
    }
}
