//! Per-domain task processing.
//!
//! A task resolves one domain, stores the result if there is one, and only then
//! advances the batch progress. Panics are caught here so a broken lookup still
//! counts towards completion.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use log::{debug, error, info, warn};
use tokio_util::sync::CancellationToken;

use crate::dns::TxtResolver;
use crate::error_handling::{ErrorType, InfoType, ProcessingStats};
use crate::input::DomainTask;
use crate::progress::ProgressReporter;
use crate::retry::{OutcomeKind, ResolutionOutcome, RetryPolicy};
use crate::storage::{ResolvedRecord, StorageCircuitBreaker, StorageSink};

/// State shared by every task of one batch.
pub(super) struct TaskContext {
    pub resolver: Arc<dyn TxtResolver>,
    pub sink: Arc<dyn StorageSink>,
    pub policy: RetryPolicy,
    pub progress: ProgressReporter,
    pub stats: Arc<ProcessingStats>,
    pub stored: AtomicUsize,
    pub breaker: StorageCircuitBreaker,
    pub cancel: CancellationToken,
}

/// Processes a single domain task.
///
/// This future is submitted to the worker pool for each domain. It handles:
/// - Resolution with retry
/// - Storage of non-empty results
/// - Outcome accounting
/// - Progress, once the outcome is known
pub(super) async fn process_domain(ctx: Arc<TaskContext>, task: DomainTask) {
    let work = AssertUnwindSafe(resolve_and_store(&ctx, &task)).catch_unwind();
    if let Err(panic) = work.await {
        let reason = panic_message(panic.as_ref());
        let outcome = ResolutionOutcome::aborted(&task.domain, &reason);
        error!(
            "Task for {} panicked: {reason}; counted as failed",
            outcome.domain
        );
        ctx.stats.increment_error(ErrorType::TaskPanicked);
    }
    ctx.progress.advance();
}

async fn resolve_and_store(ctx: &TaskContext, task: &DomainTask) {
    let outcome = ctx
        .policy
        .resolve_with_retry(ctx.resolver.as_ref(), &task.domain)
        .await;

    match outcome.kind {
        OutcomeKind::Success => {
            if outcome.attempts > 1 {
                ctx.stats.increment_info(InfoType::SucceededAfterRetry);
                debug!(
                    "{} resolved after {} attempts",
                    outcome.domain, outcome.attempts
                );
            }
            match ResolvedRecord::from_lookup(&task.domain, &task.batch_id, outcome.records) {
                Some(record) => store(ctx, &record).await,
                None => {
                    ctx.stats.increment_info(InfoType::EmptyTxtResult);
                    debug!("{} has no TXT values", task.domain);
                }
            }
        }
        OutcomeKind::PermanentFailure => {
            ctx.stats.increment_error(ErrorType::DnsNoSuchHost);
            info!("Skipping {}: no such host", task.domain);
        }
        OutcomeKind::TransientFailureExhausted => {
            ctx.stats.increment_error(ErrorType::DnsTransientExhausted);
            warn!(
                "TXT lookup for {} failed after {} attempts: {}",
                task.domain,
                outcome.attempts,
                outcome
                    .last_error
                    .map(|e| e.to_string())
                    .unwrap_or_default()
            );
        }
    }
}

async fn store(ctx: &TaskContext, record: &ResolvedRecord) {
    if ctx.breaker.is_open() {
        debug!("Storage unavailable, dropping record for {}", record.domain);
        ctx.stats.increment_error(ErrorType::StorageInsertError);
        return;
    }

    match ctx.sink.insert(record).await {
        Ok(()) => {
            ctx.breaker.record_success();
            ctx.stored.fetch_add(1, Ordering::SeqCst);
        }
        Err(e) => {
            ctx.stats.increment_error(ErrorType::StorageInsertError);
            warn!("Failed to store TXT records for {}: {e}", record.domain);
            if ctx.breaker.record_failure(&e.to_string()) {
                ctx.cancel.cancel();
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
