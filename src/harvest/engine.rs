//! Batch driver.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use log::{info, warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::app::log_progress;
use crate::config::PROGRESS_LOG_INTERVAL;
use crate::dns::TxtResolver;
use crate::error_handling::{ErrorType, HarvestError, InfoType, InputError, ProcessingStats};
use crate::input::{into_tasks, DomainTask};
use crate::progress::{BatchProgress, ProgressReporter, ProgressStream};
use crate::storage::{StorageCircuitBreaker, StorageSink};
use crate::worker_pool::WorkerPool;

use super::task::{process_domain, TaskContext};
use super::types::{BatchReport, HarvestSettings};

/// Runs harvest batches against one resolver and one storage sink.
///
/// Both collaborators are injected so tests can substitute fakes. Every batch
/// gets its own cancellation token, child of [`Harvester::shutdown_token`].
pub struct Harvester {
    resolver: Arc<dyn TxtResolver>,
    sink: Arc<dyn StorageSink>,
    settings: HarvestSettings,
    shutdown: CancellationToken,
}

impl Harvester {
    /// Creates an engine.
    pub fn new(
        resolver: Arc<dyn TxtResolver>,
        sink: Arc<dyn StorageSink>,
        settings: HarvestSettings,
    ) -> Self {
        Self {
            resolver,
            sink,
            settings,
            shutdown: CancellationToken::new(),
        }
    }

    /// Engine settings.
    pub fn settings(&self) -> &HarvestSettings {
        &self.settings
    }

    /// The storage sink batches write to.
    pub fn sink(&self) -> &Arc<dyn StorageSink> {
        &self.sink
    }

    /// Cancelling this token cancels every running and future batch.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Starts a batch and returns its progress stream and handle.
    ///
    /// Blank entries in `domains` are dropped before the total is fixed. The
    /// batch runs on the current Tokio runtime; dropping the returned stream
    /// cancels it (see [`ProgressStream::detach`]).
    ///
    /// # Errors
    ///
    /// Returns `InputError::Empty` if no domain is left. Nothing is submitted
    /// in that case.
    pub fn start_batch<I, S>(
        &self,
        batch_id: &str,
        domains: I,
    ) -> Result<(ProgressStream, BatchHandle), InputError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tasks = into_tasks(batch_id, domains)?;
        let total = tasks.len();
        let cancel = self.shutdown.child_token();
        let (progress, stream) = ProgressReporter::new(total);
        let stats = Arc::new(ProcessingStats::new());

        let ctx = Arc::new(TaskContext {
            resolver: Arc::clone(&self.resolver),
            sink: Arc::clone(&self.sink),
            policy: self.settings.policy.clone(),
            progress: progress.clone(),
            stats: Arc::clone(&stats),
            stored: AtomicUsize::new(0),
            breaker: StorageCircuitBreaker::with_threshold(self.settings.storage_failure_threshold),
            cancel: cancel.clone(),
        });

        info!(
            "Starting batch {batch_id}: {total} domains, concurrency {}, max attempts {}",
            self.settings.capacity,
            self.settings.policy.max_attempts()
        );
        let join = tokio::spawn(drive_batch(
            batch_id.to_string(),
            ctx,
            tasks,
            self.settings.capacity,
        ));

        let stream = stream.with_guard(cancel.clone().drop_guard());
        let handle = BatchHandle {
            batch_id: batch_id.to_string(),
            join,
            cancel,
            stats,
            progress,
        };
        Ok((stream, handle))
    }
}

/// Handle to a running batch; [`BatchHandle::wait`] is its completion barrier.
pub struct BatchHandle {
    batch_id: String,
    join: JoinHandle<Result<BatchReport, HarvestError>>,
    cancel: CancellationToken,
    stats: Arc<ProcessingStats>,
    progress: ProgressReporter,
}

impl BatchHandle {
    /// Batch identifier.
    pub fn batch_id(&self) -> &str {
        &self.batch_id
    }

    /// Requests cancellation. Pending submissions stop and in-flight lookups
    /// are dropped.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// The batch's cancellation token.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Live outcome counters.
    pub fn stats(&self) -> Arc<ProcessingStats> {
        Arc::clone(&self.stats)
    }

    /// Current completed/total counts.
    pub fn progress(&self) -> BatchProgress {
        self.progress.snapshot()
    }

    /// Waits for every submitted task to finish.
    ///
    /// # Errors
    ///
    /// `HarvestError::StorageUnavailable` if the storage breaker cancelled the
    /// batch; `HarvestError::Driver` if the batch driver itself died.
    pub async fn wait(self) -> Result<BatchReport, HarvestError> {
        match self.join.await {
            Ok(result) => result,
            Err(e) => Err(HarvestError::Driver(e.to_string())),
        }
    }
}

async fn drive_batch(
    batch_id: String,
    ctx: Arc<TaskContext>,
    tasks: Vec<DomainTask>,
    capacity: usize,
) -> Result<BatchReport, HarvestError> {
    let start_time = Instant::now();
    let total = tasks.len();

    let stop_logging = ctx.cancel.child_token();
    let logging_task = tokio::spawn(log_periodically(
        batch_id.clone(),
        ctx.progress.clone(),
        start_time,
        stop_logging.clone(),
    ));

    let mut pool = WorkerPool::new(capacity, ctx.cancel.clone());
    for task in tasks {
        if let Err(e) = pool.submit(process_domain(Arc::clone(&ctx), task)).await {
            info!("Batch {batch_id}: stopped submitting ({e})");
            break;
        }
    }
    let summary = pool.wait().await;

    stop_logging.cancel();
    let _ = logging_task.await;
    ctx.progress.finish();

    let progress = ctx.progress.snapshot();
    let stats = &ctx.stats;
    let report = BatchReport {
        batch_id: batch_id.clone(),
        total,
        completed: progress.completed,
        stored: ctx.stored.load(Ordering::SeqCst),
        permanent_failures: stats.get_error_count(ErrorType::DnsNoSuchHost),
        transient_failures: stats.get_error_count(ErrorType::DnsTransientExhausted),
        storage_failures: stats.get_error_count(ErrorType::StorageInsertError),
        empty_results: stats.get_info_count(InfoType::EmptyTxtResult),
        panicked: stats.get_error_count(ErrorType::TaskPanicked) + summary.panicked,
        cancelled: summary.cancelled && !progress.is_complete(),
        elapsed_seconds: start_time.elapsed().as_secs_f64(),
    };

    if ctx.breaker.is_open() {
        return Err(HarvestError::StorageUnavailable {
            consecutive_failures: ctx.breaker.threshold(),
            last_error: ctx.breaker.trip_error().unwrap_or_default(),
            report: Box::new(report),
        });
    }

    if report.cancelled {
        warn!(
            "Batch {batch_id} cancelled after {}/{} domains",
            report.completed, report.total
        );
    } else {
        info!(
            "Batch {batch_id} finished: {} domains, {} stored, {} no such host, {} failed, in {:.1}s",
            report.total,
            report.stored,
            report.permanent_failures,
            report.transient_failures,
            report.elapsed().as_secs_f64()
        );
    }
    Ok(report)
}

async fn log_periodically(
    batch_id: String,
    progress: ProgressReporter,
    start_time: Instant,
    stop: CancellationToken,
) {
    let mut interval = tokio::time::interval(PROGRESS_LOG_INTERVAL);
    // The first tick fires immediately
    interval.tick().await;
    loop {
        tokio::select! {
            _ = stop.cancelled() => break,
            _ = interval.tick() => log_progress(&batch_id, start_time, progress.snapshot()),
        }
    }
}
