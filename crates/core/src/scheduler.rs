//! Batch scheduler
//!
//! Runs the warmup requests sequentially, then fires fixed-size batches of
//! concurrent requests until the wall-clock deadline passes. Each batch is
//! awaited in full before the deadline is checked again.

use std::any::Any;
use std::future::{pending, Future};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::config::LoadTestConfig;
use crate::record::{RequestId, RequestRecord};
use crate::state::RunState;

/// Stand-in deadline for durations the clock cannot represent
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Something that can perform one measured request
pub trait RequestProbe: Send + Sync {
    /// Execute a single request. Must always yield a record.
    fn execute(&self, id: RequestId) -> impl Future<Output = RequestRecord> + Send;
}

/// Result of one task in a batch
#[derive(Debug)]
pub enum BatchOutcome {
    /// The probe returned a record
    Completed(RequestRecord),
    /// The task panicked before returning a record
    Failed(String),
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEnd {
    /// The deadline passed and the last batch was awaited
    Completed,
    /// Shutdown was requested; in-flight requests were aborted
    Interrupted,
}

/// Runs warmup and measured batches against a probe
pub struct BatchScheduler<P> {
    probe: Arc<P>,
    concurrency: usize,
    duration: Duration,
    warmup: u32,
    batch_pause: Duration,
    progress_interval: usize,
}

impl<P: RequestProbe + 'static> BatchScheduler<P> {
    pub fn new(probe: Arc<P>, config: &LoadTestConfig) -> Self {
        Self {
            probe,
            concurrency: config.concurrency,
            duration: config.duration,
            warmup: config.warmup,
            batch_pause: config.batch_pause,
            progress_interval: config.progress_interval.max(1),
        }
    }

    /// Warmup followed by the measured phase
    pub async fn run(&self, state: &mut RunState) {
        self.run_until(state, pending()).await;
    }

    /// Warmup followed by the measured phase, stopping early once
    /// `shutdown` resolves. Records finished before the stop are kept.
    pub async fn run_until<F>(&self, state: &mut RunState, shutdown: F) -> RunEnd
    where
        F: Future<Output = ()>,
    {
        let mut shutdown = std::pin::pin!(shutdown);
        if self.warmup_until(state, shutdown.as_mut()).await == RunEnd::Interrupted {
            return RunEnd::Interrupted;
        }
        self.batches_until(state, shutdown).await
    }

    /// Sequential warmup requests; results stay out of the measured set
    pub async fn run_warmup(&self, state: &mut RunState) {
        self.warmup_until(state, pending()).await;
    }

    /// Measured phase: batches until the deadline
    pub async fn run_batches(&self, state: &mut RunState) -> RunEnd {
        self.batches_until(state, pending()).await
    }

    async fn warmup_until<F>(&self, state: &mut RunState, shutdown: F) -> RunEnd
    where
        F: Future<Output = ()>,
    {
        if self.warmup == 0 {
            return RunEnd::Completed;
        }
        let mut shutdown = std::pin::pin!(shutdown);

        println!("Running warmup requests...");
        for i in 1..=self.warmup {
            let record = tokio::select! {
                record = self.probe.execute(RequestId::Warmup(i)) => record,
                _ = shutdown.as_mut() => {
                    tracing::warn!(completed = i - 1, "Shutdown requested during warmup");
                    return RunEnd::Interrupted;
                }
            };
            println!(
                "Warmup {}/{}: {:.2}ms",
                i, self.warmup, record.response_time_ms
            );
            state.push_warmup(record);
        }
        println!("Warmup completed. Starting actual load test...");
        println!();
        RunEnd::Completed
    }

    async fn batches_until<F>(&self, state: &mut RunState, shutdown: F) -> RunEnd
    where
        F: Future<Output = ()>,
    {
        let mut shutdown = std::pin::pin!(shutdown);
        let deadline = deadline_after(self.duration);
        let mut next_id: u64 = 0;
        let mut end = RunEnd::Completed;

        println!("Starting load test...");
        println!("Test will run until: {}", planned_end(self.duration));
        println!();

        while end == RunEnd::Completed && Instant::now() < deadline {
            let (outcomes, batch_end) = self.collect_batch(next_id, shutdown.as_mut()).await;
            next_id += self.concurrency as u64;
            end = batch_end;

            let before = state.records().len();
            let after = state.extend_records(keep_completed(outcomes));
            tracing::debug!(added = after - before, total = after, "Batch finished");

            if crossed_multiple(before, after, self.progress_interval) {
                println!(
                    "Progress: {} requests | Success: {} | Errors: {} | Avg: {:.2}ms",
                    after,
                    state.success_count(),
                    state.error_count(),
                    state.mean_success_ms()
                );
            }

            if end == RunEnd::Completed {
                tokio::select! {
                    _ = tokio::time::sleep(self.batch_pause) => {}
                    _ = shutdown.as_mut() => end = RunEnd::Interrupted,
                }
            }
        }

        tracing::info!(
            total = state.records().len(),
            batches = next_id / self.concurrency.max(1) as u64,
            interrupted = end == RunEnd::Interrupted,
            "Measured phase finished"
        );
        end
    }

    /// Dispatch one batch and wait for every member
    ///
    /// Outcomes come back in dispatch order. A failing task never cancels
    /// its siblings.
    pub async fn dispatch_batch(&self, first_id: u64) -> Vec<BatchOutcome> {
        self.collect_batch(first_id, pending()).await.0
    }

    /// Dispatch one batch and collect it, aborting whatever is still in
    /// flight once `shutdown` resolves. Aborted requests leave no outcome.
    async fn collect_batch<F>(&self, first_id: u64, shutdown: F) -> (Vec<BatchOutcome>, RunEnd)
    where
        F: Future<Output = ()>,
    {
        let mut shutdown = std::pin::pin!(shutdown);
        let mut tasks = JoinSet::new();
        for offset in 0..self.concurrency {
            let probe = Arc::clone(&self.probe);
            let id = RequestId::Sequence(first_id + offset as u64);
            tasks.spawn(async move {
                let result = AssertUnwindSafe(probe.execute(id)).catch_unwind().await;
                (offset, result)
            });
        }

        let mut slots: Vec<Option<BatchOutcome>> = (0..self.concurrency).map(|_| None).collect();
        let mut end = RunEnd::Completed;
        loop {
            let joined = tokio::select! {
                joined = tasks.join_next() => joined,
                _ = shutdown.as_mut(), if end == RunEnd::Completed => {
                    tracing::warn!(in_flight = tasks.len(), "Shutdown requested; aborting in-flight requests");
                    tasks.abort_all();
                    end = RunEnd::Interrupted;
                    continue;
                }
            };
            let Some(joined) = joined else { break };

            match joined {
                Ok((offset, Ok(record))) => slots[offset] = Some(BatchOutcome::Completed(record)),
                Ok((offset, Err(payload))) => {
                    slots[offset] = Some(BatchOutcome::Failed(panic_message(payload)))
                }
                Err(e) if e.is_cancelled() => {}
                Err(e) => tracing::warn!(error = %e, "Request task failed to join"),
            }
        }

        (slots.into_iter().flatten().collect(), end)
    }
}

/// Keep completed records, dropping failed tasks
pub fn keep_completed(outcomes: Vec<BatchOutcome>) -> Vec<RequestRecord> {
    outcomes
        .into_iter()
        .filter_map(|outcome| match outcome {
            BatchOutcome::Completed(record) => Some(record),
            BatchOutcome::Failed(reason) => {
                tracing::warn!(%reason, "Dropping request task that produced no record");
                None
            }
        })
        .collect()
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown cause".to_string());
    format!("task panicked: {}", detail)
}

/// Deadline `duration` from now, saturating far in the future
fn deadline_after(duration: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(duration).unwrap_or_else(|| now + FAR_FUTURE)
}

/// Wall-clock end time for display
fn planned_end(duration: Duration) -> String {
    chrono::Duration::from_std(duration)
        .ok()
        .and_then(|d| chrono::Local::now().checked_add_signed(d))
        .map(|end| end.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "interrupted".to_string())
}

/// True if some multiple of `interval` lies in (before, after]
fn crossed_multiple(before: usize, after: usize, interval: usize) -> bool {
    after > before && after / interval > before / interval
}
