//! Single-flight job runner.

use crate::status::{JobKind, JobState};
use futures::FutureExt;
use std::collections::VecDeque;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Errors returned by [`JobRunner::start`].
#[derive(Debug, Clone, Error)]
pub enum JobError {
    /// A previous invocation is still Running; the new start has no side
    /// effects.
    #[error("a job is already running on this orchestrator")]
    AlreadyRunning,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A worker panic is caught before it can poison; recover regardless.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Shared<R> {
    state: Mutex<JobState>,
    cancel: Mutex<CancellationToken>,
    results: Mutex<VecDeque<R>>,
}

/// Handle the worker uses to publish progress and results and to observe
/// cancellation.
pub struct JobContext<R> {
    shared: Arc<Shared<R>>,
    token: CancellationToken,
}

impl<R> Clone for JobContext<R> {
    fn clone(&self) -> Self {
        JobContext {
            shared: Arc::clone(&self.shared),
            token: self.token.clone(),
        }
    }
}

impl<R> JobContext<R> {
    /// True once the caller has requested a stop.
    pub fn cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The cancellation token of this run, for handing to child work.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Current progress (0-100).
    pub fn progress(&self) -> u8 {
        lock(&self.shared.state).progress
    }

    /// Raises progress. Lower values are ignored so progress never moves
    /// backwards within a run.
    pub fn set_progress(&self, progress: u8) {
        let mut state = lock(&self.shared.state);
        if progress > state.progress {
            state.progress = progress.min(100);
            debug!("progress: {}%", state.progress);
        }
    }

    /// Appends a result to the queue the caller drains.
    pub fn push_result(&self, result: R) {
        lock(&self.shared.results).push_back(result);
    }
}

/// Owns one background job at a time: its worker task, cancellation token,
/// status and result queue.
pub struct JobRunner<R> {
    shared: Arc<Shared<R>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl<R> Default for JobRunner<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> JobRunner<R> {
    pub fn new() -> Self {
        JobRunner {
            shared: Arc::new(Shared {
                state: Mutex::new(JobState::idle()),
                cancel: Mutex::new(CancellationToken::new()),
                results: Mutex::new(VecDeque::new()),
            }),
            handle: Mutex::new(None),
        }
    }

    /// Reported status of the last (or current) run.
    pub fn status(&self) -> JobState {
        lock(&self.shared.state).report()
    }

    /// Removes and returns all queued results, oldest first.
    pub fn drain_results(&self) -> Vec<R> {
        lock(&self.shared.results).drain(..).collect()
    }
}

impl<R: Send + 'static> JobRunner<R> {
    /// Starts a job. `make_work` receives the run's [`JobContext`] and
    /// returns the worker future; the future's output becomes the stored
    /// terminal state.
    ///
    /// Rejects with [`JobError::AlreadyRunning`] while a previous run is
    /// still Running, without touching any state. Must be called from
    /// within a tokio runtime.
    pub fn start<F, Fut>(&self, make_work: F) -> Result<JobState, JobError>
    where
        F: FnOnce(JobContext<R>) -> Fut,
        Fut: Future<Output = JobState> + Send + 'static,
    {
        {
            let mut state = lock(&self.shared.state);
            if state.kind == JobKind::Running {
                warn!("rejecting start: a job is already running");
                return Err(JobError::AlreadyRunning);
            }
            *state = JobState::running();
        }
        lock(&self.shared.results).clear();

        let token = CancellationToken::new();
        *lock(&self.shared.cancel) = token.clone();

        let ctx = JobContext {
            shared: Arc::clone(&self.shared),
            token,
        };
        let work = make_work(ctx);

        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(async move {
            let terminal = match AssertUnwindSafe(work).catch_unwind().await {
                Ok(state) => state,
                Err(_) => {
                    error!("job worker panicked");
                    JobState::failed("job worker panicked")
                }
            };

            let mut state = lock(&shared.state);
            let progress = state.progress;
            *state = terminal;
            // The worker reports progress through the context; its terminal
            // state must not rewind what was already published.
            state.progress = state.progress.max(progress);
        });

        // Any previous handle belongs to a run that already left Running;
        // dropping it merely detaches a completed task.
        *lock(&self.handle) = Some(handle);

        debug!("job worker started");
        Ok(self.status())
    }

    /// Requests cancellation and waits until the worker has observed it and
    /// exited. Returns the terminal status. A no-op when nothing is
    /// Running.
    pub async fn stop(&self) -> JobState {
        let running = lock(&self.shared.state).is_running();
        if running {
            debug!("stopping job worker");
            lock(&self.shared.cancel).cancel();

            let handle = lock(&self.handle).take();
            if let Some(handle) = handle {
                // Panic inside the worker is already converted to a Failed
                // state by the catch_unwind wrapper.
                let _ = handle.await;
            }
        } else {
            debug!("stop requested but no job is running");
        }
        self.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[tokio::test]
    async fn runs_to_completion_and_promotes_finished() {
        let runner: JobRunner<u32> = JobRunner::new();
        let started = runner
            .start(|ctx| async move {
                ctx.push_result(7);
                ctx.set_progress(100);
                JobState::success()
            })
            .unwrap();
        assert_eq!(started.kind, JobKind::Running);

        while runner.status().is_running() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert_eq!(runner.status().kind, JobKind::Finished);
        assert_eq!(runner.status().progress, 100);
        assert_eq!(runner.drain_results(), vec![7]);
        assert!(runner.drain_results().is_empty());
    }

    #[tokio::test]
    async fn second_start_is_rejected_while_running() {
        let runner: JobRunner<()> = JobRunner::new();
        let (release, gate) = tokio::sync::oneshot::channel::<()>();

        runner
            .start(|_ctx| async move {
                let _ = gate.await;
                JobState::success()
            })
            .unwrap();

        let rejected = runner.start(|_ctx| async { JobState::success() });
        assert!(matches!(rejected, Err(JobError::AlreadyRunning)));

        release.send(()).unwrap();
        while runner.status().is_running() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        // After the first run ends, a new start is accepted again.
        runner.start(|_ctx| async { JobState::success() }).unwrap();
        runner.stop().await;
    }

    #[tokio::test]
    async fn stop_cancels_and_joins_the_worker() {
        let runner: JobRunner<()> = JobRunner::new();
        runner
            .start(|ctx| async move {
                loop {
                    if ctx.cancelled() {
                        return JobState::stopped("cancelled");
                    }
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            })
            .unwrap();

        let state = runner.stop().await;
        assert_eq!(state.kind, JobKind::Stop);
        assert_eq!(state.message, "cancelled");
    }

    #[tokio::test]
    async fn stop_without_running_job_is_a_no_op() {
        let runner: JobRunner<()> = JobRunner::new();
        let state = runner.stop().await;
        assert_eq!(state.kind, JobKind::Stop);
        assert_eq!(state.progress, 0);
    }

    #[tokio::test]
    async fn worker_panic_becomes_failed_status() {
        let runner: JobRunner<()> = JobRunner::new();
        runner
            .start(|_ctx| async { panic!("worker exploded") })
            .unwrap();

        while runner.status().is_running() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let state = runner.status();
        assert_eq!(state.kind, JobKind::Failed);
        assert!(state.message.contains("panicked"));
    }

    #[tokio::test]
    async fn progress_is_monotonic() {
        let runner: JobRunner<()> = JobRunner::new();
        runner
            .start(|ctx| async move {
                ctx.set_progress(30);
                ctx.set_progress(10); // ignored
                ctx.set_progress(90);
                JobState::success()
            })
            .unwrap();

        while runner.status().is_running() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(runner.status().progress, 90);
    }

    #[tokio::test]
    async fn start_clears_previous_results() {
        let runner: JobRunner<u32> = JobRunner::new();
        runner
            .start(|ctx| async move {
                ctx.push_result(1);
                JobState::success()
            })
            .unwrap();
        while runner.status().is_running() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        // Not drained; the next start discards them.
        runner
            .start(|ctx| async move {
                ctx.push_result(2);
                JobState::success()
            })
            .unwrap();
        while runner.status().is_running() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(runner.drain_results(), vec![2]);
    }
}
