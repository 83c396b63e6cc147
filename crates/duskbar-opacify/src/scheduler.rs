//! Timed-step runner with run-level cancellation.
//!
//! A run is an ordered list of steps, each firing at an absolute delay from
//! the moment of scheduling. One task drives the whole run so steps fire in
//! order even when delays collide, and one [`CancellationToken`] aborts every
//! step that has not fired yet.

use std::sync::{
    Arc,
    atomic::{AtomicU64, AtomicUsize, Ordering},
};

use tokio::time::{self, Duration};
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// One scheduled step: a delay from the run's start and an action to fire.
pub struct Step {
    /// Delay from the scheduling moment (not from the previous step).
    delay: Duration,
    /// Action fired once the delay elapses; fire-and-forget.
    action: Box<dyn FnOnce() + Send>,
}

impl Step {
    /// Create a step firing `action` once `delay` has elapsed from t0.
    pub fn new<F>(delay: Duration, action: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            delay,
            action: Box::new(action),
        }
    }
}

/// Handle to one scheduled run.
///
/// Dropping the handle does not cancel the run; cancellation goes through
/// [`StepScheduler::cancel_all`].
pub struct RunHandle {
    /// Cancels every step that has not fired yet.
    token: CancellationToken,
    /// Steps not yet fired by the run task.
    unfired: Arc<AtomicUsize>,
    /// Run id, for tracing only.
    id: u64,
}

impl RunHandle {
    /// Number of steps that can still fire.
    ///
    /// Zero once every step has fired or the run has been cancelled;
    /// cancellation counts immediately, without waiting for the run task to
    /// observe it.
    pub fn pending(&self) -> usize {
        if self.token.is_cancelled() {
            0
        } else {
            self.unfired.load(Ordering::SeqCst)
        }
    }

    /// Whether the run was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Schedules step runs on the tokio runtime.
///
/// At most one run should be live per controller; callers enforce that by
/// cancelling the previous handle before scheduling a new run.
#[derive(Clone, Default)]
pub struct StepScheduler {
    /// Monotonic run id source, shared across clones.
    next_id: Arc<AtomicU64>,
}

impl StepScheduler {
    /// Create a scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a run. Steps fire in list order at their absolute delays.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&self, steps: Vec<Step>) -> RunHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        let unfired = Arc::new(AtomicUsize::new(steps.len()));

        let cancel = token.clone();
        let remaining = unfired.clone();
        let start = time::Instant::now();
        let step_count = steps.len();
        tokio::spawn(async move {
            trace!(run = id, steps = step_count, "run_start");
            for (index, step) in steps.into_iter().enumerate() {
                // Biased so cancellation wins over an already-elapsed delay.
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        trace!(run = id, step = index, "run_cancelled");
                        return;
                    }
                    _ = time::sleep_until(start + step.delay) => {
                        remaining.fetch_sub(1, Ordering::SeqCst);
                        (step.action)();
                        trace!(run = id, step = index, "step_fired");
                    }
                }
            }
            trace!(run = id, "run_done");
        });

        RunHandle { token, unfired, id }
    }

    /// Cancel every step of `handle` that has not fired yet.
    ///
    /// Safe to call on a fully fired run (no-op) and idempotent. Steps whose
    /// fire time already passed are not rolled back.
    pub fn cancel_all(&self, handle: &RunHandle) {
        handle.token.cancel();
        trace!(run = handle.id, "cancel_all");
    }
}
