//! Shared per-run state machine: pacing, pause, and cancellation.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

use crate::model::{MAX_DELAY_MS, MIN_DELAY_MS};

const IDLE: u8 = 0;
const RUNNING: u8 = 1;
const PAUSED: u8 = 2;
const COMPLETED: u8 = 3;
const CANCELLED: u8 = 4;

/// Upper bound on how long a paused run waits before re-checking state.
/// `resume()` notifies immediately; the timeout covers a missed wakeup.
const PAUSE_WAIT: Duration = Duration::from_millis(50);

/// Lifecycle of a single sorting run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Paused,
    Completed,
    Cancelled,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Completed | RunState::Cancelled)
    }

    fn from_u8(v: u8) -> RunState {
        match v {
            IDLE => RunState::Idle,
            RUNNING => RunState::Running,
            PAUSED => RunState::Paused,
            COMPLETED => RunState::Completed,
            _ => RunState::Cancelled,
        }
    }
}

/// What the run task should do after a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Continue,
    Abort,
}

/// Internal unwind token: the run observed cancellation at a checkpoint.
/// Never surfaced to callers; it resolves into a `Cancelled` outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aborted;

/// Control state shared between the run task and external callers.
///
/// All cross-thread mutation goes through compare-and-exchange transitions
/// on `state`; `delay_ms` is independent and just stored/loaded.
pub struct RunControl {
    state: AtomicU8,
    delay_ms: AtomicU64,
    resume: Notify,
}

impl RunControl {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            state: AtomicU8::new(IDLE),
            delay_ms: AtomicU64::new(delay_ms.clamp(MIN_DELAY_MS, MAX_DELAY_MS)),
            resume: Notify::new(),
        }
    }

    pub fn state(&self) -> RunState {
        RunState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// True while the run is live (Running or Paused).
    pub fn is_running(&self) -> bool {
        matches!(self.state(), RunState::Running | RunState::Paused)
    }

    /// Idle -> Running, called once by the executor at spawn time.
    pub fn begin(&self) -> bool {
        self.state
            .compare_exchange(IDLE, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Running -> Paused. No-op from any other state.
    pub fn pause(&self) -> bool {
        self.state
            .compare_exchange(RUNNING, PAUSED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Paused -> Running, waking the checkpoint gate.
    pub fn resume(&self) -> bool {
        let ok = self
            .state
            .compare_exchange(PAUSED, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if ok {
            self.resume.notify_waiters();
        }
        ok
    }

    /// Flag the run for cancellation. Idempotent, non-blocking, and never
    /// demotes a run that already completed.
    pub fn request_cancel(&self) {
        let mut cur = self.state.load(Ordering::Acquire);
        loop {
            if RunState::from_u8(cur).is_terminal() {
                return;
            }
            match self.state.compare_exchange(
                cur,
                CANCELLED,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    // Wake a paused checkpoint so the task can unwind promptly.
                    self.resume.notify_waiters();
                    return;
                }
                Err(actual) => cur = actual,
            }
        }
    }

    /// Running -> Completed. Fails (returns false) if cancellation won the
    /// race; the run then resolves as Cancelled.
    pub fn complete(&self) -> bool {
        self.state
            .compare_exchange(RUNNING, COMPLETED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn delay_ms(&self) -> u64 {
        self.delay_ms.load(Ordering::Relaxed)
    }

    /// Update pacing for subsequent checkpoints; clamped to the valid range.
    pub fn set_delay(&self, ms: u64) {
        self.delay_ms
            .store(ms.clamp(MIN_DELAY_MS, MAX_DELAY_MS), Ordering::Relaxed);
    }

    /// The per-step gate: sleep the configured delay, then hold while Paused.
    /// Returns `Abort` once the run has been cancelled.
    pub async fn checkpoint(&self) -> Signal {
        tokio::time::sleep(Duration::from_millis(self.delay_ms())).await;
        loop {
            match self.state() {
                RunState::Cancelled => return Signal::Abort,
                RunState::Paused => {
                    let _ = tokio::time::timeout(PAUSE_WAIT, self.resume.notified()).await;
                }
                _ => return Signal::Continue,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn pause_only_from_running() {
        let c = RunControl::new(10);
        assert!(!c.pause());
        assert!(c.begin());
        assert!(c.pause());
        assert_eq!(c.state(), RunState::Paused);
        assert!(!c.pause());
    }

    #[test]
    fn resume_only_from_paused() {
        let c = RunControl::new(10);
        c.begin();
        assert!(!c.resume());
        c.pause();
        assert!(c.resume());
        assert_eq!(c.state(), RunState::Running);
    }

    #[test]
    fn cancel_is_idempotent_and_wins_over_pause() {
        let c = RunControl::new(10);
        c.begin();
        c.pause();
        c.request_cancel();
        c.request_cancel();
        assert_eq!(c.state(), RunState::Cancelled);
        assert!(!c.resume());
    }

    #[test]
    fn complete_loses_to_cancel() {
        let c = RunControl::new(10);
        c.begin();
        c.request_cancel();
        assert!(!c.complete());
        assert_eq!(c.state(), RunState::Cancelled);
    }

    #[test]
    fn cancel_does_not_demote_completed() {
        let c = RunControl::new(10);
        c.begin();
        assert!(c.complete());
        c.request_cancel();
        assert_eq!(c.state(), RunState::Completed);
    }

    #[test]
    fn delay_is_clamped() {
        let c = RunControl::new(0);
        assert_eq!(c.delay_ms(), MIN_DELAY_MS);
        c.set_delay(10_000);
        assert_eq!(c.delay_ms(), MAX_DELAY_MS);
        c.set_delay(80);
        assert_eq!(c.delay_ms(), 80);
    }

    #[tokio::test(start_paused = true)]
    async fn checkpoint_aborts_once_cancelled() {
        let c = RunControl::new(5);
        c.begin();
        c.request_cancel();
        assert_eq!(c.checkpoint().await, Signal::Abort);
    }

    #[tokio::test(start_paused = true)]
    async fn checkpoint_holds_while_paused_until_resumed() {
        let c = Arc::new(RunControl::new(1));
        c.begin();
        c.pause();
        let gate = {
            let c = c.clone();
            tokio::spawn(async move { c.checkpoint().await })
        };
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(!gate.is_finished());
        c.resume();
        assert_eq!(gate.await.unwrap(), Signal::Continue);
    }
}
