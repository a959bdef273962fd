//! At-most-one-run executor and the handle it returns.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use super::control::{RunControl, RunState};
use super::{validate_config, EngineError, SortEngine};
use crate::model::{RunConfig, RunSummary, VizEvent};

/// Handle to a spawned run: control surface plus the join side.
pub struct RunHandle {
    control: Arc<RunControl>,
    // Kept in an Option so completion is observed exactly once; the
    // controller polls it through `task_mut` without taking it early.
    task: Option<JoinHandle<Result<RunSummary>>>,
}

impl RunHandle {
    pub fn pause(&self) -> bool {
        self.control.pause()
    }

    pub fn resume(&self) -> bool {
        self.control.resume()
    }

    pub fn cancel(&self) {
        self.control.request_cancel();
    }

    pub fn set_delay(&self, ms: u64) {
        self.control.set_delay(ms);
    }

    pub fn is_running(&self) -> bool {
        self.control.is_running()
    }

    pub fn state(&self) -> RunState {
        self.control.state()
    }

    pub fn task_mut(&mut self) -> Option<&mut JoinHandle<Result<RunSummary>>> {
        self.task.as_mut()
    }

    pub fn take_task(&mut self) -> Option<JoinHandle<Result<RunSummary>>> {
        self.task.take()
    }

    /// Wait for the run task and return its summary.
    pub async fn join(mut self) -> Result<RunSummary> {
        match self.task.take() {
            Some(task) => task.await?,
            None => Err(anyhow::anyhow!("run already joined")),
        }
    }
}

/// Spawns sorting runs, enforcing that at most one is live at a time.
///
/// `start` rejects overlap with `EngineError::AlreadyRunning`; callers that
/// want "restart always works" semantics cancel the active run and start
/// again once its task resolves (see `orchestrator::run_controller`).
#[derive(Default)]
pub struct Executor {
    current: Option<RunHandle>,
}

impl Executor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(
        &mut self,
        cfg: RunConfig,
        event_tx: UnboundedSender<VizEvent>,
    ) -> Result<(), EngineError> {
        validate_config(&cfg)?;
        if self.current.as_ref().is_some_and(|h| h.is_running()) {
            return Err(EngineError::AlreadyRunning);
        }

        let control = Arc::new(RunControl::new(cfg.delay_ms));
        control.begin();
        let engine = SortEngine::new(cfg);
        let run_control = control.clone();
        let task = tokio::spawn(async move { engine.run(run_control, event_tx).await });
        self.current = Some(RunHandle {
            control,
            task: Some(task),
        });
        Ok(())
    }

    pub fn active(&self) -> Option<&RunHandle> {
        self.current.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut RunHandle> {
        self.current.as_mut()
    }

    pub fn take(&mut self) -> Option<RunHandle> {
        self.current.take()
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn is_running(&self) -> bool {
        self.current.as_ref().is_some_and(|h| h.is_running())
    }
}
