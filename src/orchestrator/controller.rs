//! Run lifecycle controller.
//!
//! Owns start/stop/restart orchestration and relays events to presentation
//! layers. The engine enforces at-most-one live run; this loop serializes
//! restarts on top of that so "restart" always works from the UI.

use crate::cli::{build_config, Cli};
use crate::engine::Executor;
use crate::model::{
    Algorithm, InfoEvent, RunConfig, VizEvent, MAX_DELAY_MS, MAX_SIZE, MIN_DELAY_MS, MIN_SIZE,
};
use anyhow::Result;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Commands emitted by UI layers to control the visualization.
#[derive(Debug, Clone)]
pub enum UiCommand {
    Pause(bool),
    /// Re-pace subsequent steps; applies to the live run and to later runs.
    SetDelay(u64),
    /// Reshuffle the idle dataset with a fresh seed. Ignored while running.
    Shuffle(u64),
    /// Resize the idle dataset. Ignored while running.
    SetSize(usize),
    /// Pick the algorithm for the next run. Ignored while running.
    SetAlgorithm(Algorithm),
    Restart,
    Quit,
}

fn start_run(executor: &mut Executor, cfg: &RunConfig, event_tx: &UnboundedSender<VizEvent>) {
    if let Err(e) = executor.start(cfg.clone(), event_tx.clone()) {
        let _ = event_tx.send(VizEvent::Info(InfoEvent::Message(format!(
            "Start failed: {e}"
        ))));
    }
}

/// Orchestrate sorting runs based on UI commands and emit events back.
pub async fn run_controller(
    args: &Cli,
    event_tx: UnboundedSender<VizEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut cfg = build_config(args)?;
    let mut executor = Executor::new();
    if args.run_on_launch {
        start_run(&mut executor, &cfg, &event_tx);
    }
    let mut restart_pending = false;
    let mut quit_pending = false;

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Pause(p)) => {
                        if let Some(h) = executor.active() {
                            if p { h.pause(); } else { h.resume(); }
                        }
                    }
                    Some(UiCommand::SetDelay(ms)) => {
                        cfg.delay_ms = ms.clamp(MIN_DELAY_MS, MAX_DELAY_MS);
                        if let Some(h) = executor.active() {
                            h.set_delay(ms);
                        }
                    }
                    Some(UiCommand::Shuffle(seed)) => {
                        if !executor.is_running() {
                            cfg.seed = seed;
                        }
                    }
                    Some(UiCommand::SetSize(n)) => {
                        if !executor.is_running() {
                            cfg.size = n.clamp(MIN_SIZE, MAX_SIZE);
                        }
                    }
                    Some(UiCommand::SetAlgorithm(a)) => {
                        if !executor.is_running() {
                            cfg.algorithm = a;
                        }
                    }
                    Some(UiCommand::Restart) => {
                        // Restart is serialized: cancel the active run first,
                        // then start a new one once we observe its task
                        // resolve. This keeps runs from overlapping.
                        if executor.active().is_some() {
                            restart_pending = true;
                            if let Some(h) = executor.active() {
                                h.cancel();
                            }
                            let _ = event_tx.send(VizEvent::Info(InfoEvent::Message(
                                "Cancelling…".into(),
                            )));
                        } else {
                            start_run(&mut executor, &cfg, &event_tx);
                        }
                    }
                    Some(UiCommand::Quit) => {
                        // Quit waits for the current run so UI state can be
                        // finalized cleanly.
                        quit_pending = true;
                        if let Some(h) = executor.active() {
                            h.cancel();
                        } else {
                            break Ok(());
                        }
                    }
                    None => {
                        quit_pending = true;
                        if let Some(h) = executor.active() {
                            h.cancel();
                        } else {
                            break Ok(());
                        }
                    }
                }
            }
            // Do not take the JoinHandle before this branch wins; otherwise it
            // can be dropped when another branch is chosen, and we would never
            // observe completion.
            maybe_done = async {
                if let Some(h) = executor.active_mut() {
                    if let Some(task) = h.task_mut() {
                        return Some(task.await);
                    }
                }
                futures::future::pending().await
            } => {
                if let Some(join_res) = maybe_done {
                    if let Some(h) = executor.active_mut() {
                        h.take_task();
                    }
                    match join_res {
                        Ok(Ok(summary)) => {
                            let _ = event_tx.send(VizEvent::RunFinished {
                                summary: Box::new(summary),
                            });
                        }
                        Ok(Err(e)) => {
                            let _ = event_tx.send(VizEvent::Info(InfoEvent::Message(format!(
                                "Run failed: {e:#}"
                            ))));
                        }
                        Err(e) => {
                            let _ = event_tx.send(VizEvent::Info(InfoEvent::Message(format!(
                                "Run join failed: {e}"
                            ))));
                        }
                    }
                    executor.clear();
                    if quit_pending {
                        break Ok(());
                    }
                    if restart_pending {
                        restart_pending = false;
                        start_run(&mut executor, &cfg, &event_tx);
                    }
                }
            }
        }
    }
}
