//! The algorithm execution engine: paced, pausable, cancellable sorting runs.
//!
//! A run is one spawned task executing one algorithm over one dataset. The
//! task is the only writer to the dataset; everyone else sees progress via
//! `VizEvent`s and steers the run through `RunControl` / `RunHandle`.

mod control;
mod dataset;
mod emitter;
mod executor;
mod sorts;

pub use control::{Aborted, RunControl, RunState, Signal};
pub use dataset::{Dataset, Stats};
pub use emitter::SortRun;
pub use executor::{Executor, RunHandle};

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tokio::sync::mpsc::UnboundedSender;

use crate::model::{
    Outcome, RunConfig, RunSummary, VizEvent, MAX_DELAY_MS, MAX_SIZE, MIN_DELAY_MS, MIN_SIZE,
};

/// Errors from the engine's start surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    AlreadyRunning,
    InvalidConfiguration(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::AlreadyRunning => write!(f, "a sorting run is already active"),
            EngineError::InvalidConfiguration(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}

pub fn validate_config(cfg: &RunConfig) -> Result<(), EngineError> {
    if !(MIN_SIZE..=MAX_SIZE).contains(&cfg.size) {
        return Err(EngineError::InvalidConfiguration(format!(
            "size must be within {MIN_SIZE}..={MAX_SIZE}, got {}",
            cfg.size
        )));
    }
    if !(MIN_DELAY_MS..=MAX_DELAY_MS).contains(&cfg.delay_ms) {
        return Err(EngineError::InvalidConfiguration(format!(
            "delay must be within {MIN_DELAY_MS}..={MAX_DELAY_MS} ms, got {}",
            cfg.delay_ms
        )));
    }
    Ok(())
}

pub struct SortEngine {
    cfg: RunConfig,
    values: Option<Vec<u32>>,
}

impl SortEngine {
    pub fn new(cfg: RunConfig) -> Self {
        Self { cfg, values: None }
    }

    /// Run over an explicit sequence instead of a generated permutation.
    pub fn with_values(cfg: RunConfig, values: Vec<u32>) -> Self {
        Self {
            cfg,
            values: Some(values),
        }
    }

    /// Execute the configured algorithm to its terminal outcome.
    ///
    /// Cancellation is cooperative: the algorithm unwinds at the next
    /// checkpoint and the run resolves as `Cancelled` rather than erroring.
    pub async fn run(
        self,
        control: Arc<RunControl>,
        event_tx: UnboundedSender<VizEvent>,
    ) -> Result<RunSummary> {
        let data = match self.values {
            Some(values) => Dataset::from_values(values),
            None => Dataset::generate(self.cfg.size, self.cfg.seed),
        };
        let started = Instant::now();

        let _ = event_tx.send(VizEvent::RunStarted {
            algorithm: self.cfg.algorithm,
            values: data.values().to_vec(),
            delay_ms: control.delay_ms(),
        });

        let mut run = SortRun::new(data, event_tx, control.clone());
        let outcome = match sorts::run_algorithm(self.cfg.algorithm, &mut run).await {
            // `complete` can still lose to a cancel that lands after the
            // final checkpoint; the run then reports Cancelled.
            Ok(()) => {
                if control.complete() {
                    Outcome::Completed
                } else {
                    Outcome::Cancelled
                }
            }
            Err(Aborted) => Outcome::Cancelled,
        };

        let (data, stats) = run.into_parts();
        Ok(RunSummary {
            timestamp_utc: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_else(|_| "now".into()),
            algorithm: self.cfg.algorithm,
            size: data.len(),
            seed: self.cfg.seed,
            outcome,
            comparisons: stats.comparisons,
            swaps: stats.swaps,
            steps: stats.steps,
            duration_ms: started.elapsed().as_millis() as u64,
            values: data.into_values(),
        })
    }
}
