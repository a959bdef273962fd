use crate::engine::{validate_config, EngineError, Executor, RunControl, SortEngine};
use crate::model::{Algorithm, Marker, RunConfig, VizEvent};
use anyhow::{Context, Result};
use clap::Parser;
use rand::RngCore;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Spawn a blocking stderr writer so the step stream never stalls the
/// async event loop. The summary goes to stdout separately, after the
/// stream has drained.
fn spawn_step_writer() -> (mpsc::UnboundedSender<String>, tokio::task::JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let handle = tokio::task::spawn_blocking(move || {
        let stderr = std::io::stderr();
        let mut err = std::io::LineWriter::new(stderr.lock());
        while let Some(line) = rx.blocking_recv() {
            let _ = writeln!(err, "{}", line);
        }
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "sortviz",
    version,
    about = "Step-paced sorting algorithm visualizer with optional TUI"
)]
pub struct Cli {
    /// Algorithm to animate
    #[arg(long, value_enum, default_value_t = Algorithm::Bubble)]
    pub algorithm: Algorithm,

    /// Number of elements to sort
    #[arg(long, default_value_t = 50)]
    pub size: usize,

    /// Delay between steps in milliseconds
    #[arg(long, default_value_t = 50)]
    pub delay_ms: u64,

    /// Seed for the initial permutation (random when omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print the run summary as JSON and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Stream step lines to stderr and print a text summary (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Automatically start a run when the app launches
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub run_on_launch: bool,
}

pub async fn run(args: Cli) -> Result<()> {
    if !args.json && !args.text {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_text(args).await;
        }
    }

    if args.json {
        return run_json(args).await;
    }

    run_text(args).await
}

fn gen_seed() -> u64 {
    rand::thread_rng().next_u64()
}

/// Build a validated `RunConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> Result<RunConfig, EngineError> {
    let cfg = RunConfig {
        algorithm: args.algorithm,
        size: args.size,
        delay_ms: args.delay_ms,
        seed: args.seed.unwrap_or_else(gen_seed),
    };
    validate_config(&cfg)?;
    Ok(cfg)
}

/// Headless run: execute to the terminal outcome, print the summary as JSON.
async fn run_json(args: Cli) -> Result<()> {
    let cfg = build_config(&args)?;
    // No subscriber; steps are paced but unobserved.
    let (event_tx, _) = mpsc::unbounded_channel::<VizEvent>();
    let control = Arc::new(RunControl::new(cfg.delay_ms));
    control.begin();

    let engine = SortEngine::new(cfg);
    let summary = engine
        .run(control, event_tx)
        .await
        .context("sorting run failed")?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Text mode: stream swap lines to stderr, then print the summary to stdout.
async fn run_text(args: Cli) -> Result<()> {
    let cfg = build_config(&args)?;
    let (step_tx, step_handle) = spawn_step_writer();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<VizEvent>();

    let mut executor = Executor::new();
    executor.start(cfg, event_tx)?;

    while let Some(ev) = event_rx.recv().await {
        match ev {
            VizEvent::RunStarted {
                algorithm, values, ..
            } => {
                let _ = step_tx.send(format!(
                    "== {} on {} elements ==",
                    algorithm.label(),
                    values.len()
                ));
            }
            VizEvent::Step(step) => {
                // Comparisons are too chatty for a terminal; show mutations.
                if step.marker == Marker::Swapping {
                    let _ = step_tx.send(format!(
                        "swap #{:<6} [{:?} <-> {:?}]  comparisons={}",
                        step.swaps, step.primary, step.secondary, step.comparisons
                    ));
                }
            }
            VizEvent::Info(info) => {
                let _ = step_tx.send(info.to_message());
            }
            VizEvent::RunFinished { .. } => {}
        }
    }

    let summary = executor
        .take()
        .context("no active run")?
        .join()
        .await
        .context("sorting run failed")?;

    // Let the step stream land on stderr before the stdout summary.
    drop(step_tx);
    let _ = step_handle.await;

    for line in crate::text_summary::build_text_summary(&summary) {
        println!("{}", line);
    }
    Ok(())
}
