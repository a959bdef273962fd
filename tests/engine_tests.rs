use std::sync::Arc;

use sortviz::engine::{Dataset, EngineError, Executor, RunControl, SortEngine};
use sortviz::model::{Algorithm, Outcome, RunConfig, RunSummary, Step, VizEvent};
use tokio::sync::mpsc;

fn config(algorithm: Algorithm, size: usize, delay_ms: u64, seed: u64) -> RunConfig {
    RunConfig {
        algorithm,
        size,
        delay_ms,
        seed,
    }
}

/// Drive a run over fixed values to its terminal outcome and collect the
/// event stream.
async fn run_to_end(
    algorithm: Algorithm,
    values: Vec<u32>,
    delay_ms: u64,
) -> (RunSummary, Vec<VizEvent>) {
    let cfg = config(algorithm, values.len(), delay_ms, 0);
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let control = Arc::new(RunControl::new(delay_ms));
    control.begin();

    let engine = SortEngine::with_values(cfg, values);
    let summary = engine.run(control, event_tx).await.unwrap();

    let mut events = Vec::new();
    while let Ok(ev) = event_rx.try_recv() {
        events.push(ev);
    }
    (summary, events)
}

fn steps_of(events: &[VizEvent]) -> Vec<Step> {
    events
        .iter()
        .filter_map(|ev| match ev {
            VizEvent::Step(s) => Some(s.clone()),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn all_algorithms_sort_to_completion() {
    for algorithm in Algorithm::ALL {
        let values = Dataset::generate(24, 7).into_values();
        let (summary, _) = run_to_end(algorithm, values, 1).await;

        assert_eq!(summary.outcome, Outcome::Completed, "{algorithm:?}");
        assert_eq!(
            summary.values,
            (1..=24).collect::<Vec<u32>>(),
            "{algorithm:?} did not sort"
        );
    }
}

#[tokio::test(start_paused = true)]
async fn step_stream_counters_are_monotonic_and_match_summary() {
    let values = Dataset::generate(16, 5).into_values();
    let (summary, events) = run_to_end(Algorithm::Bubble, values, 1).await;
    let steps = steps_of(&events);

    assert!(!steps.is_empty());
    for pair in steps.windows(2) {
        assert!(pair[1].comparisons >= pair[0].comparisons);
        assert!(pair[1].swaps >= pair[0].swaps);
        assert!(pair[1].progress >= pair[0].progress);
    }
    for step in &steps {
        assert!((0.0..=1.0).contains(&step.progress));
    }

    let last = steps.last().unwrap();
    assert_eq!(last.comparisons, summary.comparisons);
    assert_eq!(last.swaps, summary.swaps);
    assert_eq!(steps.len() as u64, summary.steps);
}

#[tokio::test(start_paused = true)]
async fn run_started_carries_the_initial_permutation() {
    let values = vec![3, 1, 4, 2];
    let (_, events) = run_to_end(Algorithm::Quick, values.clone(), 1).await;

    match events.first() {
        Some(VizEvent::RunStarted {
            algorithm,
            values: initial,
            delay_ms,
        }) => {
            assert_eq!(*algorithm, Algorithm::Quick);
            assert_eq!(*initial, values);
            assert_eq!(*delay_ms, 1);
        }
        other => panic!("expected RunStarted first, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn bubble_counts_on_reference_input() {
    let (summary, _) = run_to_end(Algorithm::Bubble, vec![5, 3, 4, 1, 2], 1).await;

    assert_eq!(summary.comparisons, 10);
    // One swap per inversion; this input has 8.
    assert_eq!(summary.swaps, 8);
    assert_eq!(summary.values, vec![1, 2, 3, 4, 5]);
}

#[tokio::test(start_paused = true)]
async fn quadratic_sorts_compare_every_pair() {
    for algorithm in [Algorithm::Bubble, Algorithm::Selection] {
        let n = 12u64;
        let values = Dataset::generate(n as usize, 11).into_values();
        let (summary, _) = run_to_end(algorithm, values, 1).await;
        assert_eq!(summary.comparisons, n * (n - 1) / 2, "{algorithm:?}");
    }
}

#[tokio::test(start_paused = true)]
async fn insertion_counts_one_comparison_per_shift() {
    let values: Vec<u32> = (1..=10).rev().collect();
    let (summary, _) = run_to_end(Algorithm::Insertion, values, 1).await;

    // Reverse input shifts every element all the way down.
    assert_eq!(summary.comparisons, 45);
    assert_eq!(summary.swaps, 45);
    assert_eq!(summary.values, (1..=10).collect::<Vec<u32>>());
}

#[tokio::test(start_paused = true)]
async fn merge_counts_placements_as_swaps() {
    let (summary, _) = run_to_end(Algorithm::Merge, vec![4, 2], 1).await;

    assert_eq!(summary.comparisons, 1);
    // Copy-back writes both elements.
    assert_eq!(summary.swaps, 2);
    assert_eq!(summary.values, vec![2, 4]);
}

#[tokio::test(start_paused = true)]
async fn recursive_sorts_match_fixed_counts() {
    let (summary, _) = run_to_end(Algorithm::Quick, vec![4, 2, 1, 3], 1).await;
    assert_eq!(summary.comparisons, 4);
    // Two partition moves, plus one counted pivot placement per partition.
    assert_eq!(summary.swaps, 4);
    assert_eq!(summary.values, vec![1, 2, 3, 4]);

    let (summary, _) = run_to_end(Algorithm::Heap, vec![4, 2, 1, 3], 1).await;
    // Build: 3 probes, 1 swap; extracts: 3 probes, 5 swaps (3 root swaps
    // plus 2 sift moves).
    assert_eq!(summary.comparisons, 6);
    assert_eq!(summary.swaps, 6);
    assert_eq!(summary.values, vec![1, 2, 3, 4]);

    let (summary, _) = run_to_end(Algorithm::Merge, vec![3, 1, 4, 2], 1).await;
    // Every merge placement counts, leftovers included: 8 writes total.
    assert_eq!(summary.comparisons, 5);
    assert_eq!(summary.swaps, 8);
    assert_eq!(summary.values, vec![1, 2, 3, 4]);
}

#[tokio::test(start_paused = true)]
async fn set_delay_paces_subsequent_checkpoints_only() {
    let cfg = config(Algorithm::Bubble, 4, 100, 1);
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let mut executor = Executor::new();
    executor.start(cfg, event_tx).unwrap();

    let mut stamps = Vec::new();
    while let Some(ev) = event_rx.recv().await {
        if matches!(ev, VizEvent::Step(_)) {
            stamps.push(tokio::time::Instant::now());
            if stamps.len() == 3 {
                executor.active().unwrap().set_delay(10);
            }
        }
    }

    let summary = executor.take().unwrap().join().await.unwrap();
    assert_eq!(summary.outcome, Outcome::Completed);

    // Bubble on 4 elements emits at least the 6 comparison steps.
    assert!(stamps.len() >= 6);
    let gaps: Vec<_> = stamps.windows(2).map(|w| w[1] - w[0]).collect();

    // Steps before the change are paced by the original delay, and so is
    // the checkpoint already in flight when set_delay lands.
    assert_eq!(gaps[0], std::time::Duration::from_millis(100));
    assert_eq!(gaps[1], std::time::Duration::from_millis(100));
    assert_eq!(gaps[2], std::time::Duration::from_millis(100));
    // Everything after picks up the new delay.
    for gap in &gaps[3..] {
        assert_eq!(*gap, std::time::Duration::from_millis(10));
    }
}

#[tokio::test(start_paused = true)]
async fn cancel_before_first_checkpoint_leaves_data_untouched() {
    let values = vec![5, 3, 4, 1, 2];
    let cfg = config(Algorithm::Bubble, values.len(), 200, 0);
    let (event_tx, _event_rx) = mpsc::unbounded_channel();
    let control = Arc::new(RunControl::new(200));
    control.begin();
    control.request_cancel();

    let engine = SortEngine::with_values(cfg, values.clone());
    let summary = engine.run(control, event_tx).await.unwrap();

    assert_eq!(summary.outcome, Outcome::Cancelled);
    assert_eq!(summary.values, values);
}

#[tokio::test]
async fn cancel_midway_preserves_the_permutation() {
    let cfg = config(Algorithm::Quick, 64, 1, 3);
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let control = Arc::new(RunControl::new(1));
    control.begin();

    let engine = SortEngine::new(cfg);
    let run_control = control.clone();
    let task = tokio::spawn(async move { engine.run(run_control, event_tx).await });

    // Let a handful of steps land, then pull the plug.
    let mut seen = 0;
    while let Some(ev) = event_rx.recv().await {
        if matches!(ev, VizEvent::Step(_)) {
            seen += 1;
            if seen >= 10 {
                break;
            }
        }
    }
    control.request_cancel();

    let summary = task.await.unwrap().unwrap();
    assert_eq!(summary.outcome, Outcome::Cancelled);

    // Cancellation must not lose or duplicate elements.
    let mut remaining = summary.values;
    remaining.sort_unstable();
    assert_eq!(remaining, (1..=64).collect::<Vec<u32>>());
}

#[tokio::test(start_paused = true)]
async fn pause_and_resume_do_not_change_the_step_stream() {
    let values = Dataset::generate(12, 9).into_values();

    let (_, baseline_events) = run_to_end(Algorithm::Insertion, values.clone(), 1).await;
    let baseline = steps_of(&baseline_events);

    let cfg = config(Algorithm::Insertion, values.len(), 1, 0);
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let control = Arc::new(RunControl::new(1));
    control.begin();
    assert!(control.pause());

    let engine = SortEngine::with_values(cfg, values);
    let run_control = control.clone();
    let task = tokio::spawn(async move { engine.run(run_control, event_tx).await });

    // Hold the run paused across several checkpoint wait cycles.
    tokio::time::sleep(std::time::Duration::from_millis(500)).await;
    assert!(control.resume());

    let summary = task.await.unwrap().unwrap();
    assert_eq!(summary.outcome, Outcome::Completed);

    let mut events = Vec::new();
    while let Ok(ev) = event_rx.try_recv() {
        events.push(ev);
    }
    assert_eq!(steps_of(&events), baseline);
}

#[tokio::test]
async fn executor_rejects_overlapping_starts() {
    let cfg = config(Algorithm::Heap, 64, 50, 1);
    let (event_tx, _event_rx) = mpsc::unbounded_channel();

    let mut executor = Executor::new();
    executor.start(cfg.clone(), event_tx.clone()).unwrap();
    assert_eq!(
        executor.start(cfg, event_tx),
        Err(EngineError::AlreadyRunning)
    );

    let handle = executor.take().unwrap();
    handle.cancel();
    let summary = handle.join().await.unwrap();
    assert_eq!(summary.outcome, Outcome::Cancelled);
}

#[tokio::test]
async fn executor_rejects_invalid_configuration() {
    let (event_tx, _event_rx) = mpsc::unbounded_channel();
    let mut executor = Executor::new();

    let too_small = config(Algorithm::Bubble, 1, 50, 1);
    assert!(matches!(
        executor.start(too_small, event_tx.clone()),
        Err(EngineError::InvalidConfiguration(_))
    ));

    let too_slow = config(Algorithm::Bubble, 16, 5_000, 1);
    assert!(matches!(
        executor.start(too_slow, event_tx),
        Err(EngineError::InvalidConfiguration(_))
    ));
}
