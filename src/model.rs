use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Smallest dataset worth animating.
pub const MIN_SIZE: usize = 2;
/// Largest dataset the renderer can show one bar per element for.
pub const MAX_SIZE: usize = 256;
/// Pacing bounds for the per-step delay, in milliseconds.
pub const MIN_DELAY_MS: u64 = 1;
pub const MAX_DELAY_MS: u64 = 500;

/// The comparison sorts the engine can animate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    Bubble,
    Selection,
    Insertion,
    Merge,
    Quick,
    Heap,
}

impl Algorithm {
    pub const ALL: [Algorithm; 6] = [
        Algorithm::Bubble,
        Algorithm::Selection,
        Algorithm::Insertion,
        Algorithm::Merge,
        Algorithm::Quick,
        Algorithm::Heap,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Algorithm::Bubble => "Bubble Sort",
            Algorithm::Selection => "Selection Sort",
            Algorithm::Insertion => "Insertion Sort",
            Algorithm::Merge => "Merge Sort",
            Algorithm::Quick => "Quick Sort",
            Algorithm::Heap => "Heap Sort",
        }
    }

    /// The next algorithm in display order, for cycling in the TUI.
    pub fn next(self) -> Algorithm {
        let idx = Self::ALL.iter().position(|a| *a == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Semantic tag on a step; rendering maps this to a visual style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Marker {
    Comparing,
    Swapping,
    PivotSelect,
    RangeActive,
    Sorted,
}

/// One observable unit of algorithm progress.
///
/// `writes` lists the `(index, value)` mutations this step applied, so a
/// consumer can mirror the dataset from the step stream alone instead of
/// reading shared mutable state mid-run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub primary: Option<usize>,
    pub secondary: Option<usize>,
    pub marker: Marker,
    pub comparisons: u64,
    pub swaps: u64,
    pub progress: f64,
    pub writes: Vec<(usize, u32)>,
}

/// Configuration for a single sorting run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub algorithm: Algorithm,
    pub size: usize,
    pub delay_ms: u64,
    pub seed: u64,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Completed,
    Cancelled,
}

/// Final report of a run, carried by the terminal event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(default)]
    pub timestamp_utc: String,
    pub algorithm: Algorithm,
    pub size: usize,
    pub seed: u64,
    pub outcome: Outcome,
    pub comparisons: u64,
    pub swaps: u64,
    pub steps: u64,
    pub duration_ms: u64,
    pub values: Vec<u32>,
}

/// Events emitted by the engine and controller, consumed by UI/CLI layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum VizEvent {
    RunStarted {
        algorithm: Algorithm,
        values: Vec<u32>,
        delay_ms: u64,
    },
    Step(Step),
    Info(InfoEvent),
    RunFinished {
        // Box to keep VizEvent small; RunSummary carries the whole dataset.
        summary: Box<RunSummary>,
    },
}

/// Structured info messages for UI/CLI status lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InfoEvent {
    Message(String),
}

impl InfoEvent {
    pub fn to_message(&self) -> String {
        match self {
            InfoEvent::Message(msg) => msg.clone(),
        }
    }
}
