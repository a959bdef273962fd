//! Step emission: every dataset action becomes one observable, paced step.

use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

use super::control::{Aborted, RunControl, Signal};
use super::dataset::{Dataset, Stats};
use crate::model::{Marker, Step, VizEvent};

/// Executes dataset actions as observable steps.
///
/// Every comparison and mutation goes through here: the action is applied,
/// a `Step` carrying the updated counters is emitted, and the task then
/// gates on `RunControl::checkpoint` for pacing, pause, and cancellation.
/// Steps reach subscribers in emission order; the checkpoint delay is the
/// only backpressure mechanism needed.
pub struct SortRun {
    data: Dataset,
    stats: Stats,
    event_tx: UnboundedSender<VizEvent>,
    control: Arc<RunControl>,
}

impl SortRun {
    pub fn new(data: Dataset, event_tx: UnboundedSender<VizEvent>, control: Arc<RunControl>) -> Self {
        let stats = Stats::new(data.len());
        Self {
            data,
            stats,
            event_tx,
            control,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, i: usize) -> u32 {
        self.data.get(i)
    }

    pub fn snapshot_range(&self, lo: usize, hi: usize) -> Vec<u32> {
        self.data.snapshot_range(lo, hi)
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn into_parts(self) -> (Dataset, Stats) {
        (self.data, self.stats)
    }

    async fn emit(
        &mut self,
        marker: Marker,
        primary: Option<usize>,
        secondary: Option<usize>,
        writes: Vec<(usize, u32)>,
    ) -> Result<(), Aborted> {
        self.stats.steps += 1;
        let step = Step {
            primary,
            secondary,
            marker,
            comparisons: self.stats.comparisons,
            swaps: self.stats.swaps,
            progress: self.stats.progress(),
            writes,
        };
        // A gone receiver is not an error; the run keeps its own state.
        let _ = self.event_tx.send(VizEvent::Step(step));
        match self.control.checkpoint().await {
            Signal::Continue => Ok(()),
            Signal::Abort => Err(Aborted),
        }
    }

    /// Count and show a comparison between two positions.
    pub async fn note_compare(
        &mut self,
        primary: Option<usize>,
        secondary: Option<usize>,
    ) -> Result<(), Aborted> {
        self.stats.comparisons += 1;
        self.emit(Marker::Comparing, primary, secondary, Vec::new()).await
    }

    /// Exchange two elements; counted as one swap.
    pub async fn swap(&mut self, i: usize, j: usize) -> Result<(), Aborted> {
        self.data.swap(i, j);
        self.stats.swaps += 1;
        let writes = vec![(i, self.data.get(i)), (j, self.data.get(j))];
        self.emit(Marker::Swapping, Some(i), Some(j), writes).await
    }

    /// Write one element into place, counted as a swap. This is the
    /// per-element placement convention merge copy-back and insertion
    /// shifts use for their statistics.
    pub async fn place(&mut self, k: usize, v: u32) -> Result<(), Aborted> {
        self.data.set(k, v);
        self.stats.swaps += 1;
        self.emit(Marker::Swapping, Some(k), None, vec![(k, v)]).await
    }

    /// Uncounted write: insertion sort's final key drop. Still emitted so
    /// renderers mirroring the array see the mutation.
    pub async fn store(&mut self, k: usize, v: u32) -> Result<(), Aborted> {
        self.data.set(k, v);
        self.emit(Marker::RangeActive, Some(k), None, vec![(k, v)]).await
    }

    /// Highlight-only step (pivot selection, active-range boundaries).
    pub async fn mark(
        &mut self,
        marker: Marker,
        primary: Option<usize>,
        secondary: Option<usize>,
    ) -> Result<(), Aborted> {
        self.emit(marker, primary, secondary, Vec::new()).await
    }
}
