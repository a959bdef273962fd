//! Dataset storage and run statistics.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// The sequence being sorted: a permutation of `1..=n`.
///
/// Owned exclusively by the run task while a run is active; everything else
/// observes it through the emitted step stream. Indices are trusted;
/// out-of-range access is a programming fault and panics.
pub struct Dataset {
    values: Vec<u32>,
}

impl Dataset {
    /// Seeded shuffle of `1..=size`. The TUI idle preview uses the same
    /// generator so the bars on screen match what the next run will sort.
    pub fn generate(size: usize, seed: u64) -> Self {
        let mut values: Vec<u32> = (1..=size as u32).collect();
        values.shuffle(&mut StdRng::seed_from_u64(seed));
        Self { values }
    }

    pub fn from_values(values: Vec<u32>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, i: usize) -> u32 {
        self.values[i]
    }

    pub fn set(&mut self, i: usize, v: u32) {
        self.values[i] = v;
    }

    pub fn swap(&mut self, i: usize, j: usize) {
        self.values.swap(i, j);
    }

    /// Copy of `lo..hi`, used by merge sort for its side buffers.
    pub fn snapshot_range(&self, lo: usize, hi: usize) -> Vec<u32> {
        self.values[lo..hi].to_vec()
    }

    pub fn values(&self) -> &[u32] {
        &self.values
    }

    pub fn into_values(self) -> Vec<u32> {
        self.values
    }

    pub fn is_sorted(&self) -> bool {
        self.values.windows(2).all(|w| w[0] <= w[1])
    }
}

/// Monotonic counters embedded into every emitted step.
///
/// `total_steps` is the coarse `n*n` bound the original visualizer used for
/// its progress bar; progress is clamped so the gauge never overshoots.
pub struct Stats {
    pub comparisons: u64,
    pub swaps: u64,
    pub steps: u64,
    total_steps: u64,
}

impl Stats {
    pub fn new(len: usize) -> Self {
        Self {
            comparisons: 0,
            swaps: 0,
            steps: 0,
            total_steps: (len as u64).saturating_mul(len as u64),
        }
    }

    pub fn progress(&self) -> f64 {
        if self.total_steps == 0 {
            return 0.0;
        }
        (self.steps as f64 / self.total_steps as f64).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_is_a_seeded_permutation() {
        let a = Dataset::generate(32, 9);
        let b = Dataset::generate(32, 9);
        assert_eq!(a.values(), b.values());

        let mut sorted = a.values().to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, (1..=32).collect::<Vec<u32>>());
    }

    #[test]
    fn snapshot_range_does_not_mutate() {
        let d = Dataset::from_values(vec![3, 1, 2]);
        assert_eq!(d.snapshot_range(1, 3), vec![1, 2]);
        assert_eq!(d.values(), &[3, 1, 2]);
    }

    #[test]
    fn progress_is_clamped() {
        let mut s = Stats::new(2);
        s.steps = 100;
        assert_eq!(s.progress(), 1.0);
        let empty = Stats::new(0);
        assert_eq!(empty.progress(), 0.0);
    }
}
