//! Plain-text rendering of a run summary for non-TUI output.

use crate::model::{Outcome, RunSummary};

pub fn build_text_summary(summary: &RunSummary) -> Vec<String> {
    let outcome = match summary.outcome {
        Outcome::Completed => "completed",
        Outcome::Cancelled => "cancelled",
    };
    let sorted = summary.values.windows(2).all(|w| w[0] <= w[1]);

    vec![
        format!("Algorithm:   {}", summary.algorithm.label()),
        format!("Elements:    {}", summary.size),
        format!("Seed:        {}", summary.seed),
        format!("Outcome:     {}", outcome),
        format!("Comparisons: {}", summary.comparisons),
        format!("Swaps:       {}", summary.swaps),
        format!("Steps:       {}", summary.steps),
        format!("Duration:    {} ms", summary.duration_ms),
        format!("Sorted:      {}", if sorted { "yes" } else { "no" }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Algorithm;

    #[test]
    fn summary_lines_reflect_outcome_and_order() {
        let summary = RunSummary {
            timestamp_utc: "2026-01-01T00:00:00Z".into(),
            algorithm: Algorithm::Merge,
            size: 4,
            seed: 9,
            outcome: Outcome::Completed,
            comparisons: 5,
            swaps: 8,
            steps: 13,
            duration_ms: 42,
            values: vec![1, 2, 3, 4],
        };
        let lines = build_text_summary(&summary);
        assert!(lines.iter().any(|l| l.contains("Merge Sort")));
        assert!(lines.iter().any(|l| l.contains("completed")));
        assert!(lines.iter().any(|l| l.ends_with("yes")));

        let mut cancelled = summary;
        cancelled.outcome = Outcome::Cancelled;
        cancelled.values = vec![3, 1, 4, 2];
        let lines = build_text_summary(&cancelled);
        assert!(lines.iter().any(|l| l.contains("cancelled")));
        assert!(lines.iter().any(|l| l.ends_with("no")));
    }
}
