//! The six animated sorting algorithms.
//!
//! Each body sticks to textbook structure; pacing, pause, and cancellation
//! all happen inside the `SortRun` helpers, which emit one step per
//! comparison or placement and return `Err(Aborted)` once cancelled.
//! Counting conventions are deliberate: merge copy-back and insertion
//! shifts count placements as "swaps", and quicksort's final pivot swap is
//! counted even when it lands on itself.

use futures::future::BoxFuture;

use super::control::Aborted;
use super::emitter::SortRun;
use crate::model::{Algorithm, Marker};

pub async fn run_algorithm(algorithm: Algorithm, run: &mut SortRun) -> Result<(), Aborted> {
    match algorithm {
        Algorithm::Bubble => bubble_sort(run).await,
        Algorithm::Selection => selection_sort(run).await,
        Algorithm::Insertion => insertion_sort(run).await,
        Algorithm::Merge => merge_sort(run, 0, run.len()).await,
        Algorithm::Quick => quick_sort(run, 0, run.len()).await,
        Algorithm::Heap => heap_sort(run).await,
    }
}

async fn bubble_sort(run: &mut SortRun) -> Result<(), Aborted> {
    let n = run.len();
    for i in 0..n.saturating_sub(1) {
        for j in 0..n - 1 - i {
            run.note_compare(Some(j), Some(j + 1)).await?;
            if run.get(j) > run.get(j + 1) {
                run.swap(j, j + 1).await?;
            }
        }
    }
    Ok(())
}

async fn selection_sort(run: &mut SortRun) -> Result<(), Aborted> {
    let n = run.len();
    for i in 0..n.saturating_sub(1) {
        run.mark(Marker::RangeActive, Some(i), None).await?;
        let mut min = i;
        for j in i + 1..n {
            run.note_compare(Some(min), Some(j)).await?;
            if run.get(j) < run.get(min) {
                min = j;
            }
        }
        if min != i {
            run.swap(i, min).await?;
        }
    }
    Ok(())
}

async fn insertion_sort(run: &mut SortRun) -> Result<(), Aborted> {
    let n = run.len();
    for i in 1..n {
        let key = run.get(i);
        run.mark(Marker::RangeActive, Some(i), None).await?;
        let mut j = i;
        // Comparisons are counted per executed shift; the probe that ends
        // the walk is free, matching the reference counting.
        while j > 0 && run.get(j - 1) > key {
            run.note_compare(Some(j - 1), Some(j)).await?;
            let v = run.get(j - 1);
            run.place(j, v).await?;
            j -= 1;
        }
        run.store(j, key).await?;
    }
    Ok(())
}

fn merge_sort<'a>(
    run: &'a mut SortRun,
    lo: usize,
    hi: usize,
) -> BoxFuture<'a, Result<(), Aborted>> {
    Box::pin(async move {
        if hi - lo <= 1 {
            return Ok(());
        }
        let mid = lo + (hi - lo) / 2;
        merge_sort(run, lo, mid).await?;
        merge_sort(run, mid, hi).await?;
        merge(run, lo, mid, hi).await
    })
}

async fn merge(run: &mut SortRun, lo: usize, mid: usize, hi: usize) -> Result<(), Aborted> {
    let left = run.snapshot_range(lo, mid);
    let right = run.snapshot_range(mid, hi);

    let (mut i, mut j, mut k) = (0, 0, lo);
    while i < left.len() && j < right.len() {
        run.note_compare(Some(k), None).await?;
        let v;
        if left[i] <= right[j] {
            v = left[i];
            i += 1;
        } else {
            v = right[j];
            j += 1;
        }
        run.place(k, v).await?;
        k += 1;
    }
    while i < left.len() {
        run.place(k, left[i]).await?;
        i += 1;
        k += 1;
    }
    while j < right.len() {
        run.place(k, right[j]).await?;
        j += 1;
        k += 1;
    }
    Ok(())
}

fn quick_sort<'a>(
    run: &'a mut SortRun,
    lo: usize,
    hi: usize,
) -> BoxFuture<'a, Result<(), Aborted>> {
    Box::pin(async move {
        if hi - lo <= 1 {
            return Ok(());
        }
        let p = partition(run, lo, hi).await?;
        quick_sort(run, lo, p).await?;
        quick_sort(run, p + 1, hi).await
    })
}

/// Lomuto partition over `lo..hi` with the last element as pivot.
async fn partition(run: &mut SortRun, lo: usize, hi: usize) -> Result<usize, Aborted> {
    let pivot_idx = hi - 1;
    let pivot = run.get(pivot_idx);
    run.mark(Marker::PivotSelect, Some(pivot_idx), None).await?;

    let mut i = lo;
    for j in lo..pivot_idx {
        run.note_compare(Some(j), Some(pivot_idx)).await?;
        if run.get(j) < pivot {
            run.swap(i, j).await?;
            i += 1;
        }
    }
    // Counted even when the pivot is already in place.
    run.swap(i, pivot_idx).await?;
    Ok(i)
}

async fn heap_sort(run: &mut SortRun) -> Result<(), Aborted> {
    let n = run.len();
    for i in (0..n / 2).rev() {
        sift_down(run, n, i).await?;
    }
    for end in (1..n).rev() {
        run.swap(0, end).await?;
        sift_down(run, end, 0).await?;
    }
    Ok(())
}

fn sift_down<'a>(
    run: &'a mut SortRun,
    n: usize,
    i: usize,
) -> BoxFuture<'a, Result<(), Aborted>> {
    Box::pin(async move {
        let mut largest = i;
        let left = 2 * i + 1;
        let right = 2 * i + 2;

        if left < n {
            run.note_compare(Some(left), Some(largest)).await?;
            if run.get(left) > run.get(largest) {
                largest = left;
            }
        }
        if right < n {
            run.note_compare(Some(right), Some(largest)).await?;
            if run.get(right) > run.get(largest) {
                largest = right;
            }
        }
        if largest != i {
            run.swap(i, largest).await?;
            sift_down(run, n, largest).await?;
        }
        Ok(())
    })
}
