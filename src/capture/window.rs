//! Time-windowed sample buffer
//!
//! Holds the aggregated cursor samples and lazily drops entries older than
//! the retention duration. Pruning only advances a logical start index;
//! the backing vector is compacted once the stale prefix grows past a
//! threshold, keeping amortized cost O(1) per appended sample.

use crate::capture::types::Sample;
use std::time::Duration;

/// Compact the backing vector once this many pruned entries are pending.
const COMPACT_THRESHOLD: usize = 2048;

/// Minimum milliseconds between prune passes.
const PRUNE_INTERVAL_MS: i64 = 1000;

/// Prune regardless of elapsed time once this many live entries accumulate.
const PRUNE_PENDING_MAX: usize = 16384;

/// Append-only sample sequence with a logical start index.
///
/// Invariant: samples are strictly non-decreasing in timestamp, so range
/// queries can binary-search the live region.
pub struct SampleWindow {
    samples: Vec<Sample>,
    /// Index of the oldest still-valid entry; everything before it is stale.
    start: usize,
    retention: Duration,
    last_prune_ms: i64,
}

impl SampleWindow {
    pub fn new(retention: Duration) -> Self {
        Self {
            samples: Vec::new(),
            start: 0,
            retention,
            last_prune_ms: 0,
        }
    }

    /// Append a sample. Timestamps must be non-decreasing; out-of-order
    /// appends would break the range-query scan.
    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    /// Number of live (non-pruned) samples.
    pub fn len(&self) -> usize {
        self.samples.len() - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Update the retention duration and immediately advance the logical
    /// start index to the new cutoff.
    pub fn set_retention(&mut self, retention: Duration, now_ms: i64) {
        self.retention = retention;
        self.prune(now_ms);
    }

    /// Prune if enough time has passed since the last pass, or if the live
    /// region has grown large. Called by the aggregator after each append.
    pub fn prune_if_due(&mut self, now_ms: i64) {
        if now_ms - self.last_prune_ms > PRUNE_INTERVAL_MS || self.len() > PRUNE_PENDING_MAX {
            self.prune(now_ms);
        }
    }

    /// Advance the logical start past samples older than `now - retention`;
    /// physically compact only once the stale prefix crosses the threshold.
    pub fn prune(&mut self, now_ms: i64) {
        self.last_prune_ms = now_ms;
        let cutoff = now_ms - self.retention.as_millis() as i64;
        let mut j = self.start;
        while j < self.samples.len() && self.samples[j].ts < cutoff {
            j += 1;
        }
        if j > self.start {
            self.start = j;
            if self.start > COMPACT_THRESHOLD {
                self.samples.drain(..self.start);
                self.start = 0;
            }
        }
    }

    /// All live samples with `start_ms <= ts <= end_ms`, in timestamp order.
    ///
    /// Read-only: never advances the start index, so it is safe behind a
    /// shared read lock.
    pub fn range(&self, start_ms: i64, end_ms: i64) -> Vec<Sample> {
        let live = &self.samples[self.start..];
        if live.is_empty() {
            return Vec::new();
        }
        let lo = live.partition_point(|s| s.ts < start_ms);
        live[lo..]
            .iter()
            .take_while(|s| s.ts <= end_ms)
            .copied()
            .collect()
    }

    /// Oldest live timestamp, if any.
    pub fn oldest_ts(&self) -> Option<i64> {
        self.samples.get(self.start).map(|s| s.ts)
    }
}
