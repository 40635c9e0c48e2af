//! Pipeline statistics and error accounting
//!
//! Counters are monotonic atomics written from the hot path with relaxed
//! ordering; per-sink write errors live in a concurrent map keyed by sink
//! name. Reads produce point-in-time snapshots.

use dashmap::DashMap;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct PipelineStats {
    /// Records accepted into the ingestion queue
    enqueued: AtomicU64,

    /// Records that progressed past formatting to the writer stage
    written: AtomicU64,

    /// Records dropped at enqueue due to queue saturation
    dropped: AtomicU64,

    /// Batches flushed by the workers
    batches: AtomicU64,

    /// Sink write and close failures, plus formatter failures
    write_errors: AtomicU64,

    /// Hook failures of any kind
    hook_errors: AtomicU64,

    /// Per-sink write error counts
    sink_errors: DashMap<String, AtomicU64>,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_written(&self) {
        self.written.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_batch(&self) {
        self.batches.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_write_error(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_hook_error(&self) {
        self.hook_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Bump the error counter for a named sink. Lock-free once the counter
    /// exists.
    pub fn record_sink_error(&self, sink: &str) {
        if let Some(counter) = self.sink_errors.get(sink) {
            counter.fetch_add(1, Ordering::Relaxed);
            return;
        }
        self.sink_errors
            .entry(sink.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn batches(&self) -> u64 {
        self.batches.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn write_errors(&self) -> u64 {
        self.write_errors.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn hook_errors(&self) -> u64 {
        self.hook_errors.load(Ordering::Relaxed)
    }

    /// Snapshot of the per-sink error map.
    pub fn sink_error_counts(&self) -> HashMap<String, u64> {
        self.sink_errors
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().load(Ordering::Relaxed)))
            .collect()
    }

    /// One-line human-readable summary of per-sink write errors, e.g.
    /// `"sink errors: rotation=1 stderr=2"`. Returns `None` when every sink
    /// is clean.
    pub fn format_sink_errors(&self) -> Option<String> {
        let counts = self.sink_error_counts();
        let mut nonzero: Vec<(String, u64)> =
            counts.into_iter().filter(|(_, c)| *c > 0).collect();
        if nonzero.is_empty() {
            return None;
        }
        nonzero.sort();
        let mut line = String::from("sink errors:");
        for (name, count) in nonzero {
            let _ = write!(line, " {}={}", name, count);
        }
        Some(line)
    }
}

/// Point-in-time view of the pipeline counters.
#[derive(Debug, Clone, Default)]
pub struct StatsSnapshot {
    pub enqueued: u64,
    pub written: u64,
    pub dropped: u64,
    pub batches: u64,
    pub write_errors: u64,
    pub hook_errors: u64,
    pub queue_len: usize,
    pub sink_errors: HashMap<String, u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_increase() {
        let stats = PipelineStats::new();
        stats.record_enqueued();
        stats.record_enqueued();
        stats.record_written();
        stats.record_dropped();
        stats.record_batch();
        stats.record_write_error();
        stats.record_hook_error();

        assert_eq!(stats.enqueued(), 2);
        assert_eq!(stats.written(), 1);
        assert_eq!(stats.dropped(), 1);
        assert_eq!(stats.batches(), 1);
        assert_eq!(stats.write_errors(), 1);
        assert_eq!(stats.hook_errors(), 1);
    }

    #[test]
    fn test_sink_error_accounting() {
        let stats = PipelineStats::new();
        stats.record_sink_error("stderr");
        stats.record_sink_error("stderr");
        stats.record_sink_error("rotation");

        let counts = stats.sink_error_counts();
        assert_eq!(counts.get("stderr"), Some(&2));
        assert_eq!(counts.get("rotation"), Some(&1));
    }

    #[test]
    fn test_summary_line() {
        let stats = PipelineStats::new();
        assert!(stats.format_sink_errors().is_none());

        stats.record_sink_error("stdout");
        stats.record_sink_error("rotation");
        stats.record_sink_error("rotation");
        assert_eq!(
            stats.format_sink_errors().unwrap(),
            "sink errors: rotation=2 stdout=1"
        );
    }
}
