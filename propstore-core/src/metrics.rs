use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Process-local counters for query activity.
#[derive(Debug, Default)]
pub struct QueryMetrics {
    data_runs: AtomicU64,
    count_runs: AtomicU64,
    store_failures: AtomicU64,
    decode_failures: AtomicU64,
    oversize_dropped: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub data_runs: u64,
    pub count_runs: u64,
    pub store_failures: u64,
    pub decode_failures: u64,
    pub oversize_dropped: u64,
}

impl QueryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_data_run(&self) {
        self.data_runs.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_count_run(&self) {
        self.count_runs.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_store_failure(&self) {
        self.store_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_decode_failures(&self, n: u64) {
        if n > 0 {
            self.decode_failures.fetch_add(n, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_oversize_dropped(&self, n: u64) {
        if n > 0 {
            self.oversize_dropped.fetch_add(n, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            data_runs: self.data_runs.load(Ordering::Relaxed),
            count_runs: self.count_runs.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            oversize_dropped: self.oversize_dropped.load(Ordering::Relaxed),
        }
    }
}
