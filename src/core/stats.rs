//! Run statistics shared by the distributor and the workers.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of poller activity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollerStats {
    /// Number of worker threads.
    pub worker_count: usize,
    /// Number of distinct tasks.
    pub task_count: usize,
    /// Distribution passes (initial burst included).
    pub distributions: u64,
    /// Probe invocations, retries included.
    pub probes: u64,
    /// Deliveries skipped because the cached success was still fresh.
    pub skipped_fresh: u64,
    /// Deliveries skipped because another worker held the task.
    pub skipped_in_flight: u64,
    /// Probes that found a slot.
    pub found: u64,
    /// Probes that completed without a slot.
    pub not_available: u64,
    /// Probes that could not complete.
    pub probe_errors: u64,
    /// Probes that reported an expired session.
    pub auth_expired: u64,
    /// Credential refresh sequences started.
    pub refreshes: u64,
}

/// Internal counters (lock-free atomics).
#[derive(Debug, Default)]
pub(crate) struct PollerCounters {
    pub distributions: AtomicU64,
    pub probes: AtomicU64,
    pub skipped_fresh: AtomicU64,
    pub skipped_in_flight: AtomicU64,
    pub found: AtomicU64,
    pub not_available: AtomicU64,
    pub probe_errors: AtomicU64,
    pub auth_expired: AtomicU64,
}

impl PollerCounters {
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current statistics.
    pub fn snapshot(&self, worker_count: usize, task_count: usize, refreshes: u64) -> PollerStats {
        PollerStats {
            worker_count,
            task_count,
            distributions: self.distributions.load(Ordering::Relaxed),
            probes: self.probes.load(Ordering::Relaxed),
            skipped_fresh: self.skipped_fresh.load(Ordering::Relaxed),
            skipped_in_flight: self.skipped_in_flight.load(Ordering::Relaxed),
            found: self.found.load(Ordering::Relaxed),
            not_available: self.not_available.load(Ordering::Relaxed),
            probe_errors: self.probe_errors.load(Ordering::Relaxed),
            auth_expired: self.auth_expired.load(Ordering::Relaxed),
            refreshes,
        }
    }
}
