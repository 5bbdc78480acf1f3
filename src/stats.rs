use std::sync::atomic::{AtomicU64, Ordering};

/// Counters maintained by a [`crate::Logger`] and its remote dispatcher.
#[derive(Debug, Default)]
pub struct DeliveryStats {
    /// Every logging call that reached the pipeline.
    pub events_seen: AtomicU64,
    /// Passed the filters and went to the sinks.
    pub events_accepted: AtomicU64,
    /// Rejected by the filters; no sink was touched.
    pub events_filtered: AtomicU64,
    /// Local sink deliveries that failed (console, file, callback).
    pub sink_failures: AtomicU64,
    /// Handed to the remote dispatcher.
    pub remote_enqueued: AtomicU64,
    /// Acknowledged by the remote endpoint with a 2xx status.
    pub remote_delivered: AtomicU64,
    /// Transport error, timeout or non-2xx status.
    pub remote_failed: AtomicU64,
    /// Not enqueued because the channel was full or the dispatcher was gone.
    pub remote_dropped: AtomicU64,
}

/// Point-in-time copy of [`DeliveryStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub events_seen: u64,
    pub events_accepted: u64,
    pub events_filtered: u64,
    pub sink_failures: u64,
    pub remote_enqueued: u64,
    pub remote_delivered: u64,
    pub remote_failed: u64,
    pub remote_dropped: u64,
}

impl DeliveryStats {
    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            events_seen: self.events_seen.load(Ordering::Relaxed),
            events_accepted: self.events_accepted.load(Ordering::Relaxed),
            events_filtered: self.events_filtered.load(Ordering::Relaxed),
            sink_failures: self.sink_failures.load(Ordering::Relaxed),
            remote_enqueued: self.remote_enqueued.load(Ordering::Relaxed),
            remote_delivered: self.remote_delivered.load(Ordering::Relaxed),
            remote_failed: self.remote_failed.load(Ordering::Relaxed),
            remote_dropped: self.remote_dropped.load(Ordering::Relaxed),
        }
    }
}
