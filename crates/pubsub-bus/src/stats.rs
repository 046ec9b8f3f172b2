//! Delivery counters kept by the broadcaster.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Point-in-time snapshot of bus activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BusStats {
    /// Messages accepted by the ingress.
    pub published: u64,
    /// Messages the broadcaster has fanned out.
    pub dispatched: u64,
    /// Copies placed in subscriber inboxes.
    pub delivered: u64,
    /// Pending copies overwritten under the latest-only policy.
    pub replaced: u64,
    /// Predicate evaluations that panicked.
    pub predicate_failures: u64,
    /// Subscribers currently linked.
    pub active_links: usize,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    published: AtomicU64,
    dispatched: AtomicU64,
    delivered: AtomicU64,
    replaced: AtomicU64,
    predicate_failures: AtomicU64,
}

impl Counters {
    pub(crate) fn record_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dispatch(&self, report: &DispatchReport) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
        self.delivered
            .fetch_add(report.delivered as u64, Ordering::Relaxed);
        self.replaced
            .fetch_add(report.replaced as u64, Ordering::Relaxed);
        self.predicate_failures
            .fetch_add(report.failures as u64, Ordering::Relaxed);
    }

    pub(crate) fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    pub(crate) fn snapshot(&self, active_links: usize) -> BusStats {
        BusStats {
            published: self.published.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            replaced: self.replaced.load(Ordering::Relaxed),
            predicate_failures: self.predicate_failures.load(Ordering::Relaxed),
            active_links,
        }
    }
}

/// Outcome of offering one message to the link set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct DispatchReport {
    pub offered: usize,
    pub delivered: usize,
    pub replaced: usize,
    pub failures: usize,
}
