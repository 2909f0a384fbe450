//! Relay counters
//!
//! Counters are plain relaxed atomics: they are read for reporting only and
//! never used to synchronize registry state.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Live counters for one registry
#[derive(Debug, Default)]
pub struct RelayStats {
    events_published: AtomicU64,
    deliveries: AtomicU64,
    dropped_deliveries: AtomicU64,
    subscriptions_opened: AtomicU64,
    subscriptions_closed: AtomicU64,
}

impl RelayStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one publish call and its fan-out result
    pub fn record_publish(&self, delivered: usize, dropped: usize) {
        self.events_published.fetch_add(1, Ordering::Relaxed);
        self.deliveries.fetch_add(delivered as u64, Ordering::Relaxed);
        self.dropped_deliveries
            .fetch_add(dropped as u64, Ordering::Relaxed);
    }

    /// Record a new subscription
    pub fn record_subscribe(&self) {
        self.subscriptions_opened.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a removed subscription
    pub fn record_unsubscribe(&self) {
        self.subscriptions_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time copy of the counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            events_published: self.events_published.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            dropped_deliveries: self.dropped_deliveries.load(Ordering::Relaxed),
            subscriptions_opened: self.subscriptions_opened.load(Ordering::Relaxed),
            subscriptions_closed: self.subscriptions_closed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`RelayStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Publish calls handled
    pub events_published: u64,
    /// Events accepted by subscriber queues
    pub deliveries: u64,
    /// Events addressed to queues whose consumer was already gone
    pub dropped_deliveries: u64,
    /// Subscriptions registered
    pub subscriptions_opened: u64,
    /// Subscriptions removed
    pub subscriptions_closed: u64,
}

impl StatsSnapshot {
    /// Subscriptions currently registered
    pub fn active_subscriptions(&self) -> u64 {
        self.subscriptions_opened
            .saturating_sub(self.subscriptions_closed)
    }

    /// Combine two snapshots, e.g. across protocol versions
    pub fn merge(self, other: StatsSnapshot) -> StatsSnapshot {
        StatsSnapshot {
            events_published: self.events_published + other.events_published,
            deliveries: self.deliveries + other.deliveries,
            dropped_deliveries: self.dropped_deliveries + other.dropped_deliveries,
            subscriptions_opened: self.subscriptions_opened + other.subscriptions_opened,
            subscriptions_closed: self.subscriptions_closed + other.subscriptions_closed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_publish() {
        let stats = RelayStats::new();

        stats.record_publish(3, 1);
        stats.record_publish(0, 0);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.events_published, 2);
        assert_eq!(snapshot.deliveries, 3);
        assert_eq!(snapshot.dropped_deliveries, 1);
    }

    #[test]
    fn test_active_subscriptions() {
        let stats = RelayStats::new();

        stats.record_subscribe();
        stats.record_subscribe();
        stats.record_unsubscribe();

        assert_eq!(stats.snapshot().active_subscriptions(), 1);
    }

    #[test]
    fn test_merge() {
        let a = StatsSnapshot {
            events_published: 1,
            deliveries: 2,
            subscriptions_opened: 1,
            ..Default::default()
        };
        let b = StatsSnapshot {
            events_published: 4,
            dropped_deliveries: 1,
            subscriptions_opened: 2,
            subscriptions_closed: 1,
            ..Default::default()
        };

        let merged = a.merge(b);
        assert_eq!(merged.events_published, 5);
        assert_eq!(merged.deliveries, 2);
        assert_eq!(merged.dropped_deliveries, 1);
        assert_eq!(merged.active_subscriptions(), 2);
    }
}
