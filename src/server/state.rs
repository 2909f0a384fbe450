//! Shared server state

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::payload::{EventPayload, Protocol};
use crate::registry::{EventRegistry, SubscriberId};
use crate::stats::StatsSnapshot;

use super::config::RelayConfig;

/// Registry type shared by every protocol version
pub type PayloadRegistry = EventRegistry<EventPayload>;

/// Publish accepted by a route, waiting for fan-out
struct PendingPublish {
    channels: Vec<String>,
    payload: EventPayload,
}

/// One protocol version: its registry and the worker feeding it
struct Lane {
    registry: Arc<PayloadRegistry>,
    fanout: mpsc::UnboundedSender<PendingPublish>,
}

impl Lane {
    /// Spawn the fan-out worker for a fresh registry
    ///
    /// A single worker drains publishes in arrival order, so events accepted
    /// one after another reach each subscriber in that same order. The worker
    /// exits once the lane is dropped.
    fn spawn(protocol: Protocol, registry: Arc<PayloadRegistry>) -> Self {
        let (fanout, mut pending) = mpsc::unbounded_channel::<PendingPublish>();
        let worker_registry = Arc::clone(&registry);

        tokio::spawn(async move {
            while let Some(PendingPublish { channels, payload }) = pending.recv().await {
                let delivered = worker_registry.publish(&channels, payload);
                tracing::debug!(
                    protocol = %protocol,
                    channels = ?channels,
                    delivered = delivered,
                    "Background publish complete"
                );
            }
            tracing::debug!(protocol = %protocol, "Fan-out worker stopped");
        });

        Self { registry, fanout }
    }
}

struct Inner {
    config: RelayConfig,
    v1: Lane,
    v2: Lane,
    v3: Lane,
    next_subscriber_seq: AtomicU64,
}

/// State handed to every route handler
///
/// Each protocol version gets its own registry so that payload variants never
/// cross.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

impl AppState {
    /// Create state with one fresh registry per protocol version
    ///
    /// Must be called from within a Tokio runtime; it spawns one fan-out
    /// worker per version.
    pub fn new(config: RelayConfig) -> Self {
        let lane = |protocol| {
            let registry = Arc::new(PayloadRegistry::with_config(config.registry.clone()));
            Lane::spawn(protocol, registry)
        };

        Self {
            inner: Arc::new(Inner {
                v1: lane(Protocol::V1),
                v2: lane(Protocol::V2),
                v3: lane(Protocol::V3),
                config,
                next_subscriber_seq: AtomicU64::new(1),
            }),
        }
    }

    fn lane(&self, protocol: Protocol) -> &Lane {
        match protocol {
            Protocol::V1 => &self.inner.v1,
            Protocol::V2 => &self.inner.v2,
            Protocol::V3 => &self.inner.v3,
        }
    }

    /// Server configuration
    pub fn config(&self) -> &RelayConfig {
        &self.inner.config
    }

    /// Registry for a protocol version
    pub fn registry(&self, protocol: Protocol) -> &Arc<PayloadRegistry> {
        &self.lane(protocol).registry
    }

    /// Allocate an identity for a new subscribe request from `peer`
    pub fn next_subscriber_id(&self, peer: SocketAddr) -> SubscriberId {
        let seq = self.inner.next_subscriber_seq.fetch_add(1, Ordering::Relaxed);
        SubscriberId::from_peer(peer, seq)
    }

    /// Queue an event for fan-out on the version's background worker
    ///
    /// Returns immediately. Events queued by one caller are delivered in the
    /// order they were queued. Returns `false` only if the worker is gone.
    pub fn publish_in_background(
        &self,
        protocol: Protocol,
        channels: Vec<String>,
        payload: EventPayload,
    ) -> bool {
        let queued = self
            .lane(protocol)
            .fanout
            .send(PendingPublish { channels, payload })
            .is_ok();

        if !queued {
            tracing::warn!(protocol = %protocol, "Fan-out worker gone, event dropped");
        }
        queued
    }

    /// Active subscribers across all protocol versions
    pub fn subscriber_count(&self) -> usize {
        Protocol::ALL
            .iter()
            .map(|p| self.registry(*p).subscriber_count())
            .sum()
    }

    /// Counters merged across all protocol versions
    pub fn stats(&self) -> StatsSnapshot {
        Protocol::ALL
            .iter()
            .map(|p| self.registry(*p).stats())
            .fold(StatsSnapshot::default(), StatsSnapshot::merge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::TaggedEvent;

    #[tokio::test]
    async fn test_registries_are_independent() {
        let state = AppState::new(RelayConfig::default());

        let _queue = state
            .registry(Protocol::V2)
            .subscribe("A", ["x"])
            .unwrap();

        assert_eq!(state.registry(Protocol::V2).subscriber_count(), 1);
        assert_eq!(state.registry(Protocol::V3).subscriber_count(), 0);
        assert_eq!(state.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_subscriber_ids_are_unique_per_request() {
        let state = AppState::new(RelayConfig::default());
        let peer: SocketAddr = "10.0.0.1:4000".parse().unwrap();

        assert_ne!(state.next_subscriber_id(peer), state.next_subscriber_id(peer));
    }

    #[tokio::test]
    async fn test_publish_in_background() {
        let state = AppState::new(RelayConfig::default());
        let mut queue = state
            .registry(Protocol::V3)
            .subscribe("A", ["x"])
            .unwrap();

        assert!(state.publish_in_background(
            Protocol::V3,
            vec!["x".into()],
            EventPayload::from(vec![1, 2])
        ));

        assert_eq!(
            queue.get().await.as_deref(),
            Some(&EventPayload::from(vec![1, 2]))
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_background_publishes_keep_order() {
        let state = AppState::new(RelayConfig::default());
        let mut queue = state
            .registry(Protocol::V2)
            .subscribe("A", ["o"])
            .unwrap();

        for i in 0..500 {
            let event = TaggedEvent::new(serde_json::json!(i));
            assert!(state.publish_in_background(Protocol::V2, vec!["o".into()], event.into()));
        }

        for i in 0..500 {
            let event = queue.get().await.unwrap();
            assert_eq!(*event, EventPayload::from(TaggedEvent::new(serde_json::json!(i))));
        }
    }

    #[tokio::test]
    async fn test_worker_stops_with_state() {
        let state = AppState::new(RelayConfig::default());
        let registry = Arc::clone(state.registry(Protocol::V1));

        drop(state);

        // Only the test's handle remains once the worker has exited
        for _ in 0..100 {
            if Arc::strong_count(&registry) == 1 {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        panic!("fan-out worker still holds the registry");
    }
}
