//! Event registry implementation
//!
//! The central registry that maps channels to subscriber queues and fans
//! published events out to them.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::stats::{RelayStats, StatsSnapshot};

use super::config::{DuplicatePolicy, RegistryConfig};
use super::error::RegistryError;
use super::key::{SubscriberId, SubscriptionKey};
use super::queue::{self, QueueHandle, SubscriberQueue};
use super::subscription::Subscription;

/// Everything the registry knows about one subscriber
struct Registration<T> {
    /// Generation of the queue that owns the keys below
    generation: u64,
    /// Keeps the queue open even when the subscriber joined no channel
    keepalive: QueueHandle<T>,
    /// One key per joined channel
    keys: HashSet<SubscriptionKey>,
}

/// The three registry indices
///
/// Invariant: a key is in `subscribers` iff it is in exactly one
/// `ids_by_channel` bucket and in its subscriber's registration.
struct Indices<T> {
    subscribers: HashMap<SubscriptionKey, QueueHandle<T>>,
    ids_by_subscriber: HashMap<SubscriberId, Registration<T>>,
    ids_by_channel: HashMap<Arc<str>, HashSet<SubscriptionKey>>,
}

impl<T> Indices<T> {
    fn new() -> Self {
        Self {
            subscribers: HashMap::new(),
            ids_by_subscriber: HashMap::new(),
            ids_by_channel: HashMap::new(),
        }
    }

    fn remove_subscriber(&mut self, subscriber: &SubscriberId) -> Option<Registration<T>> {
        let registration = self.ids_by_subscriber.remove(subscriber)?;

        for key in &registration.keys {
            self.subscribers.remove(key);

            if let Some(bucket) = self.ids_by_channel.get_mut(&key.channel) {
                bucket.remove(key);
                if bucket.is_empty() {
                    self.ids_by_channel.remove(&key.channel);
                }
            }
        }

        Some(registration)
    }
}

/// Central registry for channel subscriptions
///
/// Thread-safe via a single `RwLock` over all indices. Publishing only needs
/// the read lock because enqueueing on an unbounded queue never blocks, so
/// concurrent publishers do not serialize behind each other.
pub struct EventRegistry<T> {
    indices: RwLock<Indices<T>>,

    /// Source of queue generations
    next_generation: AtomicU64,

    stats: RelayStats,

    config: RegistryConfig,
}

impl<T> EventRegistry<T> {
    /// Create a new registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            indices: RwLock::new(Indices::new()),
            next_generation: AtomicU64::new(1),
            stats: RelayStats::new(),
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // Every critical section leaves the indices consistent before anything
    // that could panic, so a poisoned lock still guards valid data.
    fn read(&self) -> RwLockReadGuard<'_, Indices<T>> {
        self.indices.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Indices<T>> {
        self.indices.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe an identity to a set of channels
    ///
    /// Creates a fresh queue and registers it under every distinct channel.
    /// An empty channel set is allowed; the queue then never receives events.
    ///
    /// If the identity already has a subscription, the configured
    /// [`DuplicatePolicy`] decides: `Replace` unsubscribes the old queue first,
    /// `Reject` returns [`RegistryError::AlreadySubscribed`].
    pub fn subscribe<I, S>(
        &self,
        subscriber: impl Into<SubscriberId>,
        channels: I,
    ) -> Result<SubscriberQueue<T>, RegistryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let subscriber = subscriber.into();
        let channels: HashSet<Arc<str>> = channels
            .into_iter()
            .map(|c| Arc::from(c.as_ref()))
            .collect();

        let mut indices = self.write();

        if indices.ids_by_subscriber.contains_key(&subscriber) {
            match self.config.duplicate_policy {
                DuplicatePolicy::Reject => {
                    tracing::warn!(
                        subscriber = %subscriber,
                        "Duplicate subscription rejected"
                    );
                    return Err(RegistryError::AlreadySubscribed(subscriber));
                }
                DuplicatePolicy::Replace => {
                    indices.remove_subscriber(&subscriber);
                    self.stats.record_unsubscribe();
                    tracing::info!(
                        subscriber = %subscriber,
                        "Existing subscription replaced"
                    );
                }
            }
        }

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let (handle, queue) = queue::channel(subscriber.clone(), generation);

        let mut keys = HashSet::with_capacity(channels.len());
        for channel in channels {
            let key = SubscriptionKey {
                channel: Arc::clone(&channel),
                subscriber: subscriber.clone(),
            };

            indices.subscribers.insert(key.clone(), handle.clone());
            indices
                .ids_by_channel
                .entry(channel)
                .or_default()
                .insert(key.clone());
            keys.insert(key);
        }

        let channel_count = keys.len();
        indices.ids_by_subscriber.insert(
            subscriber.clone(),
            Registration {
                generation,
                keepalive: handle,
                keys,
            },
        );
        drop(indices);

        self.stats.record_subscribe();

        tracing::info!(
            subscriber = %subscriber,
            generation = generation,
            channels = channel_count,
            "Subscriber added"
        );

        Ok(queue)
    }

    /// Remove every index entry for an identity
    ///
    /// Idempotent: unknown identities are ignored. Returns whether anything was
    /// removed. Once the queue is drained its `get()` returns `None`.
    pub fn unsubscribe(&self, subscriber: &SubscriberId) -> bool {
        let removed = self.write().remove_subscriber(subscriber);

        match removed {
            Some(registration) => {
                self.stats.record_unsubscribe();
                tracing::info!(
                    subscriber = %subscriber,
                    generation = registration.generation,
                    channels = registration.keys.len(),
                    consumer_gone = registration.keepalive.is_closed(),
                    "Subscriber removed"
                );
                true
            }
            None => false,
        }
    }

    /// Unsubscribe only if the identity is still registered with this generation
    ///
    /// Used when a queue is discarded, so that a queue that was already
    /// replaced cannot remove the registration that replaced it.
    pub fn release(&self, subscriber: &SubscriberId, generation: u64) -> bool {
        let removed = {
            let mut indices = self.write();
            match indices.ids_by_subscriber.get(subscriber) {
                Some(registration) if registration.generation == generation => {
                    indices.remove_subscriber(subscriber)
                }
                _ => None,
            }
        };

        match removed {
            Some(registration) => {
                self.stats.record_unsubscribe();
                tracing::info!(
                    subscriber = %subscriber,
                    generation = generation,
                    channels = registration.keys.len(),
                    consumer_gone = registration.keepalive.is_closed(),
                    "Subscription released"
                );
                true
            }
            None => {
                tracing::debug!(
                    subscriber = %subscriber,
                    generation = generation,
                    "Release skipped, registration already gone"
                );
                false
            }
        }
    }

    /// Publish an event to every subscriber of the given channels
    ///
    /// Returns the number of queues that accepted the event. A subscriber
    /// joined to several of the channels receives the event once.
    pub fn publish<I, S>(&self, channels: I, event: T) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.publish_shared(channels, Arc::new(event))
    }

    /// Publish an already shared event
    ///
    /// Every queue receives a clone of the same `Arc`; the event itself is
    /// never copied.
    pub fn publish_shared<I, S>(&self, channels: I, event: Arc<T>) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (delivered, dropped) = {
            let indices = self.read();

            let mut seen: HashSet<&SubscriberId> = HashSet::new();
            let mut delivered = 0;
            let mut dropped = 0;

            for channel in channels {
                let Some(bucket) = indices.ids_by_channel.get(channel.as_ref()) else {
                    continue;
                };

                for key in bucket {
                    if !seen.insert(&key.subscriber) {
                        continue;
                    }

                    match indices.subscribers.get(key) {
                        Some(handle) if handle.put(Arc::clone(&event)) => delivered += 1,
                        _ => dropped += 1,
                    }
                }
            }

            (delivered, dropped)
        };

        self.stats.record_publish(delivered, dropped);

        tracing::debug!(delivered = delivered, dropped = dropped, "Event published");

        delivered
    }

    /// Number of subscribers with an active registration
    pub fn subscriber_count(&self) -> usize {
        self.read().ids_by_subscriber.len()
    }

    /// Number of channels with at least one subscriber
    pub fn channel_count(&self) -> usize {
        self.read().ids_by_channel.len()
    }

    /// Whether the identity has an active registration
    pub fn is_subscribed(&self, subscriber: &SubscriberId) -> bool {
        self.read().ids_by_subscriber.contains_key(subscriber)
    }

    /// Subscribers currently joined to a channel
    pub fn channel_subscribers(&self, channel: &str) -> Vec<SubscriberId> {
        self.read()
            .ids_by_channel
            .get(channel)
            .map(|bucket| bucket.iter().map(|k| k.subscriber.clone()).collect())
            .unwrap_or_default()
    }

    /// Channels an identity is joined to, sorted
    pub fn channels_of(&self, subscriber: &SubscriberId) -> Vec<String> {
        let mut channels: Vec<String> = self
            .read()
            .ids_by_subscriber
            .get(subscriber)
            .map(|r| r.keys.iter().map(|k| k.channel().to_string()).collect())
            .unwrap_or_default();
        channels.sort();
        channels
    }

    /// Counters for this registry
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

impl<T: Send + Sync + 'static> EventRegistry<T> {
    /// Subscribe and wrap the queue in a guard that unsubscribes when dropped
    pub fn attach<I, S>(
        self: &Arc<Self>,
        subscriber: impl Into<SubscriberId>,
        channels: I,
    ) -> Result<Subscription<T>, RegistryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let queue = self.subscribe(subscriber, channels)?;
        Ok(Subscription::new(Arc::clone(self), queue))
    }
}

impl<T> Default for EventRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
