//! Scoped subscription guard
//!
//! A [`Subscription`] owns one subscriber queue and releases its registry
//! entries when dropped, whichever way the owning stream ends: normal
//! completion, client disconnect, task abort or panic.

use std::sync::Arc;

use super::key::SubscriberId;
use super::queue::SubscriberQueue;
use super::store::EventRegistry;

/// Subscriber queue bound to the registry it came from
pub struct Subscription<T: Send + Sync + 'static> {
    registry: Arc<EventRegistry<T>>,
    queue: SubscriberQueue<T>,
}

impl<T: Send + Sync + 'static> Subscription<T> {
    pub(super) fn new(registry: Arc<EventRegistry<T>>, queue: SubscriberQueue<T>) -> Self {
        Self { registry, queue }
    }

    /// Wait for the next event
    ///
    /// Returns `None` if the registration was removed out from under this
    /// guard (explicit unsubscribe, or replaced by a newer subscription).
    pub async fn recv(&mut self) -> Option<Arc<T>> {
        self.queue.get().await
    }

    /// Take the next event if one is ready
    pub fn try_recv(&mut self) -> Option<Arc<T>> {
        self.queue.try_get()
    }

    /// Identity this subscription is registered under
    pub fn subscriber(&self) -> &SubscriberId {
        self.queue.subscriber()
    }

    /// Generation of the underlying queue
    pub fn generation(&self) -> u64 {
        self.queue.generation()
    }
}

impl<T: Send + Sync + 'static> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.registry
            .release(self.queue.subscriber(), self.queue.generation());
    }
}

impl<T: Send + Sync + 'static> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("subscriber", self.queue.subscriber())
            .field("generation", &self.queue.generation())
            .finish()
    }
}
