//! Per-subscription delivery queue
//!
//! Each subscription owns one unbounded FIFO queue. The registry keeps the
//! producer half ([`QueueHandle`]) in its indices, one clone per channel the
//! subscriber joined; the streaming side owns the consumer half
//! ([`SubscriberQueue`]).

use std::sync::Arc;

use tokio::sync::mpsc;

use super::key::SubscriberId;

/// Create a new queue for a subscriber
pub(super) fn channel<T>(
    subscriber: SubscriberId,
    generation: u64,
) -> (QueueHandle<T>, SubscriberQueue<T>) {
    let (tx, rx) = mpsc::unbounded_channel();

    let handle = QueueHandle {
        subscriber: subscriber.clone(),
        generation,
        tx,
    };
    let queue = SubscriberQueue {
        subscriber,
        generation,
        rx,
    };

    (handle, queue)
}

/// Producer half of a subscriber queue
pub struct QueueHandle<T> {
    subscriber: SubscriberId,
    generation: u64,
    tx: mpsc::UnboundedSender<Arc<T>>,
}

impl<T> QueueHandle<T> {
    /// Enqueue an event
    ///
    /// Never blocks. Returns `false` if the consumer has gone away; the event is
    /// dropped in that case.
    pub fn put(&self, event: Arc<T>) -> bool {
        self.tx.send(event).is_ok()
    }

    /// Whether the consumer half has been dropped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Subscriber this queue belongs to
    pub fn subscriber(&self) -> &SubscriberId {
        &self.subscriber
    }

    /// Generation stamped on the queue at subscribe time
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl<T> Clone for QueueHandle<T> {
    fn clone(&self) -> Self {
        Self {
            subscriber: self.subscriber.clone(),
            generation: self.generation,
            tx: self.tx.clone(),
        }
    }
}

impl<T> std::fmt::Debug for QueueHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueHandle")
            .field("subscriber", &self.subscriber)
            .field("generation", &self.generation)
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

/// Consumer half of a subscriber queue
///
/// Events come out in the order they were enqueued.
pub struct SubscriberQueue<T> {
    subscriber: SubscriberId,
    generation: u64,
    rx: mpsc::UnboundedReceiver<Arc<T>>,
}

impl<T> SubscriberQueue<T> {
    /// Wait for the next event
    ///
    /// Returns `None` once the subscription has been removed from the registry
    /// and every event enqueued before that has been drained.
    ///
    /// Cancel safe: dropping the returned future before it completes loses no
    /// event.
    pub async fn get(&mut self) -> Option<Arc<T>> {
        self.rx.recv().await
    }

    /// Take the next event if one is ready, without waiting
    pub fn try_get(&mut self) -> Option<Arc<T>> {
        self.rx.try_recv().ok()
    }

    /// Subscriber this queue belongs to
    pub fn subscriber(&self) -> &SubscriberId {
        &self.subscriber
    }

    /// Generation stamped on the queue at subscribe time
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl<T> std::fmt::Debug for SubscriberQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberQueue")
            .field("subscriber", &self.subscriber)
            .field("generation", &self.generation)
            .finish()
    }
}
