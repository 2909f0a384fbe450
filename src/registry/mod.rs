//! Channel registry for pub/sub routing
//!
//! The registry maps channels to subscriber queues and fans published events
//! out to them. It is generic over the event type and never looks inside an
//! event.
//!
//! # Architecture
//!
//! ```text
//!                        Arc<EventRegistry<T>>
//!              ┌──────────────────────────────────────┐
//!              │ RwLock<Indices {                     │
//!              │   subscribers:       key -> queue    │
//!              │   ids_by_subscriber: id  -> {keys}   │
//!              │   ids_by_channel:    ch  -> {keys}   │
//!              │ }>                                   │
//!              └──────────────────┬───────────────────┘
//!                                 │
//!         ┌───────────────────────┼───────────────────────┐
//!         │                       │                       │
//!         ▼                       ▼                       ▼
//!    [Publisher]            [Subscription]          [Subscription]
//!    publish(chs, e)        queue.get()             queue.get()
//!         │                       │                       │
//!         └──► Arc<T> per queue ──┴──► SSE writer ──► HTTP
//! ```
//!
//! # Zero-Copy Design
//!
//! `publish` wraps the event in a single `Arc`. Every matching queue receives
//! a clone of that `Arc`, so all subscribers see the same allocation.

pub mod config;
pub mod error;
pub mod key;
pub mod queue;
pub mod store;
pub mod subscription;

pub use config::{DuplicatePolicy, RegistryConfig};
pub use error::RegistryError;
pub use key::{SubscriberId, SubscriptionKey};
pub use queue::{QueueHandle, SubscriberQueue};
pub use store::EventRegistry;
pub use subscription::Subscription;
