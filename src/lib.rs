//! # channel-relay
//!
//! In-memory channel pub/sub relay. Publishers post events over HTTP;
//! subscribers hold a Server-Sent-Events stream open and receive every event
//! published to any channel they named.
//!
//! ## Modules
//!
//! - [`registry`]: the generic channel registry, subscriber queues and the
//!   scoped [`Subscription`] guard
//! - [`payload`]: the event variants for each protocol version
//! - [`codec`]: AES-CBC sealing for end-to-end encrypted raw payloads
//! - [`server`]: the axum HTTP server
//! - [`client`]: a reqwest client for a running relay
//! - [`stats`]: atomic counters reported by `/health`
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use channel_relay::EventRegistry;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let registry = Arc::new(EventRegistry::<String>::new());
//! let mut subscription = registry.attach("alice", ["news", "sport"]).unwrap();
//!
//! registry.publish(["news"], "headline".to_string());
//!
//! let event = subscription.recv().await.unwrap();
//! assert_eq!(event.as_str(), "headline");
//! # }
//! ```

pub mod client;
pub mod codec;
pub mod error;
pub mod payload;
pub mod registry;
pub mod server;
pub mod stats;

pub use client::{ClientConfig, RelayClient, SealedClient};
pub use codec::{SharedKey, TransportCodec};
pub use error::{Error, Result};
pub use payload::{ChanneledEvent, EventPayload, Protocol, TaggedEvent};
pub use registry::{DuplicatePolicy, EventRegistry, RegistryConfig, SubscriberId, Subscription};
pub use server::{RelayConfig, RelayServer};
