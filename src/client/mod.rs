//! Relay client implementation
//!
//! Provides client-side access to a running relay for:
//! - Publishing events on any protocol version
//! - Consuming subscribe streams as typed events
//! - Sealing v3 payloads end to end with a pre-shared key

pub mod config;
pub mod lines;
pub mod remote;
pub mod sealed;

pub use config::ClientConfig;
pub use lines::SseDecoder;
pub use remote::RelayClient;
pub use sealed::SealedClient;
