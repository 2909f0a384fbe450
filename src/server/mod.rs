//! HTTP relay server
//!
//! Serves publish and SSE subscribe endpoints for each protocol version on top
//! of one [`EventRegistry`](crate::registry::EventRegistry) per version.
//!
//! # Example
//!
//! ```no_run
//! use channel_relay::server::{RelayConfig, RelayServer};
//!
//! #[tokio::main]
//! async fn main() -> channel_relay::Result<()> {
//!     let config = RelayConfig::with_addr("127.0.0.1:8080".parse().unwrap());
//!     RelayServer::new(config).run().await
//! }
//! ```

pub mod config;
pub mod listener;
pub mod query;
pub mod routes;
pub mod state;
pub mod stream;

pub use config::RelayConfig;
pub use listener::RelayServer;
pub use routes::build_router;
pub use state::{AppState, PayloadRegistry};
