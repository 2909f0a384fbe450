//! Event payloads and their wire encodings
//!
//! Three payload shapes share one routing path. The registry only ever moves
//! [`EventPayload`] values around; encoding to and from the SSE `data:` line is
//! done here, per variant.
//!
//! | Variant | Protocol | `data:` line |
//! |---------|----------|--------------|
//! | [`ChanneledEvent`] | v1 | JSON object with `data`, `channel`, `tags` |
//! | [`TaggedEvent`] | v2 | JSON object with `payload`, `tags` |
//! | raw bytes | v3 | lowercase hex |

pub mod event;
pub mod protocol;

pub use event::{ChanneledEvent, EventPayload, TaggedEvent};
pub use protocol::Protocol;
