//! Subscriber identity and composite subscription keys
//!
//! A subscription relationship is addressed by the pair (channel, subscriber).
//! The pair is kept as a struct so the channel can always be recovered from the
//! key without knowing anything about the shape of the identity.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

/// Identity of one logical subscriber for the lifetime of one subscription
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(Arc<str>);

impl SubscriberId {
    /// Create an identity from any string
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// Derive an identity from a connection endpoint and a request sequence number
    ///
    /// The sequence number keeps two subscribe requests arriving over the same
    /// keep-alive connection from sharing an identity.
    pub fn from_peer(peer: SocketAddr, seq: u64) -> Self {
        Self::new(format!("{}#{}", peer, seq))
    }

    /// Borrow the identity as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubscriberId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SubscriberId {
    fn from(id: String) -> Self {
        Self(Arc::from(id))
    }
}

/// Composite key for one (channel, subscriber) relationship
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionKey {
    /// Channel name
    pub channel: Arc<str>,
    /// Subscriber joined to the channel
    pub subscriber: SubscriberId,
}

impl SubscriptionKey {
    /// Create a new subscription key
    pub fn new(channel: impl AsRef<str>, subscriber: SubscriberId) -> Self {
        Self {
            channel: Arc::from(channel.as_ref()),
            subscriber,
        }
    }

    /// Channel half of the key
    pub fn channel(&self) -> &str {
        &self.channel
    }
}

impl fmt::Display for SubscriptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.subscriber, self.channel)
    }
}
