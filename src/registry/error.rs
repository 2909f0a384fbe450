//! Registry error types

use super::key::SubscriberId;

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Identity already has an active subscription and the registry rejects duplicates
    #[error("Subscriber already has an active subscription: {0}")]
    AlreadySubscribed(SubscriberId),
}
