//! Registry configuration

/// What to do when an identity subscribes while it still has an active queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Tear down the existing registration, then register the new queue
    #[default]
    Replace,
    /// Refuse the new subscription and keep the existing one
    Reject,
}

/// Configuration for an [`EventRegistry`](super::EventRegistry)
#[derive(Debug, Clone, Default)]
pub struct RegistryConfig {
    /// Policy for repeated subscribe calls under one identity
    pub duplicate_policy: DuplicatePolicy,
}

impl RegistryConfig {
    /// Set the duplicate subscription policy
    pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }
}
