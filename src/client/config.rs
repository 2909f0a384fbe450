//! Client configuration

use std::time::Duration;

/// Default timeout applied to each publish request
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(60);

/// Relay client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server root URL, without a trailing slash
    pub base_url: String,

    /// Timeout for a whole publish request; subscribe streams are never timed out
    pub publish_timeout: Option<Duration>,
}

impl ClientConfig {
    /// Create a config for a server root such as `http://127.0.0.1:8080`
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            base_url,
            publish_timeout: Some(DEFAULT_PUBLISH_TIMEOUT),
        }
    }

    /// Set the publish timeout
    pub fn publish_timeout(mut self, timeout: Duration) -> Self {
        self.publish_timeout = Some(timeout);
        self
    }

    /// Let publish requests wait indefinitely
    pub fn no_publish_timeout(mut self) -> Self {
        self.publish_timeout = None;
        self
    }
}
