//! Protocol versions

use std::fmt;

/// Query parameter naming channels on a subscribe request, for every version
pub const SUBSCRIBE_CHANNEL_PARAM: &str = "channels";

/// Wire protocol version
///
/// Each version pairs one payload variant with its own endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// Channel carried inside the JSON payload
    V1,
    /// JSON payload with tags, channels in the query string
    V2,
    /// Opaque bytes, hex-encoded on the stream
    V3,
}

impl Protocol {
    /// All supported versions
    pub const ALL: [Protocol; 3] = [Protocol::V1, Protocol::V2, Protocol::V3];

    /// URL prefix the version is mounted under
    pub fn path_prefix(&self) -> &'static str {
        match self {
            Protocol::V1 => "/v1",
            Protocol::V2 => "/v2",
            Protocol::V3 => "/v3",
        }
    }

    /// Query parameter naming target channels on publish
    ///
    /// `None` for v1, where the payload names its channel.
    pub fn publish_channel_param(&self) -> Option<&'static str> {
        match self {
            Protocol::V1 => None,
            Protocol::V2 => Some("channels"),
            Protocol::V3 => Some("channel"),
        }
    }

    /// Whether events of this version travel as raw bytes
    pub fn is_binary(&self) -> bool {
        matches!(self, Protocol::V3)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::V1 => f.write_str("v1"),
            Protocol::V2 => f.write_str("v2"),
            Protocol::V3 => f.write_str("v3"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_channel_param() {
        assert_eq!(Protocol::V1.publish_channel_param(), None);
        assert_eq!(Protocol::V2.publish_channel_param(), Some("channels"));
        assert_eq!(Protocol::V3.publish_channel_param(), Some("channel"));
    }

    #[test]
    fn test_display_matches_prefix() {
        for protocol in Protocol::ALL {
            assert_eq!(format!("/{}", protocol), protocol.path_prefix());
        }
    }
}
