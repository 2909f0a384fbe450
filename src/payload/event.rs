//! Payload variants

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

use super::protocol::Protocol;

fn empty_object() -> Value {
    Value::Object(Default::default())
}

/// Structured event with tags; channels are chosen at publish time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedEvent {
    /// Opaque event body
    #[serde(default = "empty_object")]
    pub payload: Value,
    /// Free-form labels, in publisher order
    #[serde(default)]
    pub tags: Vec<String>,
}

impl TaggedEvent {
    /// Create an event with no tags
    pub fn new(payload: Value) -> Self {
        Self {
            payload,
            tags: Vec::new(),
        }
    }

    /// Attach tags
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Structured event that names its own channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChanneledEvent {
    /// Opaque event body
    #[serde(default = "empty_object")]
    pub data: Value,
    /// Channel the event is published to
    pub channel: String,
    /// Free-form labels, in publisher order
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ChanneledEvent {
    /// Create an event for a channel with no tags
    pub fn new(channel: impl Into<String>, data: Value) -> Self {
        Self {
            data,
            channel: channel.into(),
            tags: Vec::new(),
        }
    }

    /// Attach tags
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Any event the relay can route
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    /// v1 event
    Channeled(ChanneledEvent),
    /// v2 event
    Tagged(TaggedEvent),
    /// v3 event, possibly sealed by the transport codec
    Raw(Bytes),
}

impl EventPayload {
    /// Protocol version this payload belongs to
    pub fn protocol(&self) -> Protocol {
        match self {
            EventPayload::Channeled(_) => Protocol::V1,
            EventPayload::Tagged(_) => Protocol::V2,
            EventPayload::Raw(_) => Protocol::V3,
        }
    }

    /// Channel named by the payload itself, if any
    pub fn channel(&self) -> Option<&str> {
        match self {
            EventPayload::Channeled(event) => Some(&event.channel),
            EventPayload::Tagged(_) | EventPayload::Raw(_) => None,
        }
    }

    /// Encode as the content of an SSE `data:` line
    pub fn encode_data(&self) -> Result<String> {
        match self {
            EventPayload::Channeled(event) => Ok(serde_json::to_string(event)?),
            EventPayload::Tagged(event) => Ok(serde_json::to_string(event)?),
            EventPayload::Raw(bytes) => Ok(hex::encode(bytes)),
        }
    }

    /// Decode the content of an SSE `data:` line
    pub fn decode_data(protocol: Protocol, data: &str) -> Result<Self> {
        match protocol {
            Protocol::V1 => Ok(EventPayload::Channeled(serde_json::from_str(data)?)),
            Protocol::V2 => Ok(EventPayload::Tagged(serde_json::from_str(data)?)),
            Protocol::V3 => Ok(EventPayload::Raw(Bytes::from(hex::decode(data.trim())?))),
        }
    }

    /// Encode as a publish request body
    pub fn encode_body(&self) -> Result<Bytes> {
        match self {
            EventPayload::Channeled(event) => Ok(Bytes::from(serde_json::to_vec(event)?)),
            EventPayload::Tagged(event) => Ok(Bytes::from(serde_json::to_vec(event)?)),
            EventPayload::Raw(bytes) => Ok(bytes.clone()),
        }
    }
}

impl From<ChanneledEvent> for EventPayload {
    fn from(event: ChanneledEvent) -> Self {
        EventPayload::Channeled(event)
    }
}

impl From<TaggedEvent> for EventPayload {
    fn from(event: TaggedEvent) -> Self {
        EventPayload::Tagged(event)
    }
}

impl From<Bytes> for EventPayload {
    fn from(bytes: Bytes) -> Self {
        EventPayload::Raw(bytes)
    }
}

impl From<Vec<u8>> for EventPayload {
    fn from(bytes: Vec<u8>) -> Self {
        EventPayload::Raw(Bytes::from(bytes))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::Error;

    #[test]
    fn test_tagged_wire_shape() {
        let event = TaggedEvent::new(json!({"message": "hello"})).with_tags(["web", "error"]);

        let data = EventPayload::from(event).encode_data().unwrap();
        let value: Value = serde_json::from_str(&data).unwrap();

        assert_eq!(
            value,
            json!({"payload": {"message": "hello"}, "tags": ["web", "error"]})
        );
    }

    #[test]
    fn test_channeled_wire_shape() {
        let event = ChanneledEvent::new("logs", json!({"message": "test"}));

        let data = EventPayload::from(event).encode_data().unwrap();
        let value: Value = serde_json::from_str(&data).unwrap();

        assert_eq!(
            value,
            json!({"data": {"message": "test"}, "channel": "logs", "tags": []})
        );
    }

    #[test]
    fn test_tagged_defaults() {
        let event: TaggedEvent = serde_json::from_str("{}").unwrap();

        assert_eq!(event.payload, json!({}));
        assert!(event.tags.is_empty());
    }

    #[test]
    fn test_channeled_requires_channel() {
        let result = EventPayload::decode_data(Protocol::V1, r#"{"data": {}}"#);

        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[test]
    fn test_raw_is_hex() {
        let payload = EventPayload::from(vec![0x00, 0xab, 0xff]);

        assert_eq!(payload.encode_data().unwrap(), "00abff");
        assert_eq!(
            EventPayload::decode_data(Protocol::V3, "00abff").unwrap(),
            payload
        );
    }

    #[test]
    fn test_raw_rejects_bad_hex() {
        let result = EventPayload::decode_data(Protocol::V3, "not hex");

        assert!(matches!(result, Err(Error::Hex(_))));
    }

    #[test]
    fn test_decode_follows_protocol() {
        let data = r#"{"payload": 1, "tags": ["a"]}"#;

        let payload = EventPayload::decode_data(Protocol::V2, data).unwrap();

        assert_eq!(payload.protocol(), Protocol::V2);
        assert_eq!(payload.channel(), None);
        assert_eq!(
            payload,
            EventPayload::Tagged(TaggedEvent::new(json!(1)).with_tags(["a"]))
        );
    }

    #[test]
    fn test_channel_of_v1_payload() {
        let payload = EventPayload::from(ChanneledEvent::new("audit", json!(null)));

        assert_eq!(payload.channel(), Some("audit"));
        assert_eq!(payload.protocol(), Protocol::V1);
    }

    #[test]
    fn test_raw_body_is_passthrough() {
        let bytes = Bytes::from_static(b"\x01\x02binary");

        let body = EventPayload::Raw(bytes.clone()).encode_body().unwrap();

        assert_eq!(body, bytes);
    }
}
