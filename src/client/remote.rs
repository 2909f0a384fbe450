//! HTTP relay client
//!
//! Publishes events and consumes SSE subscribe streams of a remote relay.

use std::collections::VecDeque;

use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;

use crate::error::{Error, Result};
use crate::payload::protocol::SUBSCRIBE_CHANNEL_PARAM;
use crate::payload::{EventPayload, Protocol};

use super::config::ClientConfig;
use super::lines::SseDecoder;

/// Client for a remote relay server
///
/// # Example
/// ```no_run
/// use channel_relay::client::RelayClient;
/// use channel_relay::payload::{EventPayload, Protocol, TaggedEvent};
/// use futures::StreamExt;
///
/// # async fn example() -> channel_relay::Result<()> {
/// let client = RelayClient::new("http://127.0.0.1:8080")?;
///
/// let mut events = client.subscribe(Protocol::V2, ["alerts"]).await?;
///
/// let event = TaggedEvent::new(serde_json::json!({"level": "warn"}));
/// client.publish(["alerts"], &EventPayload::from(event)).await?;
///
/// while let Some(event) = events.next().await {
///     println!("{:?}", event);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RelayClient {
    config: ClientConfig,
    http: reqwest::Client,
}

impl RelayClient {
    /// Create a client for a server root URL with default settings
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_config(ClientConfig::new(base_url))
    }

    /// Create a client from a full configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self { config, http })
    }

    /// Client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, protocol: Protocol, endpoint: &str) -> String {
        format!(
            "{}{}/{}",
            self.config.base_url,
            protocol.path_prefix(),
            endpoint
        )
    }

    /// Publish an event to a set of channels
    ///
    /// The protocol version follows the payload variant. v1 payloads carry
    /// their own channel, so `channels` is ignored for them. Returns `true`
    /// iff the server answered 200.
    pub async fn publish<I, S>(&self, channels: I, payload: &EventPayload) -> Result<bool>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let protocol = payload.protocol();
        let url = self.url(protocol, "publish");

        let query: Vec<(&str, String)> = match protocol.publish_channel_param() {
            Some(param) => channels
                .into_iter()
                .map(|c| (param, c.as_ref().to_string()))
                .collect(),
            None => Vec::new(),
        };

        let content_type = if protocol.is_binary() {
            "application/octet-stream"
        } else {
            "application/json"
        };

        let mut request = self
            .http
            .post(&url)
            .query(&query)
            .header(CONTENT_TYPE, content_type)
            .body(payload.encode_body()?);

        if let Some(timeout) = self.config.publish_timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let accepted = response.status() == StatusCode::OK;

        if !accepted {
            tracing::warn!(
                url = %url,
                status = %response.status(),
                "Publish not acknowledged"
            );
        }

        Ok(accepted)
    }

    /// Open a subscribe stream
    ///
    /// Resolves once the server has accepted the subscription, so anything
    /// published afterwards is delivered. Lines that fail to decode are logged
    /// and skipped. The stream ends when the connection closes.
    pub async fn subscribe<I, S>(
        &self,
        protocol: Protocol,
        channels: I,
    ) -> Result<BoxStream<'static, EventPayload>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let url = self.url(protocol, "subscribe");
        let query: Vec<(&str, String)> = channels
            .into_iter()
            .map(|c| (SUBSCRIBE_CHANNEL_PARAM, c.as_ref().to_string()))
            .collect();

        let response = self.http.get(&url).query(&query).send().await?;
        if !response.status().is_success() {
            return Err(Error::Status {
                status: response.status().as_u16(),
                url,
            });
        }

        tracing::debug!(url = %url, protocol = %protocol, "Subscribed");

        let body = Box::pin(response.bytes_stream());
        let state = (body, SseDecoder::new(), VecDeque::<String>::new());

        let events = futures::stream::unfold(state, move |(mut body, mut decoder, mut pending)| async move {
            loop {
                if let Some(data) = pending.pop_front() {
                    match EventPayload::decode_data(protocol, &data) {
                        Ok(payload) => return Some((payload, (body, decoder, pending))),
                        Err(e) => {
                            tracing::error!(protocol = %protocol, error = %e, "Failed to decode event");
                            continue;
                        }
                    }
                }

                match body.next().await {
                    Some(Ok(chunk)) => pending.extend(decoder.push(&chunk)),
                    Some(Err(e)) => {
                        tracing::error!(protocol = %protocol, error = %e, "Event stream failed");
                        return None;
                    }
                    None => return None,
                }
            }
        });

        Ok(events.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let client = RelayClient::new("http://relay:8080/").unwrap();

        assert_eq!(
            client.url(Protocol::V1, "publish"),
            "http://relay:8080/v1/publish"
        );
        assert_eq!(
            client.url(Protocol::V3, "subscribe"),
            "http://relay:8080/v3/subscribe"
        );
    }
}
