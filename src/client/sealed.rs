//! Encrypted v3 client
//!
//! Seals raw payloads with a [`TransportCodec`] before publishing and opens
//! them after receipt. The relay itself only ever sees ciphertext.

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;

use crate::codec::{SharedKey, TransportCodec};
use crate::error::Result;
use crate::payload::{EventPayload, Protocol};

use super::remote::RelayClient;

/// v3 client that encrypts with a pre-shared key
#[derive(Debug, Clone)]
pub struct SealedClient {
    client: RelayClient,
    codec: TransportCodec,
}

impl SealedClient {
    /// Wrap a relay client with a shared key
    pub fn new(client: RelayClient, key: SharedKey) -> Self {
        Self {
            client,
            codec: TransportCodec::new(key),
        }
    }

    /// Underlying relay client
    pub fn client(&self) -> &RelayClient {
        &self.client
    }

    /// Seal and publish raw bytes
    ///
    /// A sealing failure is logged and reported as `false`.
    pub async fn publish<I, S>(&self, channels: I, plaintext: &[u8]) -> Result<bool>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let sealed = match self.codec.seal(plaintext) {
            Ok(sealed) => sealed,
            Err(e) => {
                tracing::error!(error = %e, "Failed to seal event");
                return Ok(false);
            }
        };

        self.client
            .publish(channels, &EventPayload::Raw(sealed))
            .await
    }

    /// Subscribe and yield opened plaintexts
    ///
    /// Events that fail to open (wrong key, corruption) are logged and dropped.
    pub async fn subscribe<I, S>(&self, channels: I) -> Result<BoxStream<'static, Bytes>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let codec = self.codec.clone();
        let events = self.client.subscribe(Protocol::V3, channels).await?;

        let opened = events.filter_map(move |payload| {
            let opened = match payload {
                EventPayload::Raw(sealed) => match codec.open(&sealed) {
                    Ok(plaintext) => Some(plaintext),
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to open event");
                        None
                    }
                },
                _ => None,
            };
            futures::future::ready(opened)
        });

        Ok(opened.boxed())
    }
}
