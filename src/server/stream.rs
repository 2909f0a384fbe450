//! SSE streaming adapter
//!
//! Bridges a registry [`Subscription`] onto a Server-Sent-Events body. The
//! stream owns the subscription, so when the client disconnects and the body
//! is dropped, the subscription guard unregisters it.

use std::convert::Infallible;

use axum::response::sse::Event;
use futures::Stream;

use crate::payload::EventPayload;
use crate::registry::Subscription;

/// Turn a subscription into a stream of SSE events
///
/// Each payload becomes one `data:` line. A payload that fails to encode is
/// logged and skipped; the stream keeps going.
pub fn event_stream(
    subscription: Subscription<EventPayload>,
) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static {
    futures::stream::unfold(subscription, |mut subscription| async move {
        loop {
            let payload = subscription.recv().await?;

            match payload.encode_data() {
                Ok(data) => return Some((Ok(Event::default().data(data)), subscription)),
                Err(e) => {
                    tracing::warn!(
                        subscriber = %subscription.subscriber(),
                        error = %e,
                        "Dropping event that failed to encode"
                    );
                }
            }
        }
    })
}
