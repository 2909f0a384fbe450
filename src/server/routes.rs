//! HTTP routes
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/v1/publish` | Publish a JSON event naming its own channel |
//! | `GET` | `/v1/subscribe` | SSE stream of v1 events |
//! | `POST` | `/v2/publish?channels=..` | Publish a tagged JSON event |
//! | `GET` | `/v2/subscribe` | SSE stream of v2 events |
//! | `POST` | `/v3/publish?channel=..` | Publish raw bytes |
//! | `GET` | `/v3/subscribe` | SSE stream of hex-encoded v3 events |
//! | `GET` | `/health` | Liveness and counters |
//!
//! Subscribe endpoints take channels as repeated `channels` query parameters.

use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, RawQuery, State};
use axum::http::StatusCode;
use axum::response::sse::{KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::payload::protocol::SUBSCRIBE_CHANNEL_PARAM;
use crate::payload::{ChanneledEvent, EventPayload, Protocol, TaggedEvent};
use crate::stats::StatsSnapshot;

use super::query::repeated_param;
use super::state::AppState;
use super::stream::event_stream;

/// Acknowledgement body for structured publishes
#[derive(Debug, Serialize)]
struct Ack {
    result: bool,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    message: &'static str,
    subscribers: usize,
    stats: StatsSnapshot,
}

/// Build the relay router with all routes
pub fn build_router(state: AppState) -> Router {
    let v1 = Router::new()
        .route("/publish", post(publish_v1))
        .route("/subscribe", get(subscribe_v1));
    let v2 = Router::new()
        .route("/publish", post(publish_v2))
        .route("/subscribe", get(subscribe_v2));
    let v3 = Router::new()
        .route("/publish", post(publish_v3))
        .route("/subscribe", get(subscribe_v3));

    let cors_enabled = state.config().cors_enabled;

    let router = Router::new()
        .nest(Protocol::V1.path_prefix(), v1)
        .nest(Protocol::V2.path_prefix(), v2)
        .nest(Protocol::V3.path_prefix(), v3)
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if cors_enabled {
        router.layer(CorsLayer::very_permissive())
    } else {
        router
    }
}

/// `POST /v1/publish`: the channel comes from the payload
async fn publish_v1(State(state): State<AppState>, Json(event): Json<ChanneledEvent>) -> Json<Ack> {
    let channels = vec![event.channel.clone()];
    state.publish_in_background(Protocol::V1, channels, event.into());

    Json(Ack { result: true })
}

/// `POST /v2/publish?channels=..`
async fn publish_v2(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    Json(event): Json<TaggedEvent>,
) -> Json<Ack> {
    let channels = channels_for_publish(Protocol::V2, query.as_deref());
    state.publish_in_background(Protocol::V2, channels, event.into());

    Json(Ack { result: true })
}

/// `POST /v3/publish?channel=..`: the body is forwarded untouched
async fn publish_v3(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> StatusCode {
    let channels = channels_for_publish(Protocol::V3, query.as_deref());
    state.publish_in_background(Protocol::V3, channels, EventPayload::Raw(body));

    StatusCode::OK
}

fn channels_for_publish(protocol: Protocol, query: Option<&str>) -> Vec<String> {
    match protocol.publish_channel_param() {
        Some(param) => repeated_param(query, param),
        None => Vec::new(),
    }
}

async fn subscribe_v1(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    RawQuery(query): RawQuery,
) -> Response {
    open_stream(state, Protocol::V1, peer, query.as_deref())
}

async fn subscribe_v2(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    RawQuery(query): RawQuery,
) -> Response {
    open_stream(state, Protocol::V2, peer, query.as_deref())
}

async fn subscribe_v3(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    RawQuery(query): RawQuery,
) -> Response {
    open_stream(state, Protocol::V3, peer, query.as_deref())
}

/// Register the subscription before the response is returned, so events
/// published after the response headers arrive are never missed
fn open_stream(state: AppState, protocol: Protocol, peer: SocketAddr, query: Option<&str>) -> Response {
    let channels = repeated_param(query, SUBSCRIBE_CHANNEL_PARAM);
    let subscriber = state.next_subscriber_id(peer);

    match state.registry(protocol).attach(subscriber.clone(), &channels) {
        Ok(subscription) => {
            tracing::info!(
                protocol = %protocol,
                subscriber = %subscriber,
                channels = ?channels,
                "Event stream opened"
            );

            Sse::new(event_stream(subscription))
                .keep_alive(KeepAlive::new().interval(state.config().keep_alive_interval))
                .into_response()
        }
        Err(e) => {
            tracing::warn!(
                protocol = %protocol,
                subscriber = %subscriber,
                error = %e,
                "Event stream refused"
            );
            (StatusCode::CONFLICT, e.to_string()).into_response()
        }
    }
}

/// `GET /health`
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "Yo, I am alive",
        subscribers: state.subscriber_count(),
        stats: state.stats(),
    })
}
