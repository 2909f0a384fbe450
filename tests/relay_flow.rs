//! End-to-end relay tests
//!
//! Registry scenario first, then a live server on an ephemeral port driven by
//! the HTTP clients.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use channel_relay::codec::AesVariant;
use channel_relay::{
    ChanneledEvent, EventPayload, EventRegistry, Protocol, RelayClient, RelayConfig, RelayServer,
    SealedClient, SharedKey, SubscriberId, TaggedEvent,
};

#[tokio::test]
async fn test_subscribe_publish_unsubscribe_scenario() {
    let registry = EventRegistry::<&'static str>::new();
    let a = SubscriberId::new("A");

    let mut queue = registry.subscribe(a.clone(), ["x", "y"]).unwrap();
    assert_eq!(registry.channels_of(&a), vec!["x", "y"]);

    assert_eq!(registry.publish(["x"], "E1"), 1);
    assert_eq!(*queue.get().await.unwrap(), "E1");

    assert_eq!(registry.publish(["z"], "E2"), 0);
    assert!(queue.try_get().is_none());

    assert!(registry.unsubscribe(&a));
    assert_eq!(registry.publish(["x"], "E3"), 0);

    assert!(!registry.is_subscribed(&a));
    assert_eq!(registry.subscriber_count(), 0);
    assert_eq!(registry.channel_count(), 0);
    assert!(registry.channel_subscribers("x").is_empty());
}

#[tokio::test]
async fn test_guard_releases_on_task_abort() {
    let registry = Arc::new(EventRegistry::<u32>::new());
    let mut subscription = registry.attach("A", ["x"]).unwrap();

    let task = tokio::spawn(async move { subscription.recv().await });
    tokio::task::yield_now().await;

    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());

    assert_eq!(registry.subscriber_count(), 0);
    assert_eq!(registry.publish(["x"], 1), 0);
}

/// Running server plus the handle that stops it
struct Running {
    base_url: String,
    server: Arc<RelayServer>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl Drop for Running {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn start_server() -> Running {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = Arc::new(RelayServer::new(RelayConfig::with_addr(addr)));
    let (tx, rx) = oneshot::channel::<()>();

    let serving = Arc::clone(&server);
    tokio::spawn(async move {
        serving
            .serve(listener, async {
                let _ = rx.await;
            })
            .await
    });

    Running {
        base_url: format!("http://{}", addr),
        server,
        shutdown: Some(tx),
    }
}

async fn next_within<T>(stream: &mut futures::stream::BoxStream<'static, T>) -> T {
    tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("no event within timeout")
        .expect("stream ended")
}

#[tokio::test]
async fn test_client_round_trip_v1_and_v2() {
    let running = start_server().await;
    let client = RelayClient::new(&running.base_url).unwrap();

    let mut v1 = client.subscribe(Protocol::V1, ["logs"]).await.unwrap();
    let mut v2 = client.subscribe(Protocol::V2, ["alerts"]).await.unwrap();

    let channeled = ChanneledEvent::new("logs", json!({"message": "test"}));
    assert!(client
        .publish(Vec::<String>::new(), &channeled.clone().into())
        .await
        .unwrap());

    let tagged = TaggedEvent::new(json!({"level": "warn"})).with_tags(["web"]);
    assert!(client
        .publish(["alerts"], &tagged.clone().into())
        .await
        .unwrap());

    assert_eq!(next_within(&mut v1).await, EventPayload::Channeled(channeled));
    assert_eq!(next_within(&mut v2).await, EventPayload::Tagged(tagged));
}

#[tokio::test]
async fn test_client_only_receives_subscribed_channels() {
    let running = start_server().await;
    let client = RelayClient::new(&running.base_url).unwrap();

    let mut stream = client.subscribe(Protocol::V3, ["wanted"]).await.unwrap();

    assert!(client
        .publish(["other"], &EventPayload::from(vec![1u8]))
        .await
        .unwrap());
    assert!(client
        .publish(["wanted"], &EventPayload::from(vec![2u8]))
        .await
        .unwrap());

    assert_eq!(
        next_within(&mut stream).await,
        EventPayload::Raw(Bytes::from_static(&[2]))
    );
}

#[tokio::test]
async fn test_sealed_clients_share_key() {
    let running = start_server().await;
    let key = SharedKey::generate(AesVariant::Aes256);

    let sender = SealedClient::new(RelayClient::new(&running.base_url).unwrap(), key.clone());
    let receiver = SealedClient::new(RelayClient::new(&running.base_url).unwrap(), key);
    let eavesdropper = RelayClient::new(&running.base_url).unwrap();

    let mut opened = receiver.subscribe(["secret"]).await.unwrap();
    let mut raw = eavesdropper
        .subscribe(Protocol::V3, ["secret"])
        .await
        .unwrap();

    assert!(sender.publish(["secret"], b"launch codes").await.unwrap());

    assert_eq!(next_within(&mut opened).await, Bytes::from_static(b"launch codes"));

    let EventPayload::Raw(ciphertext) = next_within(&mut raw).await else {
        panic!("expected raw payload");
    };
    assert_ne!(ciphertext.as_ref(), b"launch codes");
    assert_eq!(ciphertext.len(), 16 + 32);
}

#[tokio::test]
async fn test_closed_stream_releases_registration() {
    let running = start_server().await;
    let client = RelayClient::new(&running.base_url).unwrap();
    let state = running.server.state().clone();

    let stream = client.subscribe(Protocol::V2, ["x"]).await.unwrap();
    assert_eq!(state.registry(Protocol::V2).subscriber_count(), 1);

    drop(stream);

    // The server notices the disconnect on its next write; keep publishing
    // until the registration is gone
    let event = EventPayload::from(TaggedEvent::new(json!(null)));
    for _ in 0..200 {
        if state.registry(Protocol::V2).subscriber_count() == 0 {
            break;
        }
        client.publish(["x"], &event).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(state.registry(Protocol::V2).subscriber_count(), 0);
    assert_eq!(state.registry(Protocol::V2).channel_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_acknowledged_publishes_arrive_in_order() {
    let running = start_server().await;
    let client = RelayClient::new(&running.base_url).unwrap();

    let mut stream = client.subscribe(Protocol::V2, ["o"]).await.unwrap();

    for i in 0..300 {
        let event = EventPayload::from(TaggedEvent::new(json!(i)));
        assert!(client.publish(["o"], &event).await.unwrap());
    }

    for i in 0..300 {
        assert_eq!(
            next_within(&mut stream).await,
            EventPayload::from(TaggedEvent::new(json!(i)))
        );
    }
}

#[tokio::test]
async fn test_sealed_subscriber_skips_unopenable_events() {
    let running = start_server().await;
    let key = SharedKey::generate(AesVariant::Aes128);

    let sender = SealedClient::new(RelayClient::new(&running.base_url).unwrap(), key.clone());
    let receiver = SealedClient::new(RelayClient::new(&running.base_url).unwrap(), key);
    let plain = RelayClient::new(&running.base_url).unwrap();

    let mut opened = receiver.subscribe(["c"]).await.unwrap();

    // Too short to hold an IV and a block
    assert!(plain
        .publish(["c"], &EventPayload::from(vec![1u8; 5]))
        .await
        .unwrap());
    // Not a whole number of blocks after the IV
    assert!(plain
        .publish(["c"], &EventPayload::from(vec![7u8; 16 + 20]))
        .await
        .unwrap());
    assert!(sender.publish(["c"], b"good").await.unwrap());

    assert_eq!(next_within(&mut opened).await, Bytes::from_static(b"good"));
}

/// Serve a fixed SSE body on `/v2/subscribe`
async fn start_canned_stream(body: &'static str) -> String {
    use axum::http::header::CONTENT_TYPE;
    use axum::routing::get;

    let router = axum::Router::new().route(
        "/v2/subscribe",
        get(move || async move { ([(CONTENT_TYPE, "text/event-stream")], body) }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await });

    format!("http://{}", addr)
}

#[tokio::test]
async fn test_subscriber_skips_undecodable_lines() {
    let base_url = start_canned_stream(concat!(
        "data: {not json\n\n",
        ": keep-alive\n\n",
        "data: {\"payload\": 1, \"tags\": [\"a\"]}\n\n",
    ))
    .await;
    let client = RelayClient::new(base_url).unwrap();

    let mut stream = client.subscribe(Protocol::V2, ["x"]).await.unwrap();

    assert_eq!(
        next_within(&mut stream).await,
        EventPayload::from(TaggedEvent::new(json!(1)).with_tags(["a"]))
    );
    assert!(stream.next().await.is_none());
}
