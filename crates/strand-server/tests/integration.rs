//! End-to-end tests over a real listener: open a stream, drive the
//! message endpoint, observe echoed frames, disconnect, and verify the
//! session is gone.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use eventsource_stream::Eventsource;
use futures::StreamExt;

use strand_auth::AllowAll;
use strand_core::{Frame, SessionId};
use strand_server::{ServerConfig, StrandServer};
use strand_transport::{ConsumerError, MessageConsumer, SessionRegistry};

/// Echoes every payload back down the session's stream.
struct EchoConsumer {
    registry: Arc<SessionRegistry>,
}

#[async_trait::async_trait]
impl MessageConsumer for EchoConsumer {
    async fn on_message(
        &self,
        session: &SessionId,
        payload: serde_json::Value,
    ) -> Result<(), ConsumerError> {
        let handle = self
            .registry
            .lookup(session)
            .ok_or_else(|| ConsumerError::new("session gone"))?;
        let frame = Frame::json(&payload).map_err(|e| ConsumerError::new(e.to_string()))?;
        handle
            .send(frame)
            .await
            .map_err(|e| ConsumerError::new(e.to_string()))
    }
}

struct TestServer {
    addr: SocketAddr,
    registry: Arc<SessionRegistry>,
    shutdown: Arc<strand_server::ShutdownCoordinator>,
    task: tokio::task::JoinHandle<std::io::Result<()>>,
}

async fn spawn_server() -> TestServer {
    let registry = Arc::new(SessionRegistry::new());
    let consumer = Arc::new(EchoConsumer {
        registry: registry.clone(),
    });
    let server = StrandServer::new(
        ServerConfig::default(),
        registry.clone(),
        Arc::new(AllowAll),
        consumer,
    );
    let shutdown = server.shutdown().clone();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let task = tokio::spawn(server.serve(listener));
    TestServer {
        addr,
        registry,
        shutdown,
        task,
    }
}

async fn wait_for(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn ping_roundtrip_then_close_yields_unknown_session() {
    let server = spawn_server().await;
    let client = reqwest::Client::new();

    // Open the stream; the first event names the message endpoint.
    let resp = client
        .get(format!("http://{}/api/stream", server.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let mut events = resp.bytes_stream().eventsource();

    let first = events.next().await.unwrap().unwrap();
    assert_eq!(first.event, "endpoint");
    assert!(first.data.contains("sessionId="), "got: {}", first.data);
    let message_url = format!("http://{}{}", server.addr, first.data);
    wait_for(|| server.registry.len() == 1).await;

    // Deliver a payload; the echo consumer pushes it back down the stream.
    let resp = client
        .post(&message_url)
        .json(&serde_json::json!({"payload": "ping"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    let echoed = events.next().await.unwrap().unwrap();
    assert_eq!(echoed.event, "message");
    let parsed: serde_json::Value = serde_json::from_str(&echoed.data).unwrap();
    assert_eq!(parsed["payload"], "ping");

    // Disconnect: the registry entry must go away.
    drop(events);
    wait_for(|| server.registry.is_empty()).await;

    // The same session ID is now unknown.
    let resp = client
        .post(&message_url)
        .json(&serde_json::json!({"payload": "ping"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn concurrent_messages_to_one_session_all_arrive() {
    let server = spawn_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("http://{}/api/stream", server.addr))
        .send()
        .await
        .unwrap();
    let mut events = resp.bytes_stream().eventsource();
    let first = events.next().await.unwrap().unwrap();
    let message_url = format!("http://{}{}", server.addr, first.data);

    let (a, b) = tokio::join!(
        client
            .post(&message_url)
            .json(&serde_json::json!({"n": 1}))
            .send(),
        client
            .post(&message_url)
            .json(&serde_json::json!({"n": 2}))
            .send(),
    );
    assert_eq!(a.unwrap().status(), reqwest::StatusCode::OK);
    assert_eq!(b.unwrap().status(), reqwest::StatusCode::OK);

    // Both payloads come back down the one stream, in some order.
    let mut seen = Vec::new();
    for _ in 0..2 {
        let event = events.next().await.unwrap().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        seen.push(parsed["n"].as_i64().unwrap());
    }
    seen.sort_unstable();
    assert_eq!(seen, vec![1, 2]);
}

#[tokio::test]
async fn message_for_never_issued_session_is_not_found() {
    let server = spawn_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!(
            "http://{}/api/messages?sessionId=never-issued",
            server.addr
        ))
        .json(&serde_json::json!({"payload": "ping"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
    assert!(server.registry.is_empty());
}

#[tokio::test]
async fn shutdown_closes_live_sessions_and_stops_the_server() {
    let server = spawn_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("http://{}/api/stream", server.addr))
        .send()
        .await
        .unwrap();
    let mut events = resp.bytes_stream().eventsource();
    let _first = events.next().await.unwrap().unwrap();
    wait_for(|| server.registry.len() == 1).await;

    server.shutdown.shutdown();
    wait_for(|| server.registry.is_empty()).await;

    // The stream ends rather than yielding further application events.
    let next = events.next().await;
    assert!(
        !matches!(next, Some(Ok(_))),
        "stream should end after shutdown"
    );

    server.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn health_reports_live_session_count() {
    let server = spawn_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("http://{}/api/stream", server.addr))
        .send()
        .await
        .unwrap();
    let mut events = resp.bytes_stream().eventsource();
    let _first = events.next().await.unwrap().unwrap();
    wait_for(|| server.registry.len() == 1).await;

    let health: serde_json::Value = client
        .get(format!("http://{}/health", server.addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["active_sessions"], 1);
}
