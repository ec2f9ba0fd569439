//! Live sessions over a real socket.

mod common;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message;

use gg_domain::content::Part;
use gg_gateway::server::build_app;
use gg_gateway::state::AppState;

use common::{state_with, test_config, upstream_failure, MockClient, Step};

type Ws = tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn spawn(state: AppState) -> SocketAddr {
    let app = build_app(state).unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr) -> Ws {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/api/live"))
        .await
        .unwrap();
    ws
}

async fn send(ws: &mut Ws, msg: Value) {
    ws.send(Message::Text(msg.to_string())).await.unwrap();
}

/// Next JSON text frame, skipping control frames.
async fn recv(ws: &mut Ws) -> Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .unwrap();
        match frame {
            Message::Text(text) => return serde_json::from_str(&text).unwrap(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame {other:?}"),
        }
    }
}

#[tokio::test]
async fn full_session_round_trip() {
    let client = MockClient::scripted(vec![Step::reply("This is a lab report showing normal values.")]);
    let addr = spawn(state_with(client.clone(), test_config())).await;
    let mut ws = connect(addr).await;

    send(&mut ws, serde_json::json!({"type": "start_session"})).await;
    let started = recv(&mut ws).await;
    assert_eq!(started["type"], "session_started");
    assert!(started["sessionId"].as_str().is_some_and(|id| !id.is_empty()));

    send(
        &mut ws,
        serde_json::json!({"type": "upload_image", "data": "AQIDBAU=", "mimeType": "image/png"}),
    )
    .await;
    let received = recv(&mut ws).await;
    assert_eq!(received["type"], "image_received");
    assert_eq!(received["mimeType"], "image/png");
    assert_eq!(received["bytes"], 5);

    send(&mut ws, serde_json::json!({"type": "text_message", "text": "What is this?"})).await;
    let reply = recv(&mut ws).await;
    assert_eq!(reply["type"], "response");
    assert_eq!(reply["text"], "This is a lab report showing normal values.");
    assert!(reply["timestamp"].is_string());

    send(&mut ws, serde_json::json!({"type": "end_session"})).await;
    let ended = recv(&mut ws).await;
    assert_eq!(ended["type"], "session_ended");

    // The server closes the socket after ending the session.
    let next = tokio::time::timeout(Duration::from_secs(5), ws.next()).await.unwrap();
    assert!(matches!(next, None | Some(Ok(Message::Close(_))) | Some(Err(_))));

    let calls = client.calls();
    assert_eq!(calls.len(), 1);
    let image: Vec<_> = calls[0]
        .parts()
        .filter_map(|p| match p {
            Part::InlineData { data, .. } => Some(data.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(image, vec![vec![1u8, 2, 3, 4, 5]]);
}

#[tokio::test]
async fn errors_do_not_end_the_session() {
    let client = MockClient::scripted(vec![Step::fail(upstream_failure())]);
    let addr = spawn(state_with(client.clone(), test_config())).await;
    let mut ws = connect(addr).await;

    ws.send(Message::Text("not json".into())).await.unwrap();
    let err = recv(&mut ws).await;
    assert_eq!(err["type"], "error");
    assert_eq!(err["code"], "protocol");

    ws.send(Message::Binary(vec![1, 2, 3])).await.unwrap();
    assert_eq!(recv(&mut ws).await["code"], "protocol");

    send(&mut ws, serde_json::json!({"type": "text_message", "text": ""})).await;
    assert_eq!(recv(&mut ws).await["code"], "validation");

    send(&mut ws, serde_json::json!({"type": "text_message", "text": "hello?"})).await;
    assert_eq!(recv(&mut ws).await["code"], "upstream");

    // Unknown types get no reply; the next message is answered normally.
    send(&mut ws, serde_json::json!({"type": "set_voice", "voice": "alto"})).await;
    send(&mut ws, serde_json::json!({"type": "text_message", "text": "hello again"})).await;
    let reply = recv(&mut ws).await;
    assert_eq!(reply["type"], "response");
    assert_eq!(reply["text"], "reply 2");
}

#[tokio::test]
async fn connections_do_not_share_state() {
    let client = MockClient::new();
    let addr = spawn(state_with(client.clone(), test_config())).await;

    let mut first = connect(addr).await;
    send(
        &mut first,
        serde_json::json!({"type": "upload_image", "data": "AQID", "mimeType": "image/png"}),
    )
    .await;
    assert_eq!(recv(&mut first).await["type"], "image_received");

    let mut second = connect(addr).await;
    send(&mut second, serde_json::json!({"type": "text_message", "text": "any image?"})).await;
    assert_eq!(recv(&mut second).await["type"], "response");

    let calls = client.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].parts().all(|p| p.mime_type().is_none()));
}

#[tokio::test]
async fn live_without_provider_is_refused() {
    let addr = spawn(AppState::new(Arc::new(test_config()), None)).await;
    let result = tokio_tungstenite::connect_async(format!("ws://{addr}/api/live")).await;
    assert!(result.is_err());
}
