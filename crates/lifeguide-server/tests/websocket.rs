use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use lifeguide_api::AppState;
use lifeguide_server::config::ServerConfig;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_server() -> (SocketAddr, AppState) {
    let config = ServerConfig::from_lookup(|_| None).unwrap();
    let state = lifeguide_server::build_state(&config).unwrap();
    let app = lifeguide_server::app(state.clone(), None);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

async fn connect(addr: SocketAddr) -> Client {
    let (ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    ws
}

/// Next text frame as JSON, skipping control frames.
async fn next_json(ws: &mut Client) -> Value {
    loop {
        let msg = tokio::time::timeout(std::time::Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn send_json(ws: &mut Client, value: Value) {
    ws.send(Message::text(value.to_string())).await.unwrap();
}

#[tokio::test]
async fn connect_then_chat() {
    let (addr, state) = spawn_server().await;
    let mut ws = connect(addr).await;

    let hello = next_json(&mut ws).await;
    assert_eq!(hello, json!({ "type": "connected", "message": "WebSocket connection established" }));
    assert_eq!(state.dispatcher.client_count().await, 1);

    send_json(&mut ws, json!({ "type": "chat", "message": "I need help with my resume", "mode": "career" })).await;
    let reply = next_json(&mut ws).await;
    assert_eq!(reply["type"], "chat_response");
    assert_eq!(reply["metadata"]["mode"], "career");
    let conversation_id = reply["conversationId"].as_str().unwrap().to_string();

    // Follow-up in the same conversation
    send_json(
        &mut ws,
        json!({ "type": "chat", "message": "and the interview?", "mode": "career", "conversationId": conversation_id }),
    )
    .await;
    let reply = next_json(&mut ws).await;
    assert_eq!(reply["conversationId"], conversation_id);

    let id = conversation_id.parse().unwrap();
    assert_eq!(state.store.get_messages_by_conversation(id).unwrap().len(), 4);
}

#[tokio::test]
async fn auth_rebinds_conversations_to_user() {
    let (addr, state) = spawn_server().await;
    let mut ws = connect(addr).await;
    next_json(&mut ws).await;

    send_json(&mut ws, json!({ "type": "auth", "userId": "user-1" })).await;
    send_json(&mut ws, json!({ "type": "chat", "message": "I can't sleep", "mode": "health" })).await;
    let reply = next_json(&mut ws).await;
    assert_eq!(reply["type"], "chat_response");

    let conversations = state.store.get_conversations_by_user("user-1").unwrap();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0].title, "I can't sleep");
}

#[tokio::test]
async fn malformed_frames_get_error_envelopes() {
    let (addr, _state) = spawn_server().await;
    let mut ws = connect(addr).await;
    next_json(&mut ws).await;

    ws.send(Message::text("this is not json")).await.unwrap();
    assert_eq!(
        next_json(&mut ws).await,
        json!({ "type": "error", "message": "Failed to process message" })
    );

    // Unknown types are ignored; the next reply belongs to the chat below
    send_json(&mut ws, json!({ "type": "typing" })).await;
    send_json(&mut ws, json!({ "type": "chat", "message": "   " })).await;
    assert_eq!(
        next_json(&mut ws).await,
        json!({ "type": "error", "message": "Message cannot be empty" })
    );
}

#[tokio::test]
async fn disconnect_unregisters_client() {
    let (addr, state) = spawn_server().await;
    let mut ws = connect(addr).await;
    next_json(&mut ws).await;
    assert_eq!(state.dispatcher.client_count().await, 1);

    ws.close(None).await.unwrap();
    drop(ws);

    for _ in 0..50 {
        if state.dispatcher.client_count().await == 0 {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    panic!("client was not unregistered");
}
