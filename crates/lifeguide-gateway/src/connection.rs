use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use lifeguide_types::events::{ClientEnvelope, ServerEnvelope};
use lifeguide_types::models::Mode;

use crate::chat::{ChatRelay, RelayError};
use crate::dispatcher::Dispatcher;

/// Heartbeat interval: server sends a Ping every 15 seconds.
/// If 2 consecutive Pongs are missed (~30s), the connection is dropped.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);
const MAX_MISSED_PONGS: u8 = 2;

/// Missed-pong bookkeeping for the ping loop.
#[derive(Debug, Default)]
pub struct Heartbeat {
    missed: u8,
}

impl Heartbeat {
    /// Record one interval. `pong_received` is whether any pong arrived
    /// since the previous tick. Returns `false` once the peer is dead.
    pub fn tick(&mut self, pong_received: bool) -> bool {
        if pong_received {
            self.missed = 0;
        } else {
            self.missed = self.missed.saturating_add(1);
        }
        self.missed < MAX_MISSED_PONGS
    }

    pub fn missed(&self) -> u8 {
        self.missed
    }
}

/// What to do with one inbound text frame.
#[derive(Debug, PartialEq)]
pub enum Inbound {
    Chat {
        message: String,
        mode: Mode,
        conversation_id: Option<Uuid>,
    },
    Auth(String),
    Reply(ServerEnvelope),
    Ignore,
}

pub fn parse_inbound(text: &str) -> Inbound {
    match serde_json::from_str::<ClientEnvelope>(text) {
        Ok(ClientEnvelope::Chat {
            message,
            mode,
            conversation_id,
        }) => Inbound::Chat {
            message,
            // Anything but career/health goes to the dual persona
            mode: mode.as_deref().and_then(Mode::parse).unwrap_or_default(),
            // Unparseable ids are treated like unknown ones
            conversation_id: conversation_id.and_then(|id| id.parse().ok()),
        },
        Ok(ClientEnvelope::Auth { user_id }) => Inbound::Auth(user_id),
        Ok(ClientEnvelope::Unknown) => Inbound::Ignore,
        Err(e) => {
            warn!("Bad envelope: {} -- raw: {}", e, text.chars().take(200).collect::<String>());
            Inbound::Reply(ServerEnvelope::error("Failed to process message"))
        }
    }
}

/// Run one chat turn and turn the outcome into the envelope for the client.
pub async fn process_chat(
    relay: &ChatRelay,
    user_id: &str,
    message: &str,
    mode: Mode,
    conversation_id: Option<Uuid>,
) -> ServerEnvelope {
    match relay.handle(user_id, message, mode, conversation_id).await {
        Ok(reply) => ServerEnvelope::ChatResponse {
            content: reply.response.content,
            metadata: reply.response.metadata,
            conversation_id: Some(reply.conversation_id),
        },
        Err(RelayError::Invalid(reason)) => ServerEnvelope::error(reason),
        Err(e) => {
            error!("Chat relay failed for {}: {}", user_id, e);
            ServerEnvelope::error("Failed to process message")
        }
    }
}

/// Handle a single WebSocket connection on `/ws`.
pub async fn handle_connection(socket: WebSocket, dispatcher: Dispatcher, relay: ChatRelay) {
    let (mut sender, mut receiver) = socket.split();

    let client = dispatcher.register().await;
    let client_id = client.client_id.clone();
    info!("WebSocket client connected: {}", client_id);

    // Every outbound frame goes through this channel so chat tasks never
    // contend for the sink.
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ServerEnvelope>();
    let _ = out_tx.send(ServerEnvelope::connected());

    // Shared flag for heartbeat
    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received.clone();

    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;
        let mut liveness = Heartbeat::default();

        loop {
            tokio::select! {
                envelope = out_rx.recv() => {
                    let Some(envelope) = envelope else { break };
                    let text = match serde_json::to_string(&envelope) {
                        Ok(text) => text,
                        Err(e) => {
                            error!("Failed to encode envelope: {}", e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    if !liveness.tick(pong_flag_send.swap(false, Ordering::Acquire)) {
                        warn!("Heartbeat timeout (missed {} pongs), dropping connection", liveness.missed());
                        break;
                    }
                    if sender.send(Message::Ping(vec![].into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    let dispatcher_recv = dispatcher.clone();
    let client_id_recv = client_id.clone();
    let mut recv_task = tokio::spawn(async move {
        let mut user_id = client.user_id;

        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match parse_inbound(text.as_str()) {
                    Inbound::Chat {
                        message,
                        mode,
                        conversation_id,
                    } => {
                        // Answers may take seconds; keep reading pongs meanwhile
                        let relay = relay.clone();
                        let out_tx = out_tx.clone();
                        let user_id = user_id.clone();
                        tokio::spawn(async move {
                            let reply =
                                process_chat(&relay, &user_id, &message, mode, conversation_id).await;
                            let _ = out_tx.send(reply);
                        });
                    }
                    Inbound::Auth(new_user_id) => {
                        info!("Client {} authenticated as {}", client_id_recv, new_user_id);
                        dispatcher_recv.set_user(&client_id_recv, new_user_id.clone()).await;
                        user_id = new_user_id;
                    }
                    Inbound::Reply(envelope) => {
                        let _ = out_tx.send(envelope);
                    }
                    Inbound::Ignore => {}
                },
                Message::Pong(_) => {
                    pong_flag_recv.store(true, Ordering::Release);
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    match dispatcher.unregister(&client_id).await {
        Some(client) => {
            let secs = (Utc::now() - client.connected_at).num_seconds();
            info!("WebSocket client disconnected: {} (user {}, {}s)", client_id, client.user_id, secs);
        }
        None => info!("WebSocket client disconnected: {}", client_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifeguide_assistant::{Assistant, DemoResponder};
    use lifeguide_db::MemStorage;
    use lifeguide_types::models::Urgency;

    fn relay() -> ChatRelay {
        ChatRelay::new(Arc::new(MemStorage::new()), Arc::new(Assistant::Demo(DemoResponder::new())))
    }

    #[test]
    fn chat_without_mode_defaults_to_dual() {
        assert_eq!(
            parse_inbound(r#"{"type":"chat","message":"hi"}"#),
            Inbound::Chat {
                message: "hi".into(),
                mode: Mode::Dual,
                conversation_id: None,
            }
        );
    }

    #[test]
    fn unrecognised_or_empty_mode_falls_back_to_dual() {
        for raw in [
            r#"{"type":"chat","message":"hi","mode":"finance"}"#,
            r#"{"type":"chat","message":"hi","mode":""}"#,
        ] {
            assert_eq!(
                parse_inbound(raw),
                Inbound::Chat {
                    message: "hi".into(),
                    mode: Mode::Dual,
                    conversation_id: None,
                }
            );
        }
    }

    #[test]
    fn conversation_id_is_parsed_when_valid() {
        let id = Uuid::new_v4();
        let raw = format!(r#"{{"type":"chat","message":"hi","mode":"health","conversationId":"{id}"}}"#);
        assert_eq!(
            parse_inbound(&raw),
            Inbound::Chat {
                message: "hi".into(),
                mode: Mode::Health,
                conversation_id: Some(id),
            }
        );
    }

    #[tokio::test]
    async fn non_uuid_conversation_id_starts_a_new_conversation() {
        let relay = relay();
        let Inbound::Chat { message, mode, conversation_id } =
            parse_inbound(r#"{"type":"chat","message":"resume help","mode":"career","conversationId":"conv-123"}"#)
        else {
            panic!("expected a chat");
        };
        assert_eq!(conversation_id, None);

        let envelope = process_chat(&relay, "u1", &message, mode, conversation_id).await;
        assert!(matches!(envelope, ServerEnvelope::ChatResponse { conversation_id: Some(_), .. }));
        assert_eq!(relay.store().get_conversations_by_user("u1").unwrap().len(), 1);
    }

    #[test]
    fn one_missed_pong_is_tolerated() {
        let mut heartbeat = Heartbeat::default();
        assert!(heartbeat.tick(false));
        assert_eq!(heartbeat.missed(), 1);
    }

    #[test]
    fn two_consecutive_missed_pongs_drop_the_peer() {
        let mut heartbeat = Heartbeat::default();
        assert!(heartbeat.tick(true));
        assert!(heartbeat.tick(false));
        assert!(!heartbeat.tick(false));
    }

    #[test]
    fn pong_resets_the_count() {
        let mut heartbeat = Heartbeat::default();
        assert!(heartbeat.tick(false));
        assert!(heartbeat.tick(true));
        assert_eq!(heartbeat.missed(), 0);
        assert!(heartbeat.tick(false));
    }

    #[test]
    fn auth_rebinds_user() {
        assert_eq!(parse_inbound(r#"{"type":"auth","userId":"u-7"}"#), Inbound::Auth("u-7".into()));
    }

    #[test]
    fn unknown_type_is_ignored() {
        assert_eq!(parse_inbound(r#"{"type":"ping"}"#), Inbound::Ignore);
    }

    #[test]
    fn garbage_yields_error_envelope() {
        assert_eq!(
            parse_inbound("not json"),
            Inbound::Reply(ServerEnvelope::error("Failed to process message"))
        );
        // chat without a message is malformed too
        assert_eq!(
            parse_inbound(r#"{"type":"chat","mode":"career"}"#),
            Inbound::Reply(ServerEnvelope::error("Failed to process message"))
        );
    }

    #[tokio::test]
    async fn process_chat_returns_chat_response() {
        let relay = relay();
        let envelope = process_chat(&relay, "demo-user-abc", "I have chest pain", Mode::Dual, None).await;
        match envelope {
            ServerEnvelope::ChatResponse {
                metadata,
                conversation_id,
                ..
            } => {
                assert_eq!(metadata.urgency, Urgency::Emergency);
                let id = conversation_id.unwrap();
                assert_eq!(relay.store().get_conversation(id).unwrap().unwrap().user_id, "demo-user-abc");
            }
            other => panic!("unexpected envelope: {other:?}"),
        }
    }

    #[tokio::test]
    async fn process_chat_reports_validation_errors() {
        let envelope = process_chat(&relay(), "u", "", Mode::Dual, None).await;
        assert_eq!(envelope, ServerEnvelope::error("Message cannot be empty"));
    }
}
