//! WebSocket connection loop.
//!
//! Forwards subscribed [`PitrEvent`]s to the client and answers
//! subscription commands.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::SubscriptionManager;
use crate::domain::PitrEvent;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and applies them.
/// - Forwards matching events from the [`broadcast::Receiver`] to the client.
pub async fn run_connection(socket: WebSocket, mut event_rx: broadcast::Receiver<PitrEvent>) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_text_message(&text, &mut subs);
                        if let Some(json) = reply
                            && ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            event = event_rx.recv() => {
                match event {
                    Ok(event) => {
                        if !subs.matches(&event) {
                            continue;
                        }
                        let msg = WsMessage::new(
                            uuid::Uuid::new_v4().to_string(),
                            WsMessageType::Event,
                            serde_json::to_value(&event).unwrap_or_default(),
                        );
                        let json = serde_json::to_string(&msg).unwrap_or_default();
                        if ws_tx.send(Message::text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

/// Handles a text message from the client, returning an optional JSON reply.
fn handle_text_message(text: &str, subs: &mut SubscriptionManager) -> Option<String> {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return serde_json::to_string(&WsMessage::error("", 400, "malformed JSON")).ok();
    };

    let reply = match serde_json::from_value::<WsCommand>(msg.payload) {
        Ok(WsCommand::Subscribe { topics }) => {
            subs.subscribe(&topics);
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({ "subscribed": topics, "topics": subs.topics() }),
            )
        }
        Ok(WsCommand::Unsubscribe { topics }) => {
            subs.unsubscribe(&topics);
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({ "unsubscribed": topics, "topics": subs.topics() }),
            )
        }
        Err(_) => WsMessage::error(msg.id, 404, "unknown command"),
    };
    serde_json::to_string(&reply).ok()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::ws::subscription::EventTopic;

    fn command(payload: serde_json::Value) -> String {
        let msg = WsMessage::new("req-1", WsMessageType::Command, payload);
        let Ok(text) = serde_json::to_string(&msg) else {
            panic!("serialize");
        };
        text
    }

    fn reply(text: &str, subs: &mut SubscriptionManager) -> serde_json::Value {
        let Some(json) = handle_text_message(text, subs) else {
            panic!("expected a reply");
        };
        let Ok(value) = serde_json::from_str(&json) else {
            panic!("reply is not JSON");
        };
        value
    }

    #[test]
    fn unsubscribe_command_updates_filter() {
        let mut subs = SubscriptionManager::new();
        let value = reply(
            &command(serde_json::json!({ "command": "unsubscribe", "topics": ["wal", "backup"] })),
            &mut subs,
        );
        assert_eq!(value.get("id"), Some(&serde_json::json!("req-1")));
        assert_eq!(value.get("type"), Some(&serde_json::json!("response")));
        assert_eq!(subs.topics(), vec![EventTopic::Restore]);
    }

    #[test]
    fn unknown_command_is_an_error() {
        let mut subs = SubscriptionManager::new();
        let value = reply(&command(serde_json::json!({ "command": "pause" })), &mut subs);
        assert_eq!(value.pointer("/payload/code"), Some(&serde_json::json!(404)));
    }

    #[test]
    fn malformed_json_is_an_error() {
        let mut subs = SubscriptionManager::new();
        let value = reply("{not json", &mut subs);
        assert_eq!(value.pointer("/payload/code"), Some(&serde_json::json!(400)));
    }
}
