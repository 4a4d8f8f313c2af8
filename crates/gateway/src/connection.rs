//! Per-connection message pump

use crate::adoption::AdoptionFlow;
use crate::wire::{self, ClientCommand, ParseError};
use shelter_common::ChatMessage;
use shelter_coordinator::Coordinator;
use shelter_hub::{ChatHub, ClientSink, ConnectionId, ServerMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Gateway tuning parameters
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Room every connection starts in
    pub default_room: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            default_room: "lobby".to_string(),
        }
    }
}

/// Realtime gateway: routes inbound commands to chat, rooms, or adoption
pub struct Gateway {
    hub: Arc<ChatHub>,
    adoptions: AdoptionFlow,
    config: GatewayConfig,
}

impl Gateway {
    pub fn new(hub: Arc<ChatHub>, coordinator: Arc<Coordinator>, config: GatewayConfig) -> Self {
        Self {
            hub,
            adoptions: AdoptionFlow::new(coordinator),
            config,
        }
    }

    /// Run the pump for one connection until its inbound channel closes
    ///
    /// The connection joins the default room on arrival and leaves whatever
    /// room it is in on disconnect, regardless of in-flight work. A
    /// malformed frame gets an error reply and the connection stays open.
    pub async fn run_connection(
        &self,
        mut inbound: mpsc::UnboundedReceiver<String>,
        sink: Arc<dyn ClientSink>,
    ) {
        let conn = ConnectionId::next();
        let registry = self.hub.registry().clone();
        let mut room = self.config.default_room.clone();

        registry.join(conn, sink.clone(), &room).await;
        tracing::info!(%conn, room, "client connected");

        while let Some(frame) = inbound.recv().await {
            match wire::parse(&frame) {
                Ok(ClientCommand::JoinRoom { room: new_room }) => {
                    registry.join(conn, sink.clone(), &new_room).await;
                    room = new_room;
                }
                Ok(ClientCommand::GetHistory) => {
                    self.handle_history(&sink, &room).await;
                }
                Ok(ClientCommand::Adopt { post_id, username }) => {
                    self.handle_adopt(&sink, &room, post_id, &username).await;
                }
                Ok(ClientCommand::Chat {
                    message_id,
                    username,
                    message,
                }) => {
                    self.handle_chat(&sink, &room, message_id, username, message)
                        .await;
                }
                Err(ParseError::Malformed) => {
                    let _ = sink
                        .deliver(ServerMessage::error("Invalid JSON format"))
                        .await;
                }
                Err(err @ ParseError::MissingField(_)) => {
                    let _ = sink.deliver(ServerMessage::error(err.to_string())).await;
                }
            }
        }

        registry.leave(conn).await;
        tracing::info!(%conn, "client disconnected");
    }

    async fn handle_history(&self, sink: &Arc<dyn ClientSink>, room: &str) {
        match self.hub.history(room).await {
            Ok(history) => {
                let _ = sink.deliver(ServerMessage::ChatHistory { history }).await;
            }
            Err(err) => {
                tracing::warn!(room, %err, "history read failed");
                let _ = sink.deliver(ServerMessage::error(err.to_string())).await;
            }
        }
    }

    async fn handle_chat(
        &self,
        sink: &Arc<dyn ClientSink>,
        room: &str,
        message_id: Option<String>,
        username: Option<String>,
        message: Option<String>,
    ) {
        let message_id = message_id.unwrap_or_else(|| Uuid::new_v4().to_string());

        let (username, message) = match (username, message) {
            (Some(u), Some(m)) if !u.is_empty() && !m.is_empty() => (u, m),
            _ => {
                let _ = sink
                    .deliver(ServerMessage::save_failed(
                        message_id,
                        "Both 'username' and 'message' fields are required",
                    ))
                    .await;
                return;
            }
        };

        let mut record = ChatMessage::new(username, message, room);
        record.message_id = message_id.clone();

        match self.hub.save_message(record).await {
            Ok(()) => {
                let _ = sink.deliver(ServerMessage::saved(message_id)).await;
            }
            Err(err) => {
                tracing::error!(room, %err, "failed to save chat message");
                let _ = sink
                    .deliver(ServerMessage::save_failed(message_id, err.to_string()))
                    .await;
            }
        }
    }

    async fn handle_adopt(
        &self,
        sink: &Arc<dyn ClientSink>,
        room: &str,
        post_id: u64,
        username: &str,
    ) {
        let result = self.adoptions.adopt(post_id, username, room).await;

        if result.success {
            let _ = sink
                .deliver(ServerMessage::Adoption {
                    status: "success".into(),
                    post_id,
                    error: None,
                })
                .await;
            // The room-wide notice goes out via broadcast; the reply above
            // went to the initiator only.
            self.hub
                .announce(room, format!("{} adopted post {}", username, post_id))
                .await;
        } else {
            // Internal failure detail stays internal
            let _ = sink
                .deliver(ServerMessage::Adoption {
                    status: "failure".into(),
                    post_id,
                    error: Some("adoption failed".into()),
                })
                .await;
        }
    }
}
