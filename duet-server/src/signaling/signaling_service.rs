use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::registry::ConnectionRegistry;
use crate::room::{JoinOutcome, RoomManager};
use crate::signaling::SignalingOutput;
use axum::extract::ws::Message;
use duet_core::{ConnectionId, RelayErrorCode, RoomId, SignalEnvelope};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Glue between sockets, the connection registry and the room pairing engine.
#[derive(Clone)]
pub struct SignalingService {
    registry: Arc<ConnectionRegistry>,
    rooms: RoomManager,
}

impl SignalingService {
    pub fn new(config: &RelayConfig) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let rooms = RoomManager::new(registry.clone(), config.room_command_buffer);
        Self { registry, rooms }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn rooms(&self) -> &RoomManager {
        &self.rooms
    }

    /// Register a freshly opened socket.
    pub fn connect(&self, tx: mpsc::UnboundedSender<Message>) -> ConnectionId {
        self.registry.register(tx)
    }

    /// Forget a closed socket and evict it from its room. Idempotent.
    pub async fn disconnect(&self, connection_id: &ConnectionId) {
        if let Some(room_id) = self.registry.unregister(connection_id) {
            self.rooms.leave(&room_id, *connection_id).await;
        }
    }

    /// Parse one text frame and act on it.
    pub async fn handle_text(&self, connection_id: ConnectionId, text: &str) {
        match serde_json::from_str::<SignalEnvelope>(text) {
            Ok(envelope) => self.handle_envelope(connection_id, envelope).await,
            Err(e) => {
                warn!("Invalid envelope from {}: {}", connection_id, e);
                let reply = SignalEnvelope::Error {
                    room_id: None,
                    code: RelayErrorCode::InvalidMessage,
                    message: e.to_string(),
                };
                self.registry.deliver(&connection_id, &reply).await;
            }
        }
    }

    pub async fn handle_envelope(&self, connection_id: ConnectionId, envelope: SignalEnvelope) {
        debug!("[{}] received from {}", envelope.kind(), connection_id);

        match envelope {
            SignalEnvelope::JoinRoom { room_id } => self.join(connection_id, room_id).await,

            env if env.is_relayable() => {
                let Some(room_id) = env.room_id().cloned() else {
                    return;
                };
                self.rooms.relay(&room_id, connection_id, env).await;
            }

            env => warn!(
                "Ignoring relay-originated {} envelope sent by {}",
                env.kind(),
                connection_id
            ),
        }
    }

    async fn join(&self, connection_id: ConnectionId, room_id: RoomId) {
        if let Some(previous) = self.registry.room_of(&connection_id) {
            if previous != room_id {
                info!("{} switches from room {} to {}", connection_id, previous, room_id);
                self.rooms.leave(&previous, connection_id).await;
            }
        }

        // Recorded before joining so a disconnect racing the join still evicts.
        if !self.registry.set_room(&connection_id, Some(room_id.clone())) {
            return;
        }

        match self.rooms.join(&room_id, connection_id).await {
            Ok(JoinOutcome::Joined { .. }) | Ok(JoinOutcome::AlreadyMember) => {}
            Err(e @ RelayError::RoomFull(_)) => {
                self.registry.set_room(&connection_id, None);
                let reply = SignalEnvelope::Error {
                    room_id: Some(room_id),
                    code: RelayErrorCode::RoomFull,
                    message: e.to_string(),
                };
                self.registry.deliver(&connection_id, &reply).await;
            }
            Err(e) => {
                self.registry.set_room(&connection_id, None);
                error!("Join of {} failed: {}", connection_id, e);
            }
        }
    }
}
