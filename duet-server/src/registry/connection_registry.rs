use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use axum::extract::ws::Message;
use dashmap::DashMap;
use duet_core::{ConnectionId, RoomId, SignalEnvelope};
use tokio::sync::mpsc;
use tracing::{debug, error};

struct ConnectionEntry {
    tx: mpsc::UnboundedSender<Message>,
    room: Option<RoomId>,
}

/// Live signaling connections and the room each one currently belongs to.
///
/// A connection is registered when its socket opens and unregistered when it
/// closes; the registry owns the outbound half of every socket.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, ConnectionEntry>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, tx: mpsc::UnboundedSender<Message>) -> ConnectionId {
        let id = ConnectionId::new();
        self.connections
            .insert(id, ConnectionEntry { tx, room: None });
        id
    }

    /// Forget a connection. Returns the room it was in so the caller can evict it.
    /// Unknown ids are a no-op.
    pub fn unregister(&self, connection_id: &ConnectionId) -> Option<RoomId> {
        self.connections
            .remove(connection_id)
            .and_then(|(_, entry)| entry.room)
    }

    /// Record room membership. Returns `false` if the connection is unknown.
    pub fn set_room(&self, connection_id: &ConnectionId, room: Option<RoomId>) -> bool {
        match self.connections.get_mut(connection_id) {
            Some(mut entry) => {
                entry.room = room;
                true
            }
            None => false,
        }
    }

    pub fn room_of(&self, connection_id: &ConnectionId) -> Option<RoomId> {
        self.connections
            .get(connection_id)
            .and_then(|entry| entry.room.clone())
    }

    /// Registered and its writer is still draining the outbound queue.
    pub fn is_open(&self, connection_id: &ConnectionId) -> bool {
        self.connections
            .get(connection_id)
            .is_some_and(|entry| !entry.tx.is_closed())
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

#[async_trait]
impl SignalingOutput for ConnectionRegistry {
    async fn deliver(&self, connection_id: &ConnectionId, envelope: &SignalEnvelope) {
        let json = match serde_json::to_string(envelope) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize {} envelope: {}", envelope.kind(), e);
                return;
            }
        };

        let Some(entry) = self.connections.get(connection_id) else {
            debug!(
                "Dropping {} for unknown connection {}",
                envelope.kind(),
                connection_id
            );
            return;
        };

        if entry.tx.send(Message::Text(json.into())).is_err() {
            debug!(
                "Dropping {} for closed connection {}",
                envelope.kind(),
                connection_id
            );
        }
    }
}
