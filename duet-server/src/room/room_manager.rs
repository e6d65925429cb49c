use crate::error::RelayError;
use crate::room::{JoinOutcome, Room, RoomCommand};
use crate::signaling::SignalingOutput;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use duet_core::{ConnectionId, RoomId, SignalEnvelope};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

/// A join can race a room that is shutting down; retry against a fresh one.
const JOIN_ATTEMPTS: usize = 3;

type RoomMap = DashMap<RoomId, mpsc::Sender<RoomCommand>>;

/// Room pairing engine: owns the room id → room actor table.
///
/// Rooms are spawned lazily on first join and remove themselves from the
/// table once their last member leaves.
#[derive(Clone)]
pub struct RoomManager {
    rooms: Arc<RoomMap>,
    signaling: Arc<dyn SignalingOutput>,
    command_buffer: usize,
}

impl RoomManager {
    pub fn new(signaling: Arc<dyn SignalingOutput>, command_buffer: usize) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            signaling,
            command_buffer: command_buffer.max(1),
        }
    }

    pub async fn join(
        &self,
        room_id: &RoomId,
        connection_id: ConnectionId,
    ) -> Result<JoinOutcome, RelayError> {
        for _ in 0..JOIN_ATTEMPTS {
            let sender = self.get_room_sender(room_id);
            let (reply, reply_rx) = oneshot::channel();

            let cmd = RoomCommand::Join {
                connection_id,
                reply,
            };
            if sender.send(cmd).await.is_err() {
                self.forget(room_id, &sender);
                continue;
            }

            match reply_rx.await {
                Ok(Err(RelayError::RoomClosed(_))) | Err(_) => {
                    debug!("Room {} closed during join, retrying", room_id);
                    self.forget(room_id, &sender);
                }
                Ok(outcome) => return outcome,
            }
        }

        Err(RelayError::RoomUnavailable(room_id.clone()))
    }

    pub async fn leave(&self, room_id: &RoomId, connection_id: ConnectionId) {
        let Some(sender) = self.existing_sender(room_id) else {
            return;
        };
        let _ = sender.send(RoomCommand::Leave { connection_id }).await;
    }

    /// Forward `envelope` to the other members of `room_id`. Unknown rooms drop it.
    pub async fn relay(&self, room_id: &RoomId, sender: ConnectionId, envelope: SignalEnvelope) {
        let Some(room) = self.existing_sender(room_id) else {
            debug!(
                "Dropping {} from {}: room {} does not exist",
                envelope.kind(),
                sender,
                room_id
            );
            return;
        };
        let _ = room.send(RoomCommand::Relay { sender, envelope }).await;
    }

    /// Current members in join order, or `None` if the room does not exist.
    pub async fn members(&self, room_id: &RoomId) -> Option<Vec<ConnectionId>> {
        let sender = self.existing_sender(room_id)?;
        let (reply, reply_rx) = oneshot::channel();
        sender.send(RoomCommand::Members { reply }).await.ok()?;
        reply_rx.await.ok()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn existing_sender(&self, room_id: &RoomId) -> Option<mpsc::Sender<RoomCommand>> {
        self.rooms.get(room_id).map(|sender| sender.clone())
    }

    fn get_room_sender(&self, room_id: &RoomId) -> mpsc::Sender<RoomCommand> {
        match self.rooms.entry(room_id.clone()) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                info!("Creating new room: {}", room_id);
                let (tx, rx) = mpsc::channel(self.command_buffer);

                let rooms = Arc::clone(&self.rooms);
                let retired_id = room_id.clone();
                let own = tx.downgrade();
                let room = Room::new(room_id.clone(), rx, Arc::clone(&self.signaling)).on_retire(
                    Box::new(move || {
                        if let Some(own) = own.upgrade() {
                            rooms.remove_if(&retired_id, |_, tx| tx.same_channel(&own));
                        }
                        info!("Room {} destroyed", retired_id);
                    }),
                );
                tokio::spawn(room.run());

                entry.insert(tx.clone());
                tx
            }
        }
    }

    fn forget(&self, room_id: &RoomId, sender: &mpsc::Sender<RoomCommand>) {
        self.rooms
            .remove_if(room_id, |_, tx| tx.same_channel(sender));
    }
}
