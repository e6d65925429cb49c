use crate::error::RelayError;
use crate::room::room_command::{JoinOutcome, RoomCommand};
use crate::signaling::SignalingOutput;
use duet_core::{ConnectionId, RoomId, SignalEnvelope};
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// A call is strictly two-party.
pub const ROOM_CAPACITY: usize = 2;

/// Called once when the room becomes empty, before it stops accepting commands.
pub type RetireFn = Box<dyn FnOnce() + Send + Sync + 'static>;

/// Actor owning the member list of one room.
///
/// Every join, leave and relay for the room goes through `command_rx`, so
/// they never race each other and a sender's envelopes keep their order.
pub struct Room {
    room_id: RoomId,
    members: Vec<ConnectionId>,
    command_rx: mpsc::Receiver<RoomCommand>,
    signaling: Arc<dyn SignalingOutput>,
    retire: Option<RetireFn>,
}

impl Room {
    pub fn new(
        room_id: RoomId,
        command_rx: mpsc::Receiver<RoomCommand>,
        signaling: Arc<dyn SignalingOutput>,
    ) -> Self {
        Self {
            room_id,
            members: Vec::with_capacity(ROOM_CAPACITY),
            command_rx,
            signaling,
            retire: None,
        }
    }

    pub fn on_retire(mut self, retire: RetireFn) -> Self {
        self.retire = Some(retire);
        self
    }

    pub async fn run(mut self) {
        info!("Room {} event loop started", self.room_id);

        while let Some(cmd) = self.command_rx.recv().await {
            if self.handle_command(cmd).await.is_break() {
                break;
            }
        }

        if let Some(retire) = self.retire.take() {
            retire();
        }
        self.command_rx.close();

        // Anything queued behind the last leave raced the shutdown.
        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                RoomCommand::Join { reply, .. } => {
                    let _ = reply.send(Err(RelayError::RoomClosed(self.room_id.clone())));
                }
                RoomCommand::Relay { sender, envelope } => {
                    debug!(
                        "Room {} closed, dropping {} from {}",
                        self.room_id,
                        envelope.kind(),
                        sender
                    );
                }
                RoomCommand::Leave { .. } | RoomCommand::Members { .. } => {}
            }
        }

        info!("Room {} event loop finished", self.room_id);
    }

    async fn handle_command(&mut self, cmd: RoomCommand) -> ControlFlow<()> {
        match cmd {
            RoomCommand::Join {
                connection_id,
                reply,
            } => {
                let outcome = self.join(connection_id);
                let triggered = matches!(
                    &outcome,
                    Ok(JoinOutcome::Joined { position }) if *position == ROOM_CAPACITY
                );
                let _ = reply.send(outcome);

                if triggered {
                    self.trigger_start_call().await;
                }
            }

            RoomCommand::Relay { sender, envelope } => {
                self.relay(&sender, &envelope).await;
            }

            RoomCommand::Leave { connection_id } => {
                return self.leave(&connection_id).await;
            }

            RoomCommand::Members { reply } => {
                let _ = reply.send(self.members.clone());
            }
        }

        ControlFlow::Continue(())
    }

    fn join(&mut self, connection_id: ConnectionId) -> Result<JoinOutcome, RelayError> {
        if self.members.contains(&connection_id) {
            return Ok(JoinOutcome::AlreadyMember);
        }

        if self.members.len() >= ROOM_CAPACITY {
            warn!(
                "Rejecting {} from full room {}",
                connection_id, self.room_id
            );
            return Err(RelayError::RoomFull(self.room_id.clone()));
        }

        self.members.push(connection_id);
        info!(
            "Client {} joined room {}, total clients: {}",
            connection_id,
            self.room_id,
            self.members.len()
        );

        Ok(JoinOutcome::Joined {
            position: self.members.len(),
        })
    }

    /// The earliest member becomes the call initiator.
    async fn trigger_start_call(&self) {
        let Some(initiator) = self.members.first() else {
            return;
        };

        let envelope = SignalEnvelope::StartCall {
            room_id: self.room_id.clone(),
        };
        self.signaling.deliver(initiator, &envelope).await;
        info!("Triggered start-call for {} in room {}", initiator, self.room_id);
    }

    async fn relay(&self, sender: &ConnectionId, envelope: &SignalEnvelope) {
        if !self.members.contains(sender) {
            debug!(
                "Dropping {} from {}: not a member of room {}",
                envelope.kind(),
                sender,
                self.room_id
            );
            return;
        }

        for member in self.members.iter().filter(|m| *m != sender) {
            self.signaling.deliver(member, envelope).await;
        }
    }

    async fn leave(&mut self, connection_id: &ConnectionId) -> ControlFlow<()> {
        let before = self.members.len();
        self.members.retain(|m| m != connection_id);
        if self.members.len() == before {
            return ControlFlow::Continue(());
        }

        info!(
            "Client {} left room {}, remaining: {}",
            connection_id,
            self.room_id,
            self.members.len()
        );

        if self.members.is_empty() {
            return ControlFlow::Break(());
        }

        let envelope = SignalEnvelope::PeerLeft {
            room_id: self.room_id.clone(),
        };
        for member in &self.members {
            self.signaling.deliver(member, &envelope).await;
        }

        ControlFlow::Continue(())
    }
}
