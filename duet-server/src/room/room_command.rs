use crate::error::RelayError;
use duet_core::{ConnectionId, SignalEnvelope};
use tokio::sync::oneshot;

/// Result of a successful join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Added as member number `position` (1-based).
    Joined { position: usize },
    /// The connection was already a member; nothing changed.
    AlreadyMember,
}

/// Commands a room actor processes, strictly in arrival order.
#[derive(Debug)]
pub enum RoomCommand {
    /// Add a connection; the second member triggers `start-call` to the first.
    Join {
        connection_id: ConnectionId,
        reply: oneshot::Sender<Result<JoinOutcome, RelayError>>,
    },

    /// Forward an envelope to every member except the sender.
    Relay {
        sender: ConnectionId,
        envelope: SignalEnvelope,
    },

    /// The connection left the room or its socket closed.
    Leave { connection_id: ConnectionId },

    /// Snapshot of the current members in join order.
    Members {
        reply: oneshot::Sender<Vec<ConnectionId>>,
    },
}
