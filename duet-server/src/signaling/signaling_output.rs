use async_trait::async_trait;
use duet_core::{ConnectionId, SignalEnvelope};

/// Outbound side of the relay: how a room reaches the sockets of its members.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Deliver an envelope to a single connection.
    ///
    /// Best effort: a connection that is gone or whose socket is no longer
    /// open silently misses the message.
    async fn deliver(&self, connection_id: &ConnectionId, envelope: &SignalEnvelope);
}
