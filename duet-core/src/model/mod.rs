mod connection;
mod room;
mod signaling;

pub use connection::ConnectionId;
pub use room::{RoomId, RoomIdError};
pub use signaling::{IceServerConfig, RelayErrorCode, SignalEnvelope};
