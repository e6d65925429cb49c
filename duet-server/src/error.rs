use duet_core::RoomId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("room {0} already has two members")]
    RoomFull(RoomId),

    #[error("room {0} is shutting down")]
    RoomClosed(RoomId),

    #[error("room {0} could not be reached")]
    RoomUnavailable(RoomId),
}
