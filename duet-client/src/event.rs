use crate::error::ErrorKind;
use crate::health::HealthReport;
use crate::state::NegotiationState;
use duet_core::RoomId;
use serde_json::Value;

/// Lifecycle notifications for the UI. One subscriber drains them in order.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Initialized {
        room_id: RoomId,
    },
    LocalMediaReady {
        audio: bool,
        video: bool,
    },
    RemoteStreamConnected,
    PeerLeft,
    Reconnecting {
        attempt: u32,
    },
    Error {
        kind: ErrorKind,
        message: String,
    },
    AudioToggled {
        enabled: bool,
    },
    VideoToggled {
        enabled: bool,
    },
    StateChanged {
        from: NegotiationState,
        to: NegotiationState,
    },
    ChatReceived {
        message: Value,
    },
    FileReceived {
        file_data: Value,
    },
    HealthDegraded {
        report: HealthReport,
    },
}
