use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(urls: &[&str]) -> Self {
        Self {
            urls: urls.iter().map(|u| (*u).to_owned()).collect(),
            username: None,
            credential: None,
        }
    }
}

/// Reason carried by a relay `error` envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelayErrorCode {
    /// The room already has two members.
    RoomFull,
    /// The frame could not be parsed as an envelope.
    InvalidMessage,
}

/// A signaling message exchanged between a client and the relay.
///
/// Encoded as a JSON object with a kebab-case `type` tag and camelCase
/// fields, e.g. `{"type":"ice-candidate","roomId":"12345678","candidate":{..}}`.
/// SDP, candidate, chat and file payloads are opaque to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum SignalEnvelope {
    JoinRoom {
        room_id: RoomId,
    },
    StartCall {
        room_id: RoomId,
    },
    Offer {
        room_id: RoomId,
        offer: Value,
    },
    Answer {
        room_id: RoomId,
        answer: Value,
    },
    IceCandidate {
        room_id: RoomId,
        candidate: Value,
    },
    PeerLeft {
        room_id: RoomId,
    },
    ChatMessage {
        room_id: RoomId,
        message: Value,
    },
    FileMessage {
        room_id: RoomId,
        file_data: Value,
    },
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_id: Option<RoomId>,
        code: RelayErrorCode,
        message: String,
    },
}

impl SignalEnvelope {
    pub fn room_id(&self) -> Option<&RoomId> {
        match self {
            Self::JoinRoom { room_id }
            | Self::StartCall { room_id }
            | Self::Offer { room_id, .. }
            | Self::Answer { room_id, .. }
            | Self::IceCandidate { room_id, .. }
            | Self::PeerLeft { room_id }
            | Self::ChatMessage { room_id, .. }
            | Self::FileMessage { room_id, .. } => Some(room_id),
            Self::Error { room_id, .. } => room_id.as_ref(),
        }
    }

    /// Wire name of the `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::JoinRoom { .. } => "join-room",
            Self::StartCall { .. } => "start-call",
            Self::Offer { .. } => "offer",
            Self::Answer { .. } => "answer",
            Self::IceCandidate { .. } => "ice-candidate",
            Self::PeerLeft { .. } => "peer-left",
            Self::ChatMessage { .. } => "chat-message",
            Self::FileMessage { .. } => "file-message",
            Self::Error { .. } => "error",
        }
    }

    /// Envelopes a client may ask the relay to forward to the other room member.
    pub fn is_relayable(&self) -> bool {
        matches!(
            self,
            Self::Offer { .. }
                | Self::Answer { .. }
                | Self::IceCandidate { .. }
                | Self::ChatMessage { .. }
                | Self::FileMessage { .. }
        )
    }
}
