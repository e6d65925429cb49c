use std::fmt;

/// Where a client is in the life of one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NegotiationState {
    Idle,
    AwaitingMedia,
    AwaitingPeer,
    Offering,
    Answering,
    Connected,
    Reconnecting,
    Closing,
    Closed,
}

impl NegotiationState {
    /// States in which local media exists and may be toggled.
    pub fn accepts_toggles(self) -> bool {
        matches!(
            self,
            Self::AwaitingPeer | Self::Offering | Self::Answering | Self::Connected
        )
    }

    /// States that hold a room and a transport.
    pub fn is_in_call(self) -> bool {
        matches!(
            self,
            Self::AwaitingPeer
                | Self::Offering
                | Self::Answering
                | Self::Connected
                | Self::Reconnecting
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closing | Self::Closed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingMedia => "awaiting-media",
            Self::AwaitingPeer => "awaiting-peer",
            Self::Offering => "offering",
            Self::Answering => "answering",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
            Self::Closing => "closing",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
