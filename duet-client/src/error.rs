use crate::provider::MediaKind;
use crate::state::NegotiationState;
use thiserror::Error;

/// Failure classes surfaced to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The environment cannot run a call at all. Fatal.
    Capability,
    /// Local media could not be obtained. Retryable.
    Acquisition,
    /// Offer/answer/candidate handling failed. The call resets to waiting.
    Negotiation,
    /// The relay connection is gone for good. Fatal.
    Transport,
    /// The relay refused a request.
    Relay,
}

impl ErrorKind {
    pub fn is_fatal(self) -> bool {
        matches!(self, Self::Capability | Self::Transport)
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("unsupported environment: {0}")]
    Capability(String),

    #[error("could not acquire local media: {0}")]
    Acquisition(String),

    #[error("negotiation failed: {0}")]
    Negotiation(String),

    #[error("signaling transport failed: {0}")]
    Transport(String),

    #[error("relay rejected the request: {0}")]
    Relay(String),

    #[error("{operation} is not allowed while {state}")]
    InvalidState {
        operation: &'static str,
        state: NegotiationState,
    },

    #[error("no local {0:?} track")]
    MissingTrack(MediaKind),

    #[error("call engine has stopped")]
    EngineStopped,
}

impl ClientError {
    /// Classification of failures that come from the call itself. Misuse of the
    /// handle (`InvalidState`, `EngineStopped`) has none.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Capability(_) => Some(ErrorKind::Capability),
            Self::Acquisition(_) => Some(ErrorKind::Acquisition),
            Self::Negotiation(_) => Some(ErrorKind::Negotiation),
            Self::Transport(_) => Some(ErrorKind::Transport),
            Self::Relay(_) => Some(ErrorKind::Relay),
            Self::InvalidState { .. } | Self::MissingTrack(_) | Self::EngineStopped => None,
        }
    }
}

/// Errors from a `MediaProvider` / `LocalMedia`.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media capture is not supported: {0}")]
    Unsupported(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("device not found: {0}")]
    DeviceNotFound(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<MediaError> for ClientError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::Unsupported(_) => Self::Capability(e.to_string()),
            other => Self::Acquisition(format!("{other:#}")),
        }
    }
}

/// Errors from a `PeerLink`.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("malformed {what} payload: {reason}")]
    MalformedPayload { what: &'static str, reason: String },

    #[error("peer link is closed")]
    Closed,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<LinkError> for ClientError {
    fn from(e: LinkError) -> Self {
        Self::Negotiation(format!("{e:#}"))
    }
}
