use crate::config::{LinkConfig, MediaConstraints};
use crate::error::{LinkError, MediaError};
use async_trait::async_trait;
use duet_core::SignalEnvelope;
use serde_json::Value;
use std::fmt;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Audio,
    Video,
}

/// Opaque capture device identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceId(pub String);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackInfo {
    pub kind: MediaKind,
    pub id: String,
    pub enabled: bool,
}

/// Source of local capture streams.
#[async_trait]
pub trait MediaProvider: Send + Sync {
    async fn acquire(
        &self,
        constraints: &MediaConstraints,
        device: Option<&DeviceId>,
    ) -> Result<Box<dyn LocalMedia>, MediaError>;

    async fn video_devices(&self) -> Result<Vec<DeviceId>, MediaError>;
}

/// A captured local stream. Enable flags use interior mutability so the
/// stream can be shared with a peer link.
#[async_trait]
pub trait LocalMedia: Send + Sync {
    fn stream_id(&self) -> &str;

    fn tracks(&self) -> Vec<TrackInfo>;

    /// Returns `false` when the stream has no track of `kind`.
    fn set_enabled(&self, kind: MediaKind, enabled: bool) -> bool;

    fn video_device(&self) -> Option<DeviceId>;

    /// False once released or once the capture device went away.
    fn is_live(&self) -> bool;

    async fn release(&self);

    fn track(&self, kind: MediaKind) -> Option<TrackInfo> {
        self.tracks().into_iter().find(|t| t.kind == kind)
    }

    fn is_enabled(&self, kind: MediaKind) -> Option<bool> {
        self.track(kind).map(|t| t.enabled)
    }
}

/// ICE transport state of a peer link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IceTransportState {
    New,
    Checking,
    Connected,
    Completed,
    Disconnected,
    Failed,
    Closed,
}

impl IceTransportState {
    pub fn is_healthy(self) -> bool {
        matches!(self, Self::Connected | Self::Completed)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LinkEventKind {
    /// A local ICE candidate, already in wire shape.
    LocalCandidate(Value),
    RemoteTrack(MediaKind),
    IceStateChanged(IceTransportState),
}

/// Event from a peer link, tagged with the generation of the link that raised it.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkEvent {
    pub generation: u64,
    pub kind: LinkEventKind,
}

/// Where a link reports its callbacks. Cheap to clone into closures.
#[derive(Debug, Clone)]
pub struct LinkEventSink {
    generation: u64,
    tx: mpsc::UnboundedSender<LinkEvent>,
}

impl LinkEventSink {
    pub fn new(generation: u64, tx: mpsc::UnboundedSender<LinkEvent>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn emit(&self, kind: LinkEventKind) {
        let _ = self.tx.send(LinkEvent {
            generation: self.generation,
            kind,
        });
    }
}

#[async_trait]
pub trait PeerLinkProvider: Send + Sync {
    async fn create_link(
        &self,
        config: &LinkConfig,
        media: &dyn LocalMedia,
        events: LinkEventSink,
    ) -> Result<Box<dyn PeerLink>, LinkError>;
}

/// One peer-to-peer media connection. SDP payloads are `{type, sdp}` objects.
#[async_trait]
pub trait PeerLink: Send + Sync {
    /// Create an offer and install it as the local description.
    async fn create_offer(&self) -> Result<Value, LinkError>;

    /// Apply a remote offer, then create and install the answer.
    async fn create_answer(&self, offer: &Value) -> Result<Value, LinkError>;

    async fn apply_answer(&self, answer: &Value) -> Result<(), LinkError>;

    async fn add_remote_candidate(&self, candidate: &Value) -> Result<(), LinkError>;

    /// Swap the outgoing tracks for those of `media` without renegotiating.
    async fn replace_local_media(&self, media: &dyn LocalMedia) -> Result<(), LinkError>;

    fn transport_state(&self) -> IceTransportState;

    async fn close(&self);
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Connected,
    Message(SignalEnvelope),
    /// The connection dropped; reconnect attempts follow.
    Disconnected,
    Reconnecting { attempt: u32 },
    /// Reconnect attempts are exhausted or the transport cannot start.
    Failed(String),
}

pub type TransportEventSink = mpsc::UnboundedSender<TransportEvent>;

/// Connection to the signaling relay.
#[async_trait]
pub trait SignalTransport: Send + Sync {
    /// Start connecting. Progress is reported on `events`.
    async fn open(&self, events: TransportEventSink) -> anyhow::Result<()>;

    /// Send now, or queue until the connection is ready.
    fn send(&self, envelope: SignalEnvelope);

    fn is_ready(&self) -> bool;

    async fn close(&self);
}
