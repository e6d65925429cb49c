use duet_core::IceServerConfig;
use std::time::Duration;

/// Which kinds of local media a call wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            audio: true,
            video: true,
        }
    }
}

/// Configuration handed to a `PeerLinkProvider` for every new link.
#[derive(Debug, Clone, Default)]
pub struct LinkConfig {
    pub ice_servers: Vec<IceServerConfig>,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket url of the relay, e.g. `ws://localhost:4000/ws`.
    pub relay_url: String,
    /// How many times a lost relay connection is retried before giving up.
    pub reconnect_attempts: u32,
    /// Fixed pause between reconnect attempts.
    pub reconnect_delay: Duration,
    pub health_interval: Duration,
    pub ice_servers: Vec<IceServerConfig>,
    pub media: MediaConstraints,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            relay_url: "ws://localhost:4000/ws".to_owned(),
            reconnect_attempts: 3,
            reconnect_delay: Duration::from_secs(2),
            health_interval: Duration::from_secs(5),
            ice_servers: vec![IceServerConfig::stun(&[
                "stun:stun1.l.google.com:19302",
                "stun:stun2.l.google.com:19302",
            ])],
            media: MediaConstraints::default(),
        }
    }
}

impl ClientConfig {
    pub fn link_config(&self) -> LinkConfig {
        LinkConfig {
            ice_servers: self.ice_servers.clone(),
        }
    }
}
