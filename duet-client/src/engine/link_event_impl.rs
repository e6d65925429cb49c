use duet_core::SignalEnvelope;
use tracing::{debug, info, warn};

use crate::engine::CallEngine;
use crate::event::ClientEvent;
use crate::provider::{IceTransportState, LinkEvent, LinkEventKind};

impl CallEngine {
    pub(super) fn handle_link_event(&mut self, event: LinkEvent) {
        if event.generation != self.link_generation || self.link.is_none() {
            debug!("Discarding event from stale link {}", event.generation);
            return;
        }

        match event.kind {
            LinkEventKind::LocalCandidate(candidate) => {
                if let Some(room_id) = self.room_id.clone() {
                    self.send_envelope(SignalEnvelope::IceCandidate { room_id, candidate });
                }
            }

            LinkEventKind::RemoteTrack(kind) => {
                debug!("Remote {:?} track arrived", kind);
                if !self.remote_media_present {
                    self.remote_media_present = true;
                    info!("Remote stream connected");
                    self.emit(ClientEvent::RemoteStreamConnected);
                }
            }

            LinkEventKind::IceStateChanged(state) => match state {
                IceTransportState::Failed | IceTransportState::Disconnected => {
                    warn!("ICE transport {:?}", state);
                }
                _ => debug!("ICE transport {:?}", state),
            },
        }
    }
}
