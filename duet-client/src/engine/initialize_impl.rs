use duet_core::RoomId;
use tracing::{info, warn};

use crate::engine::CallEngine;
use crate::error::ClientError;
use crate::event::ClientEvent;
use crate::provider::MediaKind;
use crate::state::NegotiationState;

impl CallEngine {
    pub(super) async fn initialize(
        &mut self,
        room_id: Option<RoomId>,
    ) -> Result<RoomId, ClientError> {
        self.require("initialize", self.state == NegotiationState::Idle)?;

        let room_id = room_id.unwrap_or_else(RoomId::generate);
        info!("Initializing call in room {}", room_id);
        self.room_id = Some(room_id.clone());
        self.emit(ClientEvent::Initialized {
            room_id: room_id.clone(),
        });

        self.set_state(NegotiationState::AwaitingMedia);
        let constraints = self.config.media;
        let media = match self.media_provider.acquire(&constraints, None).await {
            Ok(media) => media,
            Err(e) => {
                let err = ClientError::from(e);
                if err.kind().is_some_and(|k| k.is_fatal()) {
                    self.fail(&err).await;
                } else {
                    // Acquisition failures leave the engine ready for another attempt.
                    warn!("Local media acquisition failed: {}", err);
                    self.room_id = None;
                    self.set_state(NegotiationState::Idle);
                    self.emit_error(&err);
                }
                return Err(err);
            }
        };

        let audio = media.track(MediaKind::Audio).is_some();
        let video = media.track(MediaKind::Video).is_some();
        self.local_media = Some(media);
        self.emit(ClientEvent::LocalMediaReady { audio, video });
        self.set_state(NegotiationState::AwaitingPeer);

        // join-room goes out once the transport reports it is connected.
        if let Err(e) = self.transport.open(self.transport_tx.clone()).await {
            let err = ClientError::Transport(format!("{e:#}"));
            self.fail(&err).await;
            return Err(err);
        }

        Ok(room_id)
    }
}
