use duet_core::SignalEnvelope;
use tracing::{debug, info, warn};

use crate::engine::CallEngine;
use crate::error::ClientError;
use crate::event::ClientEvent;
use crate::state::NegotiationState::{self, *};

impl CallEngine {
    pub(super) async fn handle_signal(&mut self, envelope: SignalEnvelope) {
        if !self.state.is_in_call() {
            debug!("Ignoring {} while {}", envelope.kind(), self.state);
            return;
        }
        if let Some(room_id) = envelope.room_id() {
            if self.room_id.as_ref() != Some(room_id) {
                debug!("Ignoring {} for foreign room {}", envelope.kind(), room_id);
                return;
            }
        }

        let state: NegotiationState = self.state;
        match envelope {
            SignalEnvelope::StartCall { .. } => match state {
                AwaitingPeer | Connected => {
                    info!("Relay chose us to start the call");
                    self.start_offer().await;
                }
                _ => debug!("Ignoring start-call while {}", state),
            },

            SignalEnvelope::Offer { offer, .. } => match state {
                AwaitingPeer | Answering | Connected => self.answer_offer(offer).await,
                Offering => {
                    let err = ClientError::Negotiation("received an offer while offering".into());
                    self.negotiation_failed(err).await;
                }
                _ => debug!("Ignoring offer while {}", state),
            },

            SignalEnvelope::Answer { answer, .. } => match state {
                Offering => self.apply_answer(answer).await,
                AwaitingPeer | Answering | Connected => {
                    let err = ClientError::Negotiation(format!("unexpected answer while {state}"));
                    self.negotiation_failed(err).await;
                }
                _ => debug!("Ignoring answer while {}", state),
            },

            SignalEnvelope::IceCandidate { candidate, .. } => match state {
                Offering | Connected if self.link.is_some() => {
                    self.apply_remote_candidate(candidate).await;
                }
                _ => debug!("Dropping stale ice-candidate while {}", state),
            },

            SignalEnvelope::PeerLeft { .. } => match state {
                Offering | Answering | Connected => {
                    info!("Peer left the call");
                    self.flush_link().await;
                    self.set_state(AwaitingPeer);
                    self.emit(ClientEvent::PeerLeft);
                }
                _ => debug!("Ignoring peer-left while {}", state),
            },

            SignalEnvelope::ChatMessage { message, .. } => {
                self.emit(ClientEvent::ChatReceived { message });
            }

            SignalEnvelope::FileMessage { file_data, .. } => {
                self.emit(ClientEvent::FileReceived { file_data });
            }

            SignalEnvelope::Error { code, message, .. } => {
                warn!("Relay error {:?}: {}", code, message);
                self.emit_error(&ClientError::Relay(message));
            }

            SignalEnvelope::JoinRoom { .. } => debug!("Ignoring join-room from relay"),
        }
    }
}
