use duet_core::SignalEnvelope;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::engine::CallEngine;
use crate::error::ClientError;
use crate::provider::LinkEventSink;
use crate::state::NegotiationState;

impl CallEngine {
    /// Send now if the room is joined on this relay session, else hold until it is.
    pub(super) fn send_envelope(&mut self, envelope: SignalEnvelope) {
        if !self.joined {
            debug!("Holding {} until the room is joined", envelope.kind());
            self.outbox.push(envelope);
            return;
        }
        debug!("Sending {}", envelope.kind());
        self.transport.send(envelope);
    }

    /// `join-room` first, then everything held while not joined.
    pub(super) fn send_join(&mut self) {
        let Some(room_id) = self.room_id.clone() else {
            return;
        };
        info!("Joining room {}", room_id);
        self.transport.send(SignalEnvelope::JoinRoom { room_id });
        self.joined = true;

        for envelope in std::mem::take(&mut self.outbox) {
            debug!("Sending held {}", envelope.kind());
            self.transport.send(envelope);
        }
    }

    /// The relay session is gone; the next one starts outside the room.
    pub(super) fn leave_session(&mut self) {
        self.joined = false;
    }

    /// We were chosen as initiator: fresh link, offer out.
    pub(super) async fn start_offer(&mut self) {
        let Some(room_id) = self.room_id.clone() else {
            return;
        };
        self.flush_link().await;
        self.set_state(NegotiationState::Offering);

        if let Err(e) = self.create_link().await {
            return self.negotiation_failed(e).await;
        }
        let Some(link) = self.link.as_deref() else {
            return;
        };

        match link.create_offer().await {
            Ok(offer) => {
                info!("Created offer for room {}", room_id);
                self.send_envelope(SignalEnvelope::Offer { room_id, offer });
            }
            Err(e) => self.negotiation_failed(e.into()).await,
        }
    }

    /// The peer offered: fresh link, answer out, connected.
    pub(super) async fn answer_offer(&mut self, offer: Value) {
        let Some(room_id) = self.room_id.clone() else {
            return;
        };
        self.flush_link().await;
        self.set_state(NegotiationState::Answering);

        if let Err(e) = self.create_link().await {
            return self.negotiation_failed(e).await;
        }
        let Some(link) = self.link.as_deref() else {
            return;
        };

        match link.create_answer(&offer).await {
            Ok(answer) => {
                info!("Answered offer in room {}", room_id);
                self.send_envelope(SignalEnvelope::Answer { room_id, answer });
                self.set_state(NegotiationState::Connected);
            }
            Err(e) => self.negotiation_failed(e.into()).await,
        }
    }

    pub(super) async fn apply_answer(&mut self, answer: Value) {
        let Some(link) = self.link.as_deref() else {
            return self
                .negotiation_failed(ClientError::Negotiation(
                    "answer arrived without a peer link".into(),
                ))
                .await;
        };

        match link.apply_answer(&answer).await {
            Ok(()) => {
                info!("Remote answer applied");
                self.set_state(NegotiationState::Connected);
            }
            Err(e) => self.negotiation_failed(e.into()).await,
        }
    }

    pub(super) async fn apply_remote_candidate(&mut self, candidate: Value) {
        let Some(link) = self.link.as_deref() else {
            return;
        };
        // A single bad candidate does not doom the call.
        if let Err(e) = link.add_remote_candidate(&candidate).await {
            warn!("Failed to add remote ICE candidate: {:#}", e);
        }
    }

    /// Close and drop the current link, if any.
    pub(super) async fn flush_link(&mut self) {
        if let Some(link) = self.link.take() {
            self.link_generation += 1;
            debug!("Flushing peer link, next generation {}", self.link_generation);
            link.close().await;
        }
        self.remote_media_present = false;
        // Negotiation held for the old link is meaningless now.
        self.outbox.retain(|envelope| {
            matches!(
                envelope,
                SignalEnvelope::ChatMessage { .. } | SignalEnvelope::FileMessage { .. }
            )
        });
    }

    /// Negotiation failures are not fatal: drop the link and wait for the peer again.
    pub(super) async fn negotiation_failed(&mut self, err: ClientError) {
        warn!("Negotiation failed: {}", err);
        self.flush_link().await;
        self.set_state(NegotiationState::AwaitingPeer);
        self.emit_error(&err);
    }

    async fn create_link(&mut self) -> Result<(), ClientError> {
        let Some(media) = self.local_media.as_deref() else {
            return Err(ClientError::Negotiation("no local media to send".into()));
        };

        self.link_generation += 1;
        let sink = LinkEventSink::new(self.link_generation, self.link_tx.clone());
        let link = self
            .link_provider
            .create_link(&self.config.link_config(), media, sink)
            .await?;

        self.link = Some(link);
        Ok(())
    }
}
