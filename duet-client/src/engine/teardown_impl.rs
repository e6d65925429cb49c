use tracing::{debug, error, info};

use crate::engine::CallEngine;
use crate::error::ClientError;
use crate::state::NegotiationState;

impl CallEngine {
    pub(super) async fn end_call(&mut self) {
        if self.state == NegotiationState::Closed {
            return;
        }
        info!("Ending call");
        self.shutdown().await;
    }

    /// Fatal failure: release everything first, then tell the UI.
    pub(super) async fn fail(&mut self, err: &ClientError) {
        error!("Call failed: {}", err);
        self.shutdown().await;
        self.emit_error(err);
    }

    pub(super) async fn shutdown(&mut self) {
        self.set_state(NegotiationState::Closing);

        self.flush_link().await;
        if let Some(media) = self.local_media.take() {
            media.release().await;
        }
        self.transport.close().await;
        self.leave_session();
        if !self.outbox.is_empty() {
            debug!("Dropping {} unsent envelopes", self.outbox.len());
            self.outbox.clear();
        }

        self.set_state(NegotiationState::Closed);
    }
}
