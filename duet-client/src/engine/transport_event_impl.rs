use tracing::{debug, info, warn};

use crate::engine::CallEngine;
use crate::error::ClientError;
use crate::event::ClientEvent;
use crate::provider::TransportEvent;
use crate::state::NegotiationState;

impl CallEngine {
    pub(super) async fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected => match self.state {
                NegotiationState::AwaitingPeer => self.send_join(),
                NegotiationState::Reconnecting => {
                    info!("Relay connection restored, rejoining");
                    // The old link's signaling context is gone; start over.
                    self.flush_link().await;
                    self.set_state(NegotiationState::AwaitingPeer);
                    self.send_join();
                }
                state => debug!("Transport connected while {}", state),
            },

            TransportEvent::Message(envelope) => self.handle_signal(envelope).await,

            TransportEvent::Disconnected => {
                self.leave_session();
                if self.state.is_in_call() {
                    warn!("Lost connection to the relay");
                    self.set_state(NegotiationState::Reconnecting);
                }
            }

            TransportEvent::Reconnecting { attempt } => {
                self.leave_session();
                if self.state.is_in_call() {
                    info!("Reconnecting to the relay, attempt {}", attempt);
                    self.set_state(NegotiationState::Reconnecting);
                    self.emit(ClientEvent::Reconnecting { attempt });
                }
            }

            TransportEvent::Failed(reason) => {
                self.leave_session();
                if !self.state.is_terminal() {
                    self.fail(&ClientError::Transport(reason)).await;
                }
            }
        }
    }
}
