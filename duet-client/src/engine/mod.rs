use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::event::ClientEvent;
use crate::health::HealthMonitor;
use crate::provider::{
    LinkEvent, LocalMedia, MediaProvider, PeerLink, PeerLinkProvider, SignalTransport,
    TransportEvent, TransportEventSink,
};
use crate::state::NegotiationState;
use duet_core::{RoomId, SignalEnvelope};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

mod call_handle;
mod handle_signal_impl;
mod health_impl;
mod initialize_impl;
mod link_event_impl;
mod media_controls_impl;
mod negotiate_impl;
mod teardown_impl;
mod transport_event_impl;

pub use call_handle::*;

/// Capacity of the UI command queue.
const COMMAND_BUFFER: usize = 32;

/// Everything the engine talks to besides the UI.
#[derive(Clone)]
pub struct Collaborators {
    pub media: Arc<dyn MediaProvider>,
    pub links: Arc<dyn PeerLinkProvider>,
    pub transport: Arc<dyn SignalTransport>,
}

/// The client's negotiation state machine.
///
/// A single task owns the state, the local media, the peer link and the
/// transport. UI requests, relay envelopes and peer link callbacks all arrive
/// as messages and are handled one at a time.
pub struct CallEngine {
    config: ClientConfig,
    state: NegotiationState,
    room_id: Option<RoomId>,

    media_provider: Arc<dyn MediaProvider>,
    link_provider: Arc<dyn PeerLinkProvider>,
    transport: Arc<dyn SignalTransport>,

    local_media: Option<Box<dyn LocalMedia>>,
    link: Option<Box<dyn PeerLink>>,
    /// Bumped for every new link; events from older links are ignored.
    link_generation: u64,
    remote_media_present: bool,
    /// `join-room` went out on the current relay session.
    joined: bool,
    /// Envelopes waiting for `join-room`; the relay drops them from non-members.
    outbox: Vec<SignalEnvelope>,

    health: HealthMonitor,

    command_rx: mpsc::Receiver<EngineCommand>,
    transport_tx: TransportEventSink,
    transport_rx: mpsc::UnboundedReceiver<TransportEvent>,
    link_tx: mpsc::UnboundedSender<LinkEvent>,
    link_rx: mpsc::UnboundedReceiver<LinkEvent>,
    events: mpsc::UnboundedSender<ClientEvent>,
}

impl CallEngine {
    pub fn new(
        config: ClientConfig,
        collaborators: Collaborators,
    ) -> (Self, CallHandle, mpsc::UnboundedReceiver<ClientEvent>) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (transport_tx, transport_rx) = mpsc::unbounded_channel();
        let (link_tx, link_rx) = mpsc::unbounded_channel();
        let (events, events_rx) = mpsc::unbounded_channel();

        let engine = Self {
            health: HealthMonitor::new(config.health_interval),
            config,
            state: NegotiationState::Idle,
            room_id: None,
            media_provider: collaborators.media,
            link_provider: collaborators.links,
            transport: collaborators.transport,
            local_media: None,
            link: None,
            link_generation: 0,
            remote_media_present: false,
            joined: false,
            outbox: Vec::new(),
            command_rx,
            transport_tx,
            transport_rx,
            link_tx,
            link_rx,
            events,
        };

        (engine, CallHandle::new(command_tx), events_rx)
    }

    /// Build an engine and run it on the current tokio runtime.
    pub fn spawn(
        config: ClientConfig,
        collaborators: Collaborators,
    ) -> (CallHandle, mpsc::UnboundedReceiver<ClientEvent>) {
        let (engine, handle, events) = Self::new(config, collaborators);
        tokio::spawn(engine.run());
        (handle, events)
    }

    /// Runs until every `CallHandle` is dropped.
    pub async fn run(mut self) {
        info!("Call engine started");
        let mut ticker = self.health.ticker();

        loop {
            // Pending relay and link events are applied before the next UI request.
            tokio::select! {
                biased;

                Some(event) = self.transport_rx.recv() => {
                    self.handle_transport_event(event).await;
                }
                Some(event) = self.link_rx.recv() => {
                    self.handle_link_event(event);
                }
                cmd = self.command_rx.recv() => {
                    let Some(cmd) = cmd else { break };
                    self.handle_command(cmd).await;
                }
                _ = ticker.tick() => self.on_health_tick(),
            }
        }

        if !self.state.is_terminal() && self.state != NegotiationState::Idle {
            self.shutdown().await;
        }
        info!("Call engine stopped");
    }

    async fn handle_command(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::Initialize { room_id, reply } => {
                let _ = reply.send(self.initialize(room_id).await);
            }
            EngineCommand::ToggleAudio { reply } => {
                let _ = reply.send(self.toggle_audio());
            }
            EngineCommand::ToggleVideo { reply } => {
                let _ = reply.send(self.toggle_video());
            }
            EngineCommand::SwitchCamera { reply } => {
                let _ = reply.send(self.switch_camera().await);
            }
            EngineCommand::SendChat { message, reply } => {
                let _ = reply.send(self.send_chat(message));
            }
            EngineCommand::SendFile { file_data, reply } => {
                let _ = reply.send(self.send_file(file_data));
            }
            EngineCommand::Health { reply } => {
                let _ = reply.send(self.sample_health());
            }
            EngineCommand::State { reply } => {
                let _ = reply.send(self.state);
            }
            EngineCommand::EndCall { reply } => {
                self.end_call().await;
                let _ = reply.send(());
            }
        }
    }

    fn set_state(&mut self, to: NegotiationState) {
        let from = self.state;
        if from == to {
            return;
        }
        debug!("State {} -> {}", from, to);
        self.state = to;
        self.emit(ClientEvent::StateChanged { from, to });
    }

    fn emit(&self, event: ClientEvent) {
        if self.events.send(event).is_err() {
            debug!("No event subscriber left");
        }
    }

    fn emit_error(&self, err: &ClientError) {
        if let Some(kind) = err.kind() {
            self.emit(ClientEvent::Error {
                kind,
                message: err.to_string(),
            });
        }
    }

    fn require(&self, operation: &'static str, allowed: bool) -> Result<(), ClientError> {
        if allowed {
            Ok(())
        } else {
            Err(ClientError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }
}
