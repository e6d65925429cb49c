use crate::error::ClientError;
use crate::health::HealthReport;
use crate::provider::DeviceId;
use crate::state::NegotiationState;
use duet_core::RoomId;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

pub type Reply<T> = oneshot::Sender<Result<T, ClientError>>;

/// Requests from the UI to the engine.
#[derive(Debug)]
pub enum EngineCommand {
    Initialize {
        room_id: Option<RoomId>,
        reply: Reply<RoomId>,
    },
    ToggleAudio {
        reply: Reply<bool>,
    },
    ToggleVideo {
        reply: Reply<bool>,
    },
    SwitchCamera {
        reply: Reply<DeviceId>,
    },
    SendChat {
        message: Value,
        reply: Reply<()>,
    },
    SendFile {
        file_data: Value,
        reply: Reply<()>,
    },
    Health {
        reply: oneshot::Sender<HealthReport>,
    },
    State {
        reply: oneshot::Sender<NegotiationState>,
    },
    EndCall {
        reply: oneshot::Sender<()>,
    },
}

/// Cloneable front door to a running `CallEngine`.
#[derive(Debug, Clone)]
pub struct CallHandle {
    tx: mpsc::Sender<EngineCommand>,
}

impl CallHandle {
    pub(crate) fn new(tx: mpsc::Sender<EngineCommand>) -> Self {
        Self { tx }
    }

    /// Acquire media, connect to the relay and join `room_id`, or a freshly
    /// generated room when `None`. Returns the room joined.
    pub async fn initialize(&self, room_id: Option<RoomId>) -> Result<RoomId, ClientError> {
        self.request(|reply| EngineCommand::Initialize { room_id, reply })
            .await?
    }

    /// Flip the local audio track. Returns whether it is now enabled.
    pub async fn toggle_audio(&self) -> Result<bool, ClientError> {
        self.request(|reply| EngineCommand::ToggleAudio { reply }).await?
    }

    /// Flip the local video track. Returns whether it is now enabled.
    pub async fn toggle_video(&self) -> Result<bool, ClientError> {
        self.request(|reply| EngineCommand::ToggleVideo { reply }).await?
    }

    /// Move capture to the next video device.
    pub async fn switch_camera(&self) -> Result<DeviceId, ClientError> {
        self.request(|reply| EngineCommand::SwitchCamera { reply }).await?
    }

    pub async fn send_chat(&self, message: Value) -> Result<(), ClientError> {
        self.request(|reply| EngineCommand::SendChat { message, reply })
            .await?
    }

    pub async fn send_file(&self, file_data: Value) -> Result<(), ClientError> {
        self.request(|reply| EngineCommand::SendFile { file_data, reply })
            .await?
    }

    pub async fn health(&self) -> Result<HealthReport, ClientError> {
        self.request(|reply| EngineCommand::Health { reply }).await
    }

    pub async fn state(&self) -> Result<NegotiationState, ClientError> {
        self.request(|reply| EngineCommand::State { reply }).await
    }

    /// Release media, close the link and the transport. The engine ends in `closed`.
    pub async fn end_call(&self) -> Result<(), ClientError> {
        self.request(|reply| EngineCommand::EndCall { reply }).await
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> EngineCommand,
    ) -> Result<T, ClientError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| ClientError::EngineStopped)?;
        rx.await.map_err(|_| ClientError::EngineStopped)
    }
}
