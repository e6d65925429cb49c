use duet_core::{RoomId, SignalEnvelope};
use serde_json::Value;
use tracing::info;

use crate::engine::CallEngine;
use crate::error::ClientError;
use crate::event::ClientEvent;
use crate::provider::{DeviceId, MediaKind};

impl CallEngine {
    pub(super) fn toggle_audio(&mut self) -> Result<bool, ClientError> {
        let enabled = self.toggle(MediaKind::Audio, "toggle_audio")?;
        self.emit(ClientEvent::AudioToggled { enabled });
        Ok(enabled)
    }

    pub(super) fn toggle_video(&mut self) -> Result<bool, ClientError> {
        let enabled = self.toggle(MediaKind::Video, "toggle_video")?;
        self.emit(ClientEvent::VideoToggled { enabled });
        Ok(enabled)
    }

    fn toggle(&self, kind: MediaKind, operation: &'static str) -> Result<bool, ClientError> {
        self.require(operation, self.state.accepts_toggles())?;
        let Some(media) = self.local_media.as_deref() else {
            return Err(ClientError::MissingTrack(kind));
        };
        let Some(enabled) = media.is_enabled(kind) else {
            return Err(ClientError::MissingTrack(kind));
        };

        media.set_enabled(kind, !enabled);
        info!("{:?} {}", kind, if enabled { "muted" } else { "unmuted" });
        Ok(!enabled)
    }

    pub(super) async fn switch_camera(&mut self) -> Result<DeviceId, ClientError> {
        self.require("switch_camera", self.state.accepts_toggles())?;

        let devices = self.media_provider.video_devices().await?;
        let current = self.local_media.as_ref().and_then(|m| m.video_device());
        let Some(next) = next_device(&devices, current.as_ref()) else {
            return Err(ClientError::Acquisition("no other camera available".into()));
        };

        let constraints = self.config.media;
        let media = self.media_provider.acquire(&constraints, Some(&next)).await?;
        if let Some(old) = self.local_media.as_deref() {
            for track in old.tracks() {
                media.set_enabled(track.kind, track.enabled);
            }
        }

        if let Some(link) = self.link.as_deref() {
            if let Err(e) = link.replace_local_media(&*media).await {
                media.release().await;
                return Err(e.into());
            }
        }

        if let Some(old) = self.local_media.replace(media) {
            old.release().await;
        }
        info!("Switched camera to {}", next);
        Ok(next)
    }

    pub(super) fn send_chat(&mut self, message: Value) -> Result<(), ClientError> {
        let room_id = self.room_for("send_chat")?;
        self.send_envelope(SignalEnvelope::ChatMessage { room_id, message });
        Ok(())
    }

    pub(super) fn send_file(&mut self, file_data: Value) -> Result<(), ClientError> {
        let room_id = self.room_for("send_file")?;
        self.send_envelope(SignalEnvelope::FileMessage { room_id, file_data });
        Ok(())
    }

    fn room_for(&self, operation: &'static str) -> Result<RoomId, ClientError> {
        match &self.room_id {
            Some(room_id) if !self.state.is_terminal() => Ok(room_id.clone()),
            _ => Err(ClientError::InvalidState {
                operation,
                state: self.state,
            }),
        }
    }
}

/// The device after `current`, wrapping around. `None` if there is no other one.
fn next_device(devices: &[DeviceId], current: Option<&DeviceId>) -> Option<DeviceId> {
    let Some(current) = current else {
        return devices.first().cloned();
    };
    let position = devices.iter().position(|d| d == current)?;
    let next = &devices[(position + 1) % devices.len()];
    (next != current).then(|| next.clone())
}
