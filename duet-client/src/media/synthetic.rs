use crate::config::MediaConstraints;
use crate::error::MediaError;
use crate::provider::{DeviceId, LocalMedia, MediaKind, MediaProvider, TrackInfo};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;
use uuid::Uuid;

/// Media source without capture hardware: tracks exist and can be toggled,
/// but carry no samples. Used by the headless CLI and tests.
#[derive(Debug, Clone)]
pub struct SyntheticMediaProvider {
    cameras: Vec<DeviceId>,
}

impl SyntheticMediaProvider {
    pub fn new(cameras: Vec<DeviceId>) -> Self {
        Self { cameras }
    }
}

impl Default for SyntheticMediaProvider {
    fn default() -> Self {
        Self::new(vec![
            DeviceId("synthetic-front".to_owned()),
            DeviceId("synthetic-back".to_owned()),
        ])
    }
}

#[async_trait]
impl MediaProvider for SyntheticMediaProvider {
    async fn acquire(
        &self,
        constraints: &MediaConstraints,
        device: Option<&DeviceId>,
    ) -> Result<Box<dyn LocalMedia>, MediaError> {
        if !constraints.audio && !constraints.video {
            return Err(MediaError::PermissionDenied(
                "neither audio nor video was requested".to_owned(),
            ));
        }

        let camera = match device {
            Some(id) if !self.cameras.contains(id) => {
                return Err(MediaError::DeviceNotFound(id.to_string()));
            }
            Some(id) => Some(id.clone()),
            None if constraints.video => self.cameras.first().cloned(),
            None => None,
        };
        if constraints.video && camera.is_none() {
            return Err(MediaError::DeviceNotFound("no camera".to_owned()));
        }

        let mut tracks = Vec::new();
        if constraints.audio {
            tracks.push(SyntheticTrack::new(MediaKind::Audio));
        }
        if constraints.video {
            tracks.push(SyntheticTrack::new(MediaKind::Video));
        }

        let media = SyntheticMedia {
            stream_id: Uuid::new_v4().to_string(),
            tracks,
            camera: camera.filter(|_| constraints.video),
            live: AtomicBool::new(true),
        };
        debug!("Acquired synthetic stream {}", media.stream_id);
        Ok(Box::new(media))
    }

    async fn video_devices(&self) -> Result<Vec<DeviceId>, MediaError> {
        Ok(self.cameras.clone())
    }
}

#[derive(Debug)]
struct SyntheticTrack {
    kind: MediaKind,
    id: String,
    enabled: AtomicBool,
}

impl SyntheticTrack {
    fn new(kind: MediaKind) -> Self {
        Self {
            kind,
            id: Uuid::new_v4().to_string(),
            enabled: AtomicBool::new(true),
        }
    }
}

#[derive(Debug)]
pub struct SyntheticMedia {
    stream_id: String,
    tracks: Vec<SyntheticTrack>,
    camera: Option<DeviceId>,
    live: AtomicBool,
}

#[async_trait]
impl LocalMedia for SyntheticMedia {
    fn stream_id(&self) -> &str {
        &self.stream_id
    }

    fn tracks(&self) -> Vec<TrackInfo> {
        self.tracks
            .iter()
            .map(|t| TrackInfo {
                kind: t.kind,
                id: t.id.clone(),
                enabled: t.enabled.load(Ordering::Acquire),
            })
            .collect()
    }

    fn set_enabled(&self, kind: MediaKind, enabled: bool) -> bool {
        let Some(track) = self.tracks.iter().find(|t| t.kind == kind) else {
            return false;
        };
        track.enabled.store(enabled, Ordering::Release);
        true
    }

    fn video_device(&self) -> Option<DeviceId> {
        self.camera.clone()
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    async fn release(&self) {
        self.live.store(false, Ordering::Release);
        debug!("Released synthetic stream {}", self.stream_id);
    }
}
