use async_trait::async_trait;
use duet_client::{
    DeviceId, LocalMedia, MediaConstraints, MediaError, MediaKind, MediaProvider, TrackInfo,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy)]
pub enum MediaFailure {
    Unsupported,
    Denied,
}

#[derive(Default)]
struct Inner {
    cameras: Vec<DeviceId>,
    fail_next: Mutex<Option<MediaFailure>>,
    live_flags: Mutex<Vec<Arc<AtomicBool>>>,
    acquired: AtomicUsize,
}

/// Media provider whose streams the test can break on purpose.
#[derive(Clone)]
pub struct MockMediaProvider {
    inner: Arc<Inner>,
}

impl Default for MockMediaProvider {
    fn default() -> Self {
        Self::with_cameras(&["cam-0", "cam-1"])
    }
}

impl MockMediaProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cameras(cameras: &[&str]) -> Self {
        Self {
            inner: Arc::new(Inner {
                cameras: cameras.iter().map(|c| DeviceId((*c).to_owned())).collect(),
                ..Default::default()
            }),
        }
    }

    pub fn fail_next(&self, failure: MediaFailure) {
        *self.inner.fail_next.lock().unwrap() = Some(failure);
    }

    pub fn acquired(&self) -> usize {
        self.inner.acquired.load(Ordering::SeqCst)
    }

    /// Streams handed out that have not been released.
    pub fn live_streams(&self) -> usize {
        self.inner
            .live_flags
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.load(Ordering::SeqCst))
            .count()
    }

    /// Simulate the capture device of the newest stream going away.
    pub fn lose_current_stream(&self) {
        if let Some(flag) = self.inner.live_flags.lock().unwrap().last() {
            flag.store(false, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl MediaProvider for MockMediaProvider {
    async fn acquire(
        &self,
        constraints: &MediaConstraints,
        device: Option<&DeviceId>,
    ) -> Result<Box<dyn LocalMedia>, MediaError> {
        match self.inner.fail_next.lock().unwrap().take() {
            Some(MediaFailure::Unsupported) => {
                return Err(MediaError::Unsupported("no media devices api".into()));
            }
            Some(MediaFailure::Denied) => {
                return Err(MediaError::PermissionDenied("user dismissed prompt".into()));
            }
            None => {}
        }

        let camera = device.cloned().or_else(|| self.inner.cameras.first().cloned());
        let live = Arc::new(AtomicBool::new(true));
        self.inner.live_flags.lock().unwrap().push(live.clone());
        let n = self.inner.acquired.fetch_add(1, Ordering::SeqCst);

        let mut tracks = Vec::new();
        if constraints.audio {
            tracks.push((MediaKind::Audio, AtomicBool::new(true)));
        }
        if constraints.video {
            tracks.push((MediaKind::Video, AtomicBool::new(true)));
        }

        Ok(Box::new(MockMedia {
            stream_id: format!("stream-{n}"),
            tracks,
            camera: camera.filter(|_| constraints.video),
            live,
        }))
    }

    async fn video_devices(&self) -> Result<Vec<DeviceId>, MediaError> {
        Ok(self.inner.cameras.clone())
    }
}

struct MockMedia {
    stream_id: String,
    tracks: Vec<(MediaKind, AtomicBool)>,
    camera: Option<DeviceId>,
    live: Arc<AtomicBool>,
}

#[async_trait]
impl LocalMedia for MockMedia {
    fn stream_id(&self) -> &str {
        &self.stream_id
    }

    fn tracks(&self) -> Vec<TrackInfo> {
        self.tracks
            .iter()
            .map(|(kind, enabled)| TrackInfo {
                kind: *kind,
                id: format!("{}-{:?}", self.stream_id, kind),
                enabled: enabled.load(Ordering::SeqCst),
            })
            .collect()
    }

    fn set_enabled(&self, kind: MediaKind, enabled: bool) -> bool {
        match self.tracks.iter().find(|(k, _)| *k == kind) {
            Some((_, flag)) => {
                flag.store(enabled, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    fn video_device(&self) -> Option<DeviceId> {
        self.camera.clone()
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    async fn release(&self) {
        self.live.store(false, Ordering::SeqCst);
    }
}
