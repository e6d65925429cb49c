use async_trait::async_trait;
use duet_client::{
    IceTransportState, LinkConfig, LinkError, LinkEventKind, LinkEventSink, LocalMedia,
    PeerLink, PeerLinkProvider,
};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

struct Inner {
    sinks: Mutex<Vec<LinkEventSink>>,
    offers: AtomicUsize,
    answers: AtomicUsize,
    applied_answers: AtomicUsize,
    closed: AtomicUsize,
    replaced_media: AtomicUsize,
    remote_candidates: Mutex<Vec<Value>>,
    ice_state: Mutex<IceTransportState>,
    fail_offers: AtomicBool,
}

/// Peer links that speak fake SDP and count what the engine asks of them.
#[derive(Clone)]
pub struct MockLinkProvider {
    inner: Arc<Inner>,
}

impl Default for MockLinkProvider {
    fn default() -> Self {
        Self {
            inner: Arc::new(Inner {
                sinks: Mutex::new(Vec::new()),
                offers: AtomicUsize::new(0),
                answers: AtomicUsize::new(0),
                applied_answers: AtomicUsize::new(0),
                closed: AtomicUsize::new(0),
                replaced_media: AtomicUsize::new(0),
                remote_candidates: Mutex::new(Vec::new()),
                ice_state: Mutex::new(IceTransportState::Connected),
                fail_offers: AtomicBool::new(false),
            }),
        }
    }
}

impl MockLinkProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn links_created(&self) -> usize {
        self.inner.sinks.lock().unwrap().len()
    }

    pub fn offers(&self) -> usize {
        self.inner.offers.load(Ordering::SeqCst)
    }

    pub fn answers(&self) -> usize {
        self.inner.answers.load(Ordering::SeqCst)
    }

    pub fn applied_answers(&self) -> usize {
        self.inner.applied_answers.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.inner.closed.load(Ordering::SeqCst)
    }

    pub fn replaced_media(&self) -> usize {
        self.inner.replaced_media.load(Ordering::SeqCst)
    }

    pub fn remote_candidates(&self) -> Vec<Value> {
        self.inner.remote_candidates.lock().unwrap().clone()
    }

    pub fn set_ice_state(&self, state: IceTransportState) {
        *self.inner.ice_state.lock().unwrap() = state;
    }

    pub fn fail_offers(&self, fail: bool) {
        self.inner.fail_offers.store(fail, Ordering::SeqCst);
    }

    /// Raise an event from the `n`th link created (0-based).
    pub fn emit_from(&self, n: usize, kind: LinkEventKind) {
        self.inner.sinks.lock().unwrap()[n].emit(kind);
    }

    /// Raise an event from the most recently created link.
    pub fn emit_latest(&self, kind: LinkEventKind) {
        let n = self.links_created() - 1;
        self.emit_from(n, kind);
    }
}

#[async_trait]
impl PeerLinkProvider for MockLinkProvider {
    async fn create_link(
        &self,
        _config: &LinkConfig,
        _media: &dyn LocalMedia,
        events: LinkEventSink,
    ) -> Result<Box<dyn PeerLink>, LinkError> {
        let generation = events.generation();
        self.inner.sinks.lock().unwrap().push(events);
        Ok(Box::new(MockLink {
            inner: self.inner.clone(),
            generation,
        }))
    }
}

struct MockLink {
    inner: Arc<Inner>,
    generation: u64,
}

fn expect_type(value: &Value, expected: &'static str) -> Result<(), LinkError> {
    if value["type"] == expected {
        Ok(())
    } else {
        Err(LinkError::MalformedPayload {
            what: expected,
            reason: format!("got {value}"),
        })
    }
}

#[async_trait]
impl PeerLink for MockLink {
    async fn create_offer(&self) -> Result<Value, LinkError> {
        if self.inner.fail_offers.load(Ordering::SeqCst) {
            return Err(LinkError::Other(anyhow::anyhow!("offer refused")));
        }
        self.inner.offers.fetch_add(1, Ordering::SeqCst);
        Ok(json!({"type": "offer", "sdp": format!("mock-offer-{}", self.generation)}))
    }

    async fn create_answer(&self, offer: &Value) -> Result<Value, LinkError> {
        expect_type(offer, "offer")?;
        self.inner.answers.fetch_add(1, Ordering::SeqCst);
        Ok(json!({"type": "answer", "sdp": format!("mock-answer-{}", self.generation)}))
    }

    async fn apply_answer(&self, answer: &Value) -> Result<(), LinkError> {
        expect_type(answer, "answer")?;
        self.inner.applied_answers.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn add_remote_candidate(&self, candidate: &Value) -> Result<(), LinkError> {
        self.inner
            .remote_candidates
            .lock()
            .unwrap()
            .push(candidate.clone());
        Ok(())
    }

    async fn replace_local_media(&self, _media: &dyn LocalMedia) -> Result<(), LinkError> {
        self.inner.replaced_media.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn transport_state(&self) -> IceTransportState {
        *self.inner.ice_state.lock().unwrap()
    }

    async fn close(&self) {
        self.inner.closed.fetch_add(1, Ordering::SeqCst);
    }
}
