use crate::config::LinkConfig;
use crate::error::LinkError;
use crate::provider::{
    IceTransportState, LinkEventKind, LinkEventSink, LocalMedia, MediaKind, PeerLink,
    PeerLinkProvider, TrackInfo,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use duet_core::IceServerConfig;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8, MediaEngine};
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_remote::TrackRemote;

/// Builds `RtcPeerLink`s.
#[derive(Debug, Clone, Copy, Default)]
pub struct RtcPeerLinkProvider;

#[async_trait]
impl PeerLinkProvider for RtcPeerLinkProvider {
    async fn create_link(
        &self,
        config: &LinkConfig,
        media: &dyn LocalMedia,
        events: LinkEventSink,
    ) -> Result<Box<dyn PeerLink>, LinkError> {
        let link = RtcPeerLink::new(config, media, events).await?;
        Ok(Box::new(link))
    }
}

/// A webrtc-rs peer connection carrying the local audio/video tracks.
pub struct RtcPeerLink {
    peer_connection: Arc<RTCPeerConnection>,
    senders: Vec<(MediaKind, Arc<RTCRtpSender>)>,
}

impl RtcPeerLink {
    pub async fn new(
        config: &LinkConfig,
        media: &dyn LocalMedia,
        events: LinkEventSink,
    ) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: config.ice_servers.iter().map(rtc_ice_server).collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .context("creating peer connection")?,
        );
        let generation = events.generation();

        // Trickle ICE: every local candidate goes out through the relay.
        let ice_events = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let events = ice_events.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let Ok(value) = serde_json::to_value(&init) else {
                    return;
                };
                events.emit(LinkEventKind::LocalCandidate(value));
            })
        }));

        let track_events = events.clone();
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let events = track_events.clone();

                Box::pin(async move {
                    let kind = match track.kind() {
                        RTPCodecType::Audio => MediaKind::Audio,
                        RTPCodecType::Video => MediaKind::Video,
                        _ => return,
                    };
                    events.emit(LinkEventKind::RemoteTrack(kind));
                })
            },
        ));

        let state_events = events;
        peer_connection.on_ice_connection_state_change(Box::new(
            move |s: RTCIceConnectionState| {
                let events = state_events.clone();

                Box::pin(async move {
                    info!("ICE state changed on link {}: {}", generation, s);
                    events.emit(LinkEventKind::IceStateChanged(ice_state(s)));
                })
            },
        ));

        let mut senders = Vec::new();
        for track in media.tracks() {
            let local = local_track(media.stream_id(), &track);
            let sender = peer_connection
                .add_track(local)
                .await
                .with_context(|| format!("adding local {:?} track", track.kind))?;
            senders.push((track.kind, sender));
        }

        Ok(Self {
            peer_connection,
            senders,
        })
    }
}

#[async_trait]
impl PeerLink for RtcPeerLink {
    async fn create_offer(&self) -> Result<Value, LinkError> {
        let offer = self
            .peer_connection
            .create_offer(None)
            .await
            .context("creating offer")?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await
            .context("installing local offer")?;
        Ok(session_payload(&offer))
    }

    async fn create_answer(&self, offer: &Value) -> Result<Value, LinkError> {
        let sdp = parse_session(offer, "offer")?;
        let desc = RTCSessionDescription::offer(sdp).context("parsing remote offer")?;
        self.peer_connection
            .set_remote_description(desc)
            .await
            .context("installing remote offer")?;

        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .context("creating answer")?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await
            .context("installing local answer")?;
        Ok(session_payload(&answer))
    }

    async fn apply_answer(&self, answer: &Value) -> Result<(), LinkError> {
        let sdp = parse_session(answer, "answer")?;
        let desc = RTCSessionDescription::answer(sdp).context("parsing remote answer")?;
        self.peer_connection
            .set_remote_description(desc)
            .await
            .context("installing remote answer")?;
        Ok(())
    }

    async fn add_remote_candidate(&self, candidate: &Value) -> Result<(), LinkError> {
        let init: RTCIceCandidateInit =
            serde_json::from_value(candidate.clone()).map_err(|e| LinkError::MalformedPayload {
                what: "ice-candidate",
                reason: e.to_string(),
            })?;
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .context("adding remote candidate")?;
        Ok(())
    }

    async fn replace_local_media(&self, media: &dyn LocalMedia) -> Result<(), LinkError> {
        for (kind, sender) in &self.senders {
            let Some(track) = media.track(*kind) else {
                continue;
            };
            sender
                .replace_track(Some(local_track(media.stream_id(), &track)))
                .await
                .with_context(|| format!("replacing local {kind:?} track"))?;
        }
        Ok(())
    }

    fn transport_state(&self) -> IceTransportState {
        ice_state(self.peer_connection.ice_connection_state())
    }

    async fn close(&self) {
        if let Err(e) = self.peer_connection.close().await {
            debug!("Error while closing peer connection: {}", e);
        }
    }
}

#[derive(Deserialize)]
struct SessionPayload {
    #[serde(rename = "type")]
    sdp_type: String,
    sdp: String,
}

/// `{type, sdp}` as browsers put it on the wire.
fn session_payload(desc: &RTCSessionDescription) -> Value {
    json!({ "type": desc.sdp_type.to_string(), "sdp": desc.sdp })
}

fn parse_session(value: &Value, expected: &'static str) -> Result<String, LinkError> {
    let payload: SessionPayload =
        serde_json::from_value(value.clone()).map_err(|e| LinkError::MalformedPayload {
            what: expected,
            reason: e.to_string(),
        })?;

    if payload.sdp_type != expected {
        return Err(LinkError::MalformedPayload {
            what: expected,
            reason: format!("type is {:?}", payload.sdp_type),
        });
    }
    Ok(payload.sdp)
}

fn local_track(stream_id: &str, track: &TrackInfo) -> Arc<dyn TrackLocal + Send + Sync> {
    let mime_type = match track.kind {
        MediaKind::Audio => MIME_TYPE_OPUS,
        MediaKind::Video => MIME_TYPE_VP8,
    };

    Arc::new(TrackLocalStaticSample::new(
        RTCRtpCodecCapability {
            mime_type: mime_type.to_owned(),
            ..Default::default()
        },
        track.id.clone(),
        stream_id.to_owned(),
    ))
}

fn rtc_ice_server(server: &IceServerConfig) -> RTCIceServer {
    RTCIceServer {
        urls: server.urls.clone(),
        username: server.username.clone().unwrap_or_default(),
        credential: server.credential.clone().unwrap_or_default(),
        ..Default::default()
    }
}

fn ice_state(state: RTCIceConnectionState) -> IceTransportState {
    match state {
        RTCIceConnectionState::Checking => IceTransportState::Checking,
        RTCIceConnectionState::Connected => IceTransportState::Connected,
        RTCIceConnectionState::Completed => IceTransportState::Completed,
        RTCIceConnectionState::Disconnected => IceTransportState::Disconnected,
        RTCIceConnectionState::Failed => IceTransportState::Failed,
        RTCIceConnectionState::Closed => IceTransportState::Closed,
        _ => IceTransportState::New,
    }
}
