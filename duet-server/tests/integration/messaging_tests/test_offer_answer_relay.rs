use duet_core::SignalEnvelope;
use serde_json::json;

use crate::integration::init_tracing;
use crate::utils::{TestClient, TestRelay, room, spawn_relay, wait_until};

async fn paired(relay: &TestRelay, id: &str) -> (TestClient, TestClient) {
    let room_id = room(id);
    let mut alice = TestClient::connect("alice", &relay.ws_url()).await.unwrap();
    let mut bob = TestClient::connect("bob", &relay.ws_url()).await.unwrap();

    alice.join(&room_id).await.unwrap();
    assert!(
        wait_until(2000, || {
            let rooms = relay.service.rooms().clone();
            let room_id = room_id.clone();
            async move { rooms.members(&room_id).await.is_some() }
        })
        .await
    );
    bob.join(&room_id).await.unwrap();
    assert!(matches!(alice.recv().await.unwrap(), SignalEnvelope::StartCall { .. }));

    (alice, bob)
}

#[tokio::test]
async fn test_offer_and_answer_reach_only_the_peer() {
    init_tracing();
    let relay = spawn_relay().await.expect("relay");
    let room_id = room("12345678");
    let (mut alice, mut bob) = paired(&relay, "12345678").await;

    let offer = SignalEnvelope::Offer {
        room_id: room_id.clone(),
        offer: json!({"type": "offer", "sdp": "v=0\r\no=alice"}),
    };
    alice.send(&offer).await.unwrap();
    assert_eq!(bob.recv().await.unwrap(), offer);
    alice.expect_silence().await.unwrap();

    let answer = SignalEnvelope::Answer {
        room_id: room_id.clone(),
        answer: json!({"type": "answer", "sdp": "v=0\r\no=bob"}),
    };
    bob.send(&answer).await.unwrap();
    assert_eq!(alice.recv().await.unwrap(), answer);
    bob.expect_silence().await.unwrap();
}

#[tokio::test]
async fn test_payloads_are_relayed_verbatim() {
    init_tracing();
    let relay = spawn_relay().await.expect("relay");
    let room_id = room("24682468");
    let (mut alice, mut bob) = paired(&relay, "24682468").await;

    let candidate = SignalEnvelope::IceCandidate {
        room_id: room_id.clone(),
        candidate: json!({
            "candidate": "candidate:1 1 udp 2122260223 192.168.1.2 54321 typ host",
            "sdpMid": "0",
            "sdpMLineIndex": 0,
            "extra": {"nested": [1, 2, 3]}
        }),
    };
    bob.send(&candidate).await.unwrap();
    assert_eq!(alice.recv().await.unwrap(), candidate);

    let file = SignalEnvelope::FileMessage {
        room_id,
        file_data: json!({"name": "notes.txt", "size": 12, "data": "aGVsbG8gd29ybGQ="}),
    };
    alice.send(&file).await.unwrap();
    assert_eq!(bob.recv().await.unwrap(), file);
}
