use duet_core::{RelayErrorCode, SignalEnvelope};
use serde_json::json;

use crate::integration::init_tracing;
use crate::utils::{TestClient, room, spawn_relay, wait_until};

#[tokio::test]
async fn test_third_peer_is_rejected_and_pair_unaffected() {
    init_tracing();
    let relay = spawn_relay().await.expect("relay");
    let room_id = room("12345678");

    let mut alice = TestClient::connect("alice", &relay.ws_url()).await.unwrap();
    let mut bob = TestClient::connect("bob", &relay.ws_url()).await.unwrap();
    let mut carol = TestClient::connect("carol", &relay.ws_url()).await.unwrap();

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

    carol.join(&room_id).await.unwrap();
    match carol.recv().await.unwrap() {
        SignalEnvelope::Error { code, room_id: rejected, .. } => {
            assert_eq!(code, RelayErrorCode::RoomFull);
            assert_eq!(rejected, Some(room_id.clone()));
        }
        other => panic!("expected room-full, got {other:?}"),
    }
    assert_eq!(
        relay.service.rooms().members(&room_id).await.map(|m| m.len()),
        Some(2)
    );

    // The rejected peer cannot inject into the pair.
    carol
        .send(&SignalEnvelope::ChatMessage {
            room_id: room_id.clone(),
            message: json!("let me in"),
        })
        .await
        .unwrap();
    alice.expect_silence().await.unwrap();
    bob.expect_silence().await.unwrap();
}
