use crate::integration::init_tracing;
use crate::utils::{TestClient, room, spawn_relay, wait_until};

#[tokio::test]
async fn test_single_peer_joins_room() {
    init_tracing();
    let relay = spawn_relay().await.expect("relay");
    let room_id = room("12345678");

    let mut alice = TestClient::connect("alice", &relay.ws_url())
        .await
        .expect("alice connects");
    alice.join(&room_id).await.expect("join");

    let rooms = relay.service.rooms().clone();
    let joined = wait_until(2000, || {
        let rooms = rooms.clone();
        let room_id = room_id.clone();
        async move { rooms.members(&room_id).await.is_some_and(|m| m.len() == 1) }
    })
    .await;
    assert!(joined, "alice should be the only member");

    // A lone member is never asked to start a call.
    alice.expect_silence().await.expect("no start-call yet");
    assert_eq!(relay.service.registry().len(), 1);

    alice.close().await.expect("close");
}
