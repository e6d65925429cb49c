use duet_client::{ClientEvent, ErrorKind, NegotiationState, TransportEvent};
use duet_core::SignalEnvelope;

use crate::utils::{TestCall, init_tracing, room};

#[tokio::test]
async fn test_transport_loss_reconnects_and_rejoins() {
    init_tracing();
    let mut call = TestCall::spawn();
    let room_id = room("12345678");
    call.connect_as_caller(&room_id).await;
    call.drain_events();

    call.transport.inject(TransportEvent::Disconnected);
    call.transport.inject(TransportEvent::Reconnecting { attempt: 1 });
    call.settle().await;

    assert_eq!(call.state().await, NegotiationState::Reconnecting);
    assert!(
        call.drain_events()
            .contains(&ClientEvent::Reconnecting { attempt: 1 })
    );

    // Chat typed while offline is held, not refused, and not sent yet.
    call.handle
        .send_chat(serde_json::json!("still there?"))
        .await
        .unwrap();
    assert_eq!(call.transport.count_sent("chat-message"), 0);

    call.transport.inject(TransportEvent::Connected);
    call.settle().await;

    assert_eq!(call.state().await, NegotiationState::AwaitingPeer);
    assert_eq!(call.links.closed(), 1);
    assert_eq!(call.transport.count_sent("join-room"), 2);

    // The relay drops frames from non-members, so the rejoin must come first.
    let sent = call.transport.sent();
    assert_eq!(
        &sent[sent.len() - 2..],
        &[
            SignalEnvelope::JoinRoom {
                room_id: room_id.clone()
            },
            SignalEnvelope::ChatMessage {
                room_id,
                message: serde_json::json!("still there?"),
            },
        ]
    );
}

#[tokio::test]
async fn test_stale_negotiation_is_not_replayed_after_rejoin() {
    init_tracing();
    let mut call = TestCall::spawn();
    let room_id = room("12345678");
    call.join(&room_id).await;
    call.transport.deliver(SignalEnvelope::StartCall {
        room_id: room_id.clone(),
    });
    call.wait_for_state(NegotiationState::Offering).await;

    call.transport.inject(TransportEvent::Disconnected);
    call.settle().await;
    assert_eq!(call.state().await, NegotiationState::Reconnecting);

    // A candidate from the old link while offline is held, then dropped with the link.
    call.links.emit_latest(duet_client::LinkEventKind::LocalCandidate(
        serde_json::json!({"candidate": "stale"}),
    ));
    call.settle().await;

    call.transport.inject(TransportEvent::Connected);
    call.settle().await;

    assert_eq!(call.transport.count_sent("ice-candidate"), 0);
    assert_eq!(
        call.transport.sent().last(),
        Some(&SignalEnvelope::JoinRoom { room_id })
    );
}

#[tokio::test]
async fn test_exhausted_reconnects_are_fatal() {
    init_tracing();
    let mut call = TestCall::spawn();
    call.connect_as_caller(&room("12345678")).await;

    for attempt in 1..=3 {
        call.transport
            .inject(TransportEvent::Reconnecting { attempt });
    }
    call.transport
        .inject(TransportEvent::Failed("relay unreachable".into()));

    let event = call
        .wait_for_event(|e| matches!(e, ClientEvent::Error { .. }))
        .await;
    assert!(matches!(
        event,
        ClientEvent::Error {
            kind: ErrorKind::Transport,
            ..
        }
    ));

    // Resources were gone before the error was emitted.
    assert_eq!(call.state().await, NegotiationState::Closed);
    assert_eq!(call.media.live_streams(), 0);
    assert_eq!(call.links.closed(), 1);
}
