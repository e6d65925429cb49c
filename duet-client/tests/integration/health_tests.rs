use duet_client::{
    ClientConfig, ClientEvent, HealthIssue, IceTransportState, Severity,
};
use std::time::Duration;

use crate::utils::{MockMediaProvider, TestCall, init_tracing, room};

#[tokio::test]
async fn test_missing_local_media_is_unhealthy() {
    init_tracing();
    let call = TestCall::spawn();

    let report = call.handle.health().await.unwrap();
    assert!(report.issues.contains(&HealthIssue::LocalMediaAbsent));
    assert_eq!(report.worst(), Some(Severity::Error));
}

#[tokio::test]
async fn test_lost_capture_device_is_reported() {
    init_tracing();
    let mut call = TestCall::spawn();
    call.join(&room("12345678")).await;
    assert!(call.handle.health().await.unwrap().is_healthy());

    call.media.lose_current_stream();

    let report = call.handle.health().await.unwrap();
    assert_eq!(report.issues, vec![HealthIssue::LocalMediaAbsent]);
    assert_eq!(report.issues[0].code(), "local-media-absent");
}

#[tokio::test]
async fn test_checking_ice_is_a_warning() {
    init_tracing();
    let mut call = TestCall::spawn();
    call.connect_as_caller(&room("12345678")).await;
    call.links.set_ice_state(IceTransportState::Checking);

    let report = call.handle.health().await.unwrap();
    assert_eq!(
        report.issues,
        vec![HealthIssue::TransportDegraded(IceTransportState::Checking)]
    );
    assert_eq!(report.worst(), Some(Severity::Warning));
}

#[tokio::test]
async fn test_periodic_sampling_raises_degraded_event() {
    init_tracing();
    let config = ClientConfig {
        health_interval: Duration::from_millis(20),
        ..Default::default()
    };
    let mut call = TestCall::spawn_with(config, MockMediaProvider::new());
    call.join(&room("12345678")).await;
    call.media.lose_current_stream();

    let event = call
        .wait_for_event(|e| matches!(e, ClientEvent::HealthDegraded { .. }))
        .await;
    let ClientEvent::HealthDegraded { report } = event else {
        unreachable!()
    };
    assert!(report.issues.contains(&HealthIssue::LocalMediaAbsent));
    // Monitoring reports only; the call carries on.
    assert!(call.state().await.is_in_call());
}
