use anyhow::{Context, Result};
use duet_core::RoomId;
use duet_server::{RelayConfig, SignalingService, serve};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;

/// Timeout for a single expected envelope (ms).
pub const SIGNAL_TIMEOUT_MS: u64 = 5000;

/// How long a client must stay silent to count as "received nothing" (ms).
pub const SILENCE_MS: u64 = 300;

pub struct TestRelay {
    pub addr: SocketAddr,
    pub service: SignalingService,
}

impl TestRelay {
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }
}

/// Start a relay on an ephemeral localhost port.
pub async fn spawn_relay() -> Result<TestRelay> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .context("Failed to bind relay listener")?;
    let addr = listener.local_addr()?;
    let service = SignalingService::new(&RelayConfig::default());

    let server = service.clone();
    tokio::spawn(async move {
        if let Err(e) = serve(listener, server).await {
            tracing::error!("[TestRelay] serve failed: {}", e);
        }
    });

    Ok(TestRelay { addr, service })
}

pub fn room(id: &str) -> RoomId {
    RoomId::parse(id).expect("valid test room id")
}

/// Poll `check` until it holds or `timeout_ms` elapses.
pub async fn wait_until<F, Fut>(timeout_ms: u64, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
