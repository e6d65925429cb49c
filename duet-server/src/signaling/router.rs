use crate::config::RelayConfig;
use crate::signaling::{SignalingService, ws_handler};
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use duet_core::RoomId;
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub connections: usize,
    pub rooms: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedRoom {
    pub room_id: RoomId,
}

/// HTTP surface of the relay: the WebSocket endpoint plus two small JSON routes.
pub fn router(service: SignalingService) -> Router {
    // Browser clients are usually served from another origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .route("/api/rooms", post(create_room))
        .layer(cors)
        .with_state(service)
}

async fn health(State(service): State<SignalingService>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "ok",
        connections: service.registry().len(),
        rooms: service.rooms().room_count(),
    })
}

/// Hands out a fresh id. The room itself only exists once somebody joins it.
async fn create_room() -> Json<CreatedRoom> {
    let room_id = RoomId::generate();
    info!("Issued room id {}", room_id);
    Json(CreatedRoom { room_id })
}

/// Serve the relay on an already bound listener until it fails.
pub async fn serve(listener: TcpListener, service: SignalingService) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Signaling relay listening on ws://{}/ws", addr);
    }
    axum::serve(listener, router(service)).await
}

/// Bind `config.socket_addr()` and serve a fresh relay on it.
pub async fn run(config: RelayConfig) -> std::io::Result<()> {
    let listener = TcpListener::bind(config.socket_addr()).await?;
    serve(listener, SignalingService::new(&config)).await
}
