//! HTTP router: discovery, health, and the session endpoint.

use axum::extract::State;
use axum::http::HeaderName;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::ws;

/// Fixed identity string peers use to discover the service before
/// opening the session connection.
pub const SERVICE_IDENTITY: &str = "EasyEDA Auto Router";

/// Service health payload.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Whether a routing job is currently running.
    pub busy: bool,
}

/// GET /api/whois -- the discovery endpoint.
async fn whois() -> &'static str {
    SERVICE_IDENTITY
}

/// GET /health -- service status.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        busy: state.slot.is_busy(),
    })
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .route("/api/whois", get(whois))
        .route("/health", get(health))
        .route("/router", get(ws::ws_handler))
        // -- Middleware stack (applied bottom-up) --
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        // The session peer is a browser extension; origins vary per user.
        .layer(CorsLayer::permissive())
        .with_state(state)
}
