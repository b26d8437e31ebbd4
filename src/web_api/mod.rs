//! WebAPI - REST API Endpoints
//!
//! ## Responsibilities
//!
//! - HTTP API routes
//! - Request validation
//! - Response formatting

mod routes;

pub use routes::create_router;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::models::{HealthResponse, StatusResponse};
use crate::state::AppState;

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_sec: state.started_at.elapsed().as_secs(),
        remote_configured: state.resolver.remote_configured(),
        fallback_records: state.fallback.len().await,
    };

    Json(response)
}

/// Service status endpoint
pub async fn service_status(State(state): State<AppState>) -> impl IntoResponse {
    let response = StatusResponse {
        session_state: state.session.state().await,
        active_identifier: state.controller.active_identifier().await,
        lookup: state.controller.lookup_state().await,
        ws_connections: state.hub.connection_count(),
    };

    Json(response)
}
