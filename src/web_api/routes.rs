//! API Routes

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;

use crate::models::ApiResponse;
use crate::state::AppState;

/// Create API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health & Status
        .route("/healthz", get(super::health_check))
        .route("/api/status", get(super::service_status))
        // Capture session
        .route("/api/scan/session/start", post(start_session))
        .route("/api/scan/session/stop", post(stop_session))
        .route("/api/scan/session", get(get_session))
        // Lookup
        .route("/api/scan/lookup", post(submit_lookup))
        .route("/api/scan", get(get_scan))
        .route("/api/scan/:id", get(activate_scan))
        // WebSocket
        .route("/api/ws", get(websocket_handler))
        .with_state(state)
}

// ========================================
// Capture Session Handlers
// ========================================

async fn start_session(State(state): State<AppState>) -> impl IntoResponse {
    state.session.start().await;
    Json(ApiResponse::success(state.session.state().await))
}

async fn stop_session(State(state): State<AppState>) -> impl IntoResponse {
    state.session.stop().await;
    Json(ApiResponse::success(state.session.state().await))
}

async fn get_session(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(json!({
        "session": state.session.state().await,
        "detections": state.session.detections(),
    })))
}

// ========================================
// Lookup Handlers
// ========================================

#[derive(Debug, Deserialize)]
struct LookupRequest {
    text: String,
}

async fn submit_lookup(
    State(state): State<AppState>,
    Json(req): Json<LookupRequest>,
) -> crate::Result<impl IntoResponse> {
    let identifier = state.controller.submit_text(&req.text).await?;
    Ok(Json(ApiResponse::success(json!({
        "identifier": identifier,
        "lookup": state.controller.lookup_state().await,
    }))))
}

async fn get_scan(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(json!({
        "active_identifier": state.controller.active_identifier().await,
        "lookup": state.controller.lookup_state().await,
    })))
}

/// Deep link: the path segment is the identifier itself, no interpretation
async fn activate_scan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    state.controller.activate(&id).await;
    Json(ApiResponse::success(json!({
        "active_identifier": state.controller.active_identifier().await,
        "lookup": state.controller.lookup_state().await,
    })))
}

// ========================================
// WebSocket Handler
// ========================================

/// WebSocket upgrade handler
async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Handle WebSocket connection
async fn handle_websocket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    let (conn_id, mut rx) = state.hub.register().await;

    tracing::info!(connection_id = %conn_id, "WebSocket client connected");

    // Forward published scan events to the socket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg)).await.is_err() {
                break;
            }
        }
    });

    // Handle incoming messages (ping/pong and close)
    let recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Ping(data)) => {
                    // Pong is handled automatically by axum
                    tracing::trace!("Received ping: {:?}", data);
                }
                Ok(Message::Close(_)) => {
                    tracing::info!(connection_id = %conn_id, "WebSocket client disconnected");
                    break;
                }
                Err(e) => {
                    tracing::warn!(connection_id = %conn_id, error = %e, "WebSocket error");
                    break;
                }
                _ => {}
            }
        }
        conn_id
    });

    let conn_id = tokio::select! {
        _ = send_task => conn_id,
        result = recv_task => result.unwrap_or(conn_id),
    };

    state.hub.unregister(&conn_id).await;
}
