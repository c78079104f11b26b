/// Route handlers for the Control API

use super::types::*;
use crate::chat::ChatRegistry;
use crate::manager::SharedStreamManager;
use crate::types::Tuning;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use sdrcast_core::ConnectionId;
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub streams: SharedStreamManager,
    pub chat: Arc<ChatRegistry>,
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/streams", get(list_streams))
        .route("/v1/streams/:id", get(get_stream))
        .route("/v1/streams/:id/reset", post(reset_stream))
        .route("/v1/streams/:id/tuning", post(tune_stream))
        .route("/v1/chat/history", get(chat_history))
        .route("/v1/health", get(health_check))
        .with_state(state)
}

fn not_found(id: ConnectionId) -> Response {
    let response = ErrorResponse::new("Stream not found", Some(id.to_string()));
    (StatusCode::NOT_FOUND, Json(response)).into_response()
}

/// GET /v1/streams - AGC state of every open stream
async fn list_streams(State(state): State<AppState>) -> Response {
    debug!("GET /v1/streams");

    let manager = state.streams.read().await;
    let response = StreamsResponse {
        streams: manager.snapshots(),
        settings: manager.settings().clone(),
    };

    Json(response).into_response()
}

/// GET /v1/streams/:id - AGC state of one stream
async fn get_stream(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    let id = ConnectionId::from(id);
    debug!("GET /v1/streams/{}", id);

    match state.streams.read().await.snapshot(id) {
        Some(snapshot) => Json(snapshot).into_response(),
        None => not_found(id),
    }
}

/// POST /v1/streams/:id/reset - Return a stream's AGC to its initial state
async fn reset_stream(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    let id = ConnectionId::from(id);
    info!("POST /v1/streams/{}/reset", id);

    let mut manager = state.streams.write().await;
    if !manager.contains(id) {
        return not_found(id);
    }

    match manager.reset(id) {
        Ok(()) => {
            let response = StreamUpdateResponse {
                success: true,
                message: format!("Reset AGC for stream {}", id),
                stream: manager.snapshot(id),
            };
            Json(response).into_response()
        }
        Err(e) => {
            error!("Failed to reset stream {}: {}", id, e);
            let response = ErrorResponse::new("Failed to reset stream", Some(e.to_string()));
            (StatusCode::INTERNAL_SERVER_ERROR, Json(response)).into_response()
        }
    }
}

/// POST /v1/streams/:id/tuning - Change target level or time constants
async fn tune_stream(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<Tuning>,
) -> Response {
    let id = ConnectionId::from(id);
    info!("POST /v1/streams/{}/tuning: {:?}", id, req);

    let mut manager = state.streams.write().await;
    if !manager.contains(id) {
        return not_found(id);
    }

    match manager.retune(id, &req) {
        Ok(()) => {
            let response = StreamUpdateResponse {
                success: true,
                message: format!("Updated AGC for stream {}", id),
                stream: manager.snapshot(id),
            };
            Json(response).into_response()
        }
        Err(e) => {
            error!("Rejected tuning for stream {}: {}", id, e);
            let response = ErrorResponse::new("Invalid tuning", Some(e.to_string()));
            (StatusCode::BAD_REQUEST, Json(response)).into_response()
        }
    }
}

/// GET /v1/chat/history - Stored chat lines, oldest first
async fn chat_history(State(state): State<AppState>) -> Response {
    debug!("GET /v1/chat/history");

    let response = ChatHistoryResponse {
        lines: state.chat.history().await,
        connections: state.chat.connection_count().await,
    };

    Json(response).into_response()
}

/// GET /v1/health - Health check
async fn health_check() -> Response {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
    .into_response()
}
