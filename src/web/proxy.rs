//! Thin pass-through proxies: mutual servers and bot status.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use super::server::AppState;
use crate::session;

/// GET /api/mutual-servers - guilds shared between the user and the bot.
/// No permission gate; the backend filters by the forwarded token.
pub async fn mutual_servers(State(state): State<AppState>, headers: axum::http::HeaderMap) -> Response {
    let Some(token) = session::token_from_headers(&headers) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "error": "Unauthorized" })),
        )
            .into_response();
    };

    match state.backend.mutual_servers(&token).await {
        Ok(data) => Json(data).into_response(),
        Err(err) => {
            error!("Mutual servers proxy failed: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": err.to_string() })),
            )
                .into_response()
        }
    }
}

/// GET /api/status - public liveness/metrics passthrough
pub async fn status(State(state): State<AppState>) -> Response {
    match state.backend.status().await {
        Ok(data) => Json(data).into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
    }
}
