use axum::{Json, extract::State, response::IntoResponse};
use std::sync::Arc;

use crate::state::AppState;

// Liveness check
pub async fn root_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "hint": "Use /weather"
    }))
}

pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let now = state.gateway.now();
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": now.to_rfc3339(),
        "uptime_secs": (now - state.started_at).num_seconds(),
        "daily_usage": state.gateway.daily_usage(),
        "rate_limit_per_minute": state.gateway.rate_limiter().limit(),
    }))
}
