use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::llm_client::MODEL;
use crate::state::AppState;

/// GET /health
/// Returns service status and whether the backend is live or mocked.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "career-path-api",
        "mode": if state.gateway.is_available() { "live" } else { "mock" },
        "model": MODEL,
        "stageTimeoutSecs": state.config.stage_timeout.as_secs()
    }))
}
