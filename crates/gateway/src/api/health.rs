use axum::extract::State;
use axum::response::{IntoResponse, Json};

use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /api/health — liveness probe, never calls the model
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "GeminiGuard",
        "version": env!("CARGO_PKG_VERSION"),
        "privacy": "zero-retention",
        "capabilities": ["vision", "text", "live", "audio-pending"],
        "uptime_secs": state.started_at.elapsed().as_secs(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /api/models — configured models and provider readiness
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn models(State(state): State<AppState>) -> impl IntoResponse {
    let llm = &state.config.llm;
    let live_model = state
        .config
        .live
        .model
        .clone()
        .unwrap_or_else(|| llm.chat_model.clone());

    Json(serde_json::json!({
        "vision": llm.vision_model,
        "chat": llm.chat_model,
        "live": live_model,
        "audio": "TTS pending",
        "provider": llm.provider.kind.label(),
        "ready": state.llm.is_some(),
        "error": state.llm_error,
        "privacy": "zero-retention",
    }))
}
