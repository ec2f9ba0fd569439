pub mod analyze;
pub mod health;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;

use gg_domain::error::{Error, ErrorKind};

use crate::state::AppState;

/// Room for multipart boundaries and the non-file fields on top of the
/// upload limit itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the API router.
pub fn router(state: &AppState) -> Router<AppState> {
    let upload_limit = state.config.server.max_upload_bytes + MULTIPART_OVERHEAD;

    Router::new()
        .route(
            "/api/analyze",
            post(analyze::analyze).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/analyze-text", post(analyze::analyze_text))
        .route("/api/health", get(health::health))
        .route("/api/models", get(health::models))
        .route("/api/live", get(crate::live::ws::live_ws))
}

// ── Error responses ─────────────────────────────────────────────────

pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

/// 503 for any inference route while no client is configured.
pub(crate) fn provider_unavailable() -> Response {
    api_error(
        StatusCode::SERVICE_UNAVAILABLE,
        "no inference provider configured",
    )
}

/// Map an analysis failure to a response. Validation problems are the
/// caller's fault; everything else is reported as a failed analysis.
pub(crate) fn analysis_error(err: &Error) -> Response {
    match err.kind() {
        ErrorKind::Validation => api_error(StatusCode::BAD_REQUEST, err.to_string()),
        _ => {
            tracing::warn!(kind = err.kind().as_str(), error = %err, "analysis failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "Analysis failed",
                    "details": err.to_string(),
                })),
            )
                .into_response()
        }
    }
}
