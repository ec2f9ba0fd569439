//! HTTP application assembly: routes, static assets and middleware.

use std::path::Path;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use gg_domain::config::CorsConfig;

use crate::api;
use crate::state::AppState;

/// Build the complete application router for `state`.
pub fn build_app(state: AppState) -> anyhow::Result<Router> {
    let server = &state.config.server;

    // ── CORS layer (config-aware) ────────────────────────────────────
    let cors_layer = build_cors_layer(&server.cors);

    // ── Concurrency limit (backpressure protection) ────────────────
    let max_concurrent = server.max_concurrent_requests.max(1);
    tracing::info!(max_concurrent, "concurrency limit set");

    // ── Rate-limit layer (per-IP token bucket via governor) ─────────
    let governor_layer = match server.rate_limit.as_ref() {
        Some(rl) => {
            use tower_governor::governor::GovernorConfigBuilder;
            use tower_governor::GovernorLayer;

            let gov_config = GovernorConfigBuilder::default()
                .per_second(rl.requests_per_second)
                .burst_size(rl.burst_size)
                .finish()
                .ok_or_else(|| {
                    anyhow::anyhow!("rate_limit: requests_per_second and burst_size must be > 0")
                })?;

            tracing::info!(
                requests_per_second = rl.requests_per_second,
                burst_size = rl.burst_size,
                "per-IP rate limiting enabled"
            );
            Some(GovernorLayer {
                config: std::sync::Arc::new(gov_config),
            })
        }
        None => {
            tracing::info!("per-IP rate limiting disabled (no [server.rate_limit] in config)");
            None
        }
    };

    // ── Router ───────────────────────────────────────────────────────
    let mut router = api::router(&state);

    let static_dir = Path::new(&server.static_dir);
    if static_dir.is_dir() {
        tracing::info!(dir = %static_dir.display(), "serving static client");
        router = router.fallback_service(ServeDir::new(static_dir));
    } else {
        tracing::info!(dir = %static_dir.display(), "static directory not found, client not served");
    }

    let router = router
        .layer(cors_layer)
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_concurrent))
        .layer(TraceLayer::new_for_http());

    Ok(match governor_layer {
        Some(gov) => router.layer(gov).with_state(state),
        None => router.with_state(state),
    })
}

/// Build a [`CorsLayer`] from the configured allowed origins.
///
/// Origins may end in `:*` to allow any port on that host
/// (e.g. `http://localhost:*`). A lone `"*"` allows every origin.
pub fn build_cors_layer(cors: &CorsConfig) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];
    let headers = [header::CONTENT_TYPE, header::AUTHORIZATION];

    // allow_credentials is incompatible with wildcard origins.
    if cors.allowed_origins.len() == 1 && cors.allowed_origins[0] == "*" {
        tracing::warn!("CORS configured with wildcard \"*\": all origins allowed");
        return CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(methods)
            .allow_headers(headers);
    }

    // Partition into exact origins and wildcard-port patterns.
    let mut exact: Vec<HeaderValue> = Vec::new();
    let mut wildcard_prefixes: Vec<String> = Vec::new();

    for origin in &cors.allowed_origins {
        if origin.ends_with(":*") {
            wildcard_prefixes.push(origin.trim_end_matches('*').to_owned());
        } else if let Ok(hv) = origin.parse::<HeaderValue>() {
            exact.push(hv);
        } else {
            tracing::warn!(origin = %origin, "invalid CORS origin, skipping");
        }
    }

    let allow_origin = if wildcard_prefixes.is_empty() {
        AllowOrigin::list(exact)
    } else {
        AllowOrigin::predicate(move |origin, _| {
            if exact.iter().any(|e| e.as_bytes() == origin.as_bytes()) {
                return true;
            }
            origin_matches_any_port(origin.to_str().unwrap_or(""), &wildcard_prefixes)
        })
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(true)
}

fn origin_matches_any_port(origin: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|prefix| {
        origin
            .strip_prefix(prefix.as_str())
            .map(|port| !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()))
            .unwrap_or(false)
    })
}
