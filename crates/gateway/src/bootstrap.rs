//! AppState construction extracted from `main.rs`.

use std::sync::Arc;

use gg_domain::config::{Config, ConfigSeverity, LlmStartupPolicy};

use crate::state::AppState;

/// Validate config, build the inference client and return the [`AppState`].
///
/// A missing API key is fatal only under `llm.startup_policy = "require_one"`;
/// otherwise the server starts and inference endpoints answer 503.
pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    let errors = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .count();
    if errors > 0 {
        anyhow::bail!("config validation failed with {errors} error(s)");
    }

    // ── Inference client ─────────────────────────────────────────────
    match gg_providers::build_client(&config.llm) {
        Ok(client) => {
            tracing::info!(
                provider = client.provider_id(),
                vision_model = %config.llm.vision_model,
                chat_model = %config.llm.chat_model,
                "inference provider ready"
            );
            Ok(AppState::new(config, Some(client)))
        }
        Err(e) => match config.llm.startup_policy {
            LlmStartupPolicy::RequireOne => {
                anyhow::bail!("no inference provider available: {e}")
            }
            LlmStartupPolicy::AllowNone => {
                tracing::warn!(error = %e, "no inference provider; analysis and live endpoints will return 503");
                let mut state = AppState::new(config, None);
                state.llm_error = Some(e.to_string());
                Ok(state)
            }
        },
    }
}
