//! Client construction.
//!
//! Reads the [`LlmConfig`], resolves authentication and instantiates the
//! adapter matching `llm.provider.kind`. The result is shared by every
//! request and live session as an `Arc<dyn InferenceClient>`.

use std::sync::Arc;
use std::time::Duration;

use gg_domain::config::{LlmConfig, ProviderKind};
use gg_domain::error::Result;

use crate::google::GoogleClient;
use crate::openai_compat::OpenAiCompatClient;
use crate::traits::InferenceClient;

/// Build the configured inference client.
///
/// Fails with an auth error when no API key can be resolved.
pub fn build_client(config: &LlmConfig) -> Result<Arc<dyn InferenceClient>> {
    let pc = &config.provider;
    let timeout = Duration::from_millis(config.timeout_ms);

    let client: Arc<dyn InferenceClient> = match pc.kind {
        ProviderKind::Google => Arc::new(GoogleClient::from_config(pc, &config.chat_model, timeout)?),
        ProviderKind::OpenaiCompat => {
            Arc::new(OpenAiCompatClient::from_config(pc, &config.chat_model, timeout)?)
        }
    };

    tracing::info!(
        provider_id = %pc.id,
        kind = ?pc.kind,
        timeout_ms = config.timeout_ms,
        "registered inference provider"
    );

    Ok(client)
}
