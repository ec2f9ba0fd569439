//! OpenAI-compatible adapter.
//!
//! Works with any endpoint that follows the OpenAI chat completions contract,
//! including Gemini's `/v1beta/openai/` surface. Inline payloads are sent as
//! `image_url` parts carrying a `data:` URI.

use std::time::Duration;

use base64::Engine as _;
use gg_domain::config::ProviderConfig;
use gg_domain::content::{Message, Part, Role};
use gg_domain::error::{Error, Result};
use serde_json::Value;

use crate::traits::{GenerateRequest, GenerateResponse, InferenceClient, Usage};
use crate::util::{from_reqwest, resolve_api_key, status_error, wipe_json};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Adapter struct
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// An inference client for any OpenAI-compatible API endpoint.
pub struct OpenAiCompatClient {
    id: String,
    base_url: String,
    api_key: String,
    default_model: String,
    client: reqwest::Client,
}

impl OpenAiCompatClient {
    /// Create a new client from the deserialized provider config.
    pub fn from_config(cfg: &ProviderConfig, default_model: &str, timeout: Duration) -> Result<Self> {
        let api_key = resolve_api_key(&cfg.auth)?;
        Self::with_key(cfg, api_key, default_model, timeout)
    }

    /// Create a client with an already-resolved key.
    pub fn with_key(
        cfg: &ProviderConfig,
        api_key: String,
        default_model: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            id: cfg.id.clone(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key,
            default_model: default_model.to_string(),
            client,
        })
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Message serialization helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub(crate) fn build_chat_body(req: &GenerateRequest, model: &str) -> Value {
    let mut messages: Vec<Value> = Vec::with_capacity(req.messages.len() + 1);
    if let Some(ref system) = req.system {
        messages.push(serde_json::json!({
            "role": "system",
            "content": system,
        }));
    }
    messages.extend(req.messages.iter().map(msg_to_openai));

    let mut body = serde_json::json!({
        "model": model,
        "messages": messages,
    });
    if let Some(max) = req.max_output_tokens {
        body["max_tokens"] = serde_json::json!(max);
    }
    body
}

fn msg_to_openai(msg: &Message) -> Value {
    let role = match msg.role {
        Role::User => "user",
        Role::Assistant => "assistant",
    };

    // Text-only messages use the plain string form; assistant turns must.
    let has_binary = msg.parts.iter().any(|p| matches!(p, Part::InlineData { .. }));
    if !has_binary || msg.role == Role::Assistant {
        return serde_json::json!({
            "role": role,
            "content": msg.joined_text(),
        });
    }

    let content: Vec<Value> = msg
        .parts
        .iter()
        .map(|p| match p {
            Part::Text { text } => serde_json::json!({"type": "text", "text": text}),
            Part::InlineData { mime_type, data } => serde_json::json!({
                "type": "image_url",
                "image_url": {
                    "url": format!(
                        "data:{};base64,{}",
                        mime_type,
                        base64::engine::general_purpose::STANDARD.encode(data)
                    ),
                }
            }),
        })
        .collect();

    serde_json::json!({
        "role": role,
        "content": content,
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Response deserialization helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub(crate) fn parse_chat_response(provider: &str, body: &Value, model: &str) -> Result<GenerateResponse> {
    let choice = body
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|a| a.first())
        .ok_or_else(|| Error::Provider {
            provider: provider.into(),
            message: "no choices in response".into(),
        })?;

    let message = choice.get("message").ok_or_else(|| Error::Provider {
        provider: provider.into(),
        message: "no message in choice".into(),
    })?;

    let text = message
        .get("content")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    let finish_reason = choice
        .get("finish_reason")
        .and_then(|v| v.as_str())
        .map(String::from);

    let model = body
        .get("model")
        .and_then(|v| v.as_str())
        .unwrap_or(model)
        .to_string();

    let usage = body.get("usage").and_then(parse_openai_usage);

    Ok(GenerateResponse {
        text,
        model,
        finish_reason,
        usage,
    })
}

fn parse_openai_usage(v: &Value) -> Option<Usage> {
    let prompt = v.get("prompt_tokens")?.as_u64()? as u32;
    let completion = v
        .get("completion_tokens")
        .and_then(|c| c.as_u64())
        .unwrap_or(0) as u32;
    let total = v
        .get("total_tokens")
        .and_then(|t| t.as_u64())
        .unwrap_or((prompt + completion) as u64) as u32;
    Some(Usage {
        prompt_tokens: prompt,
        completion_tokens: completion,
        total_tokens: total,
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
impl InferenceClient for OpenAiCompatClient {
    async fn generate(&self, req: &GenerateRequest) -> Result<GenerateResponse> {
        let model = req
            .model
            .clone()
            .unwrap_or_else(|| self.default_model.clone());
        let mut body = build_chat_body(req, &model);

        tracing::debug!(
            provider = %self.id,
            model = %model,
            messages = req.messages.len(),
            "openai-compat chat request"
        );

        let sent = self
            .client
            .post(self.chat_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await;
        wipe_json(&mut body);
        let resp = sent.map_err(from_reqwest)?;

        let status = resp.status();
        let resp_text = resp.text().await.map_err(from_reqwest)?;

        if !status.is_success() {
            return Err(status_error(&self.id, status, &resp_text));
        }

        let resp_json: Value = serde_json::from_str(&resp_text).map_err(|e| Error::Provider {
            provider: self.id.clone(),
            message: format!("malformed response body: {e}"),
        })?;
        parse_chat_response(&self.id, &resp_json, &model)
    }

    fn provider_id(&self) -> &str {
        &self.id
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}
