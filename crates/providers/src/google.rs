//! Google Gemini adapter.
//!
//! Implements the Gemini `generateContent` API. Auth is via an API key
//! passed as a query parameter (`key={api_key}`). Inline payloads travel
//! base64-encoded in `inlineData` parts.

use std::time::Duration;

use base64::Engine as _;
use gg_domain::config::ProviderConfig;
use gg_domain::content::{Message, Part, Role};
use gg_domain::error::{Error, Result};
use serde_json::Value;

use crate::traits::{GenerateRequest, GenerateResponse, InferenceClient, Usage};
use crate::util::{from_reqwest, redact_url_key, resolve_api_key, status_error, wipe_json};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Adapter struct
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// An inference client for the native Google Gemini API.
pub struct GoogleClient {
    id: String,
    base_url: String,
    api_key: String,
    default_model: String,
    client: reqwest::Client,
}

impl GoogleClient {
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

    fn generate_url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        )
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request serialization
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub(crate) fn build_body(req: &GenerateRequest) -> Value {
    let contents: Vec<Value> = req.messages.iter().map(message_to_gemini).collect();

    let mut body = serde_json::json!({
        "contents": contents,
    });

    if let Some(ref system) = req.system {
        body["systemInstruction"] = serde_json::json!({
            "parts": [{"text": system}]
        });
    }

    if let Some(max) = req.max_output_tokens {
        body["generationConfig"] = serde_json::json!({
            "maxOutputTokens": max,
        });
    }

    body
}

fn message_to_gemini(msg: &Message) -> Value {
    let role = match msg.role {
        Role::User => "user",
        Role::Assistant => "model",
    };
    let parts: Vec<Value> = msg.parts.iter().map(part_to_gemini).collect();
    serde_json::json!({
        "role": role,
        "parts": parts,
    })
}

fn part_to_gemini(part: &Part) -> Value {
    match part {
        Part::Text { text } => serde_json::json!({"text": text}),
        Part::InlineData { mime_type, data } => serde_json::json!({
            "inlineData": {
                "mimeType": mime_type,
                "data": base64::engine::general_purpose::STANDARD.encode(data),
            }
        }),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Response deserialization
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub(crate) fn parse_gemini_response(provider: &str, body: &Value, model: &str) -> Result<GenerateResponse> {
    let candidate = body
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|a| a.first())
        .ok_or_else(|| {
            let reason = body
                .get("promptFeedback")
                .and_then(|f| f.get("blockReason"))
                .and_then(|r| r.as_str())
                .map(|r| format!("prompt blocked: {r}"))
                .unwrap_or_else(|| "no candidates in response".into());
            Error::Provider {
                provider: provider.into(),
                message: reason,
            }
        })?;

    let text: String = candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(|v| v.as_str()))
                .collect()
        })
        .unwrap_or_default();

    let finish_reason = candidate
        .get("finishReason")
        .and_then(|v| v.as_str())
        .map(|s| match s {
            "STOP" => "stop".to_string(),
            "MAX_TOKENS" => "length".to_string(),
            other => other.to_lowercase(),
        });

    let usage = body.get("usageMetadata").and_then(parse_gemini_usage);

    let model = body
        .get("modelVersion")
        .and_then(|v| v.as_str())
        .unwrap_or(model)
        .to_string();

    Ok(GenerateResponse {
        text,
        model,
        finish_reason,
        usage,
    })
}

fn parse_gemini_usage(v: &Value) -> Option<Usage> {
    let prompt = v.get("promptTokenCount")?.as_u64()? as u32;
    let completion = v
        .get("candidatesTokenCount")
        .and_then(|c| c.as_u64())
        .unwrap_or(0) as u32;
    let total = v
        .get("totalTokenCount")
        .and_then(|v| v.as_u64())
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
impl InferenceClient for GoogleClient {
    async fn generate(&self, req: &GenerateRequest) -> Result<GenerateResponse> {
        let model = req
            .model
            .clone()
            .unwrap_or_else(|| self.default_model.clone());
        let url = self.generate_url(&model);
        let mut body = build_body(req);

        tracing::debug!(
            provider = %self.id,
            url = %redact_url_key(&url),
            messages = req.messages.len(),
            "gemini generate request"
        );

        let sent = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
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
        parse_gemini_response(&self.id, &resp_json, &model)
    }

    fn provider_id(&self) -> &str {
        &self.id
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
