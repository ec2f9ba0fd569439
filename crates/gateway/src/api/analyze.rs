//! One-shot analysis endpoints.
//!
//! Uploads are read straight from the multipart stream into memory and
//! handed to the pipeline; they are never written to disk.

use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::Value;

use crate::pipeline::Upload;
use crate::state::AppState;

use super::{analysis_error, api_error, provider_unavailable};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /api/analyze — multipart file + optional prompt
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

struct AnalyzeForm {
    upload: Upload,
    prompt: Option<String>,
    return_voice: bool,
}

pub async fn analyze(State(state): State<AppState>, multipart: Multipart) -> Response {
    let Some(pipeline) = state.pipeline() else {
        return provider_unavailable();
    };

    let form = match read_form(multipart, state.config.server.max_upload_bytes).await {
        Ok(form) => form,
        Err(resp) => return resp,
    };

    tracing::info!(
        bytes = form.upload.bytes.len(),
        mime = %form.upload.mime_type,
        custom_prompt = form.prompt.is_some(),
        "analyze request (in-memory only)"
    );
    if form.return_voice {
        tracing::info!("voice response requested; speech synthesis is not available, returning text");
    }

    match pipeline
        .analyze_multimodal(form.upload, form.prompt.as_deref())
        .await
    {
        Ok(result) => Json(result).into_response(),
        Err(e) => analysis_error(&e),
    }
}

async fn read_form(mut multipart: Multipart, max_bytes: usize) -> Result<AnalyzeForm, Response> {
    let mut form = AnalyzeForm {
        upload: Upload::default(),
        prompt: None,
        return_voice: false,
    };

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                if bytes.len() > max_bytes {
                    return Err(api_error(
                        StatusCode::PAYLOAD_TOO_LARGE,
                        format!("file exceeds the {max_bytes} byte upload limit"),
                    ));
                }
                // Takes over the multipart buffer when uniquely owned instead of copying it.
                form.upload = Upload::new(Vec::from(bytes), mime_type);
            }
            "prompt" => {
                let text = field.text().await.map_err(multipart_error)?;
                form.prompt = Some(text).filter(|p| !p.trim().is_empty());
            }
            "returnVoice" => {
                let value = field.text().await.map_err(multipart_error)?;
                form.return_voice = flag_is_true(&value);
            }
            _ => {
                tracing::debug!(field = %name, "ignoring unexpected form field");
            }
        }
    }

    Ok(form)
}

fn multipart_error(err: MultipartError) -> Response {
    api_error(err.status(), err.body_text())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /api/analyze-text — JSON {text, prompt?}
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Deserialize)]
pub struct AnalyzeTextRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    /// `"true"` asks for voice; any other value, or none, does not.
    #[serde(default, rename = "returnVoice")]
    pub return_voice: Option<Value>,
}

impl AnalyzeTextRequest {
    fn wants_voice(&self) -> bool {
        match &self.return_voice {
            Some(Value::String(s)) => flag_is_true(s),
            Some(Value::Bool(b)) => *b,
            _ => false,
        }
    }
}

fn flag_is_true(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

pub async fn analyze_text(
    State(state): State<AppState>,
    body: Result<Json<AnalyzeTextRequest>, JsonRejection>,
) -> Response {
    let Some(pipeline) = state.pipeline() else {
        return provider_unavailable();
    };
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => return api_error(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    let return_voice = req.wants_voice();
    let text = req.text.unwrap_or_default();
    tracing::info!(chars = text.chars().count(), "analyze-text request (in-memory only)");
    if return_voice {
        tracing::info!("voice response requested; speech synthesis is not available, returning text");
    }

    match pipeline.analyze_text(&text, req.prompt.as_deref()).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => analysis_error(&e),
    }
}
