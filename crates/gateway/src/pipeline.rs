//! One-shot analysis of uploaded files and pasted text.
//!
//! Multimodal analysis is two dependent model calls: a vision pass over the
//! upload, then a short summary of that analysis. Text analysis is a single
//! call. Nothing here touches the filesystem; every payload is wiped once the
//! call that needed it has returned.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use gg_domain::config::Config;
use gg_domain::content::{wipe_bytes, Part};
use gg_domain::error::{Error, Result};
use gg_providers::{GenerateRequest, InferenceClient};

pub const SUMMARY_SYSTEM_PROMPT: &str = "You are a privacy-focused AI assistant. Provide concise, \
clear summaries of sensitive documents. Never store or log user data.";

pub const TEXT_SYSTEM_PROMPT: &str = "You are a privacy-focused AI assistant analyzing sensitive \
text. Provide clear, actionable insights.";

const DEFAULT_TEXT_INSTRUCTION: &str = "Analyze this text and extract key insights";

const VISION_MAX_TOKENS: u32 = 500;
const SUMMARY_MAX_TOKENS: u32 = 150;
const TEXT_MAX_TOKENS: u32 = 500;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Inputs and results
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A file received in a request, held in memory only.
#[derive(Default)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl Upload {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }
}

impl fmt::Debug for Upload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upload")
            .field("bytes", &self.bytes.len())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

impl Drop for Upload {
    fn drop(&mut self) {
        wipe_bytes(&mut self.bytes);
    }
}

/// Retention statement attached to every analysis result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivacyNotice {
    pub data_retention: &'static str,
    pub storage_duration: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compliance: Option<Vec<&'static str>>,
}

impl PrivacyNotice {
    pub fn multimodal() -> Self {
        Self {
            compliance: Some(vec!["HIPAA-safe", "GDPR-compliant"]),
            ..Self::text()
        }
    }

    pub fn text() -> Self {
        Self {
            data_retention: "zero",
            storage_duration: "ephemeral",
            compliance: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MultimodalAnalysis {
    pub analysis: String,
    pub summary: String,
    pub privacy: PrivacyNotice,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextAnalysis {
    pub analysis: String,
    pub privacy: PrivacyNotice,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Pipeline
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Stateless analysis front-end over a shared [`InferenceClient`].
#[derive(Clone)]
pub struct AnalysisPipeline {
    client: Arc<dyn InferenceClient>,
    vision_model: String,
    chat_model: String,
    vision_prompt: String,
}

impl AnalysisPipeline {
    pub fn new(client: Arc<dyn InferenceClient>, config: &Config) -> Self {
        Self {
            client,
            vision_model: config.llm.vision_model.clone(),
            chat_model: config.llm.chat_model.clone(),
            vision_prompt: config.analysis.vision_prompt.clone(),
        }
    }

    /// Vision pass over `upload`, then a short summary of its output.
    ///
    /// The summary call only starts after the vision call succeeded; if
    /// either fails the whole operation fails with that error.
    pub async fn analyze_multimodal(
        &self,
        mut upload: Upload,
        prompt: Option<&str>,
    ) -> Result<MultimodalAnalysis> {
        if upload.bytes.is_empty() {
            return Err(Error::Validation("No file uploaded".into()));
        }

        let instruction = non_blank(prompt).unwrap_or(&self.vision_prompt);
        let payload = std::mem::take(&mut upload.bytes);
        let mut vision = GenerateRequest::single_turn(vec![
            Part::text(instruction),
            Part::inline(upload.mime_type.clone(), payload),
        ])
        .with_model(&self.vision_model)
        .with_max_output_tokens(VISION_MAX_TOKENS);

        tracing::debug!(mime = %upload.mime_type, model = %self.vision_model, "vision pass");
        let result = self.client.generate(&vision).await;
        vision.wipe();
        let analysis = result?.text;

        let mut summary_req = GenerateRequest::single_turn(vec![Part::text(format!(
            "Summarize this analysis in 2-3 sentences for the user:\n\n{analysis}"
        ))])
        .with_system(SUMMARY_SYSTEM_PROMPT)
        .with_model(&self.chat_model)
        .with_max_output_tokens(SUMMARY_MAX_TOKENS);

        tracing::debug!(model = %self.chat_model, "summary pass");
        let result = self.client.generate(&summary_req).await;
        summary_req.wipe();
        let summary = result?.text;

        Ok(MultimodalAnalysis {
            analysis,
            summary,
            privacy: PrivacyNotice::multimodal(),
        })
    }

    /// Single-call analysis of free text.
    pub async fn analyze_text(&self, text: &str, prompt: Option<&str>) -> Result<TextAnalysis> {
        if text.trim().is_empty() {
            return Err(Error::Validation("No text provided".into()));
        }

        let instruction = non_blank(prompt).unwrap_or(DEFAULT_TEXT_INSTRUCTION);
        let mut req = GenerateRequest::single_turn(vec![Part::text(format!(
            "{instruction}:\n\n{text}"
        ))])
        .with_system(TEXT_SYSTEM_PROMPT)
        .with_model(&self.chat_model)
        .with_max_output_tokens(TEXT_MAX_TOKENS);

        let result = self.client.generate(&req).await;
        req.wipe();

        Ok(TextAnalysis {
            analysis: result?.text,
            privacy: PrivacyNotice::text(),
        })
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|p| !p.trim().is_empty())
}
