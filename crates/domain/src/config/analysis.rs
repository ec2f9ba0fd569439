use serde::{Deserialize, Serialize};

/// Built-in instruction for the vision pass over an upload.
pub const DEFAULT_VISION_PROMPT: &str = "Analyze this image in detail. If it's a medical document, \
extract medication names, dosages, and instructions. If it's a financial document, extract key \
financial data. Be thorough but concise.";

/// Prompts for the request-scoped analysis endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Default vision prompt, used when the caller sends no `prompt` field.
    /// Deployments focused on legal or financial documents override this.
    #[serde(default = "d_vision_prompt")]
    pub vision_prompt: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            vision_prompt: d_vision_prompt(),
        }
    }
}

fn d_vision_prompt() -> String {
    DEFAULT_VISION_PROMPT.into()
}
