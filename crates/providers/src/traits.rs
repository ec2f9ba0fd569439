use gg_domain::content::{wipe_bytes, wipe_string, Message, Part};
use gg_domain::error::Result;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request / Response types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A provider-agnostic text generation request.
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    /// System instruction, sent out-of-band from the conversation.
    pub system: Option<String>,
    /// Conversation messages, oldest first. The last one is the current turn.
    pub messages: Vec<Message>,
    /// Maximum tokens in the response. `None` lets the provider choose.
    pub max_output_tokens: Option<u32>,
    /// Model identifier override. When `None`, the provider uses its default.
    pub model: Option<String>,
}

impl GenerateRequest {
    /// A request with a single user turn built from `parts`.
    pub fn single_turn(parts: Vec<Part>) -> Self {
        Self {
            messages: vec![Message::user(parts)],
            ..Default::default()
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_max_output_tokens(mut self, max: u32) -> Self {
        self.max_output_tokens = Some(max);
        self
    }

    /// Every part of every message, in order.
    pub fn parts(&self) -> impl Iterator<Item = &Part> {
        self.messages.iter().flat_map(|m| m.parts.iter())
    }

    /// Zero and drop every payload the request carries.
    pub fn wipe(&mut self) {
        for part in self.messages.iter_mut().flat_map(|m| m.parts.iter_mut()) {
            match part {
                Part::Text { text } => wipe_string(text),
                Part::InlineData { data, .. } => wipe_bytes(data),
            }
        }
        self.messages.clear();
        if let Some(system) = self.system.as_mut() {
            wipe_string(system);
        }
    }
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A provider-agnostic generation response.
#[derive(Debug, Clone)]
pub struct GenerateResponse {
    /// Generated text.
    pub text: String,
    /// The model that actually produced the response.
    pub model: String,
    /// Normalized stop reason ("stop", "length", ...).
    pub finish_reason: Option<String>,
    pub usage: Option<Usage>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Core client trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The remote multimodal model, seen as an opaque text generator.
///
/// Implementations translate between our internal types and one provider's
/// wire format. They hold no per-call state and never retry; a failed or
/// timed-out call returns an upstream error to the caller.
#[async_trait::async_trait]
pub trait InferenceClient: Send + Sync {
    /// Send a generation request and wait for the full response.
    async fn generate(&self, req: &GenerateRequest) -> Result<GenerateResponse>;

    /// A unique identifier for this provider instance.
    fn provider_id(&self) -> &str;

    /// Model used when the request carries no override.
    fn default_model(&self) -> &str;
}
