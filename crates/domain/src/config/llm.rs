use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Remote inference provider
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model used for the vision pass over uploads.
    #[serde(default = "d_model")]
    pub vision_model: String,
    /// Model used for summaries, text analysis and live sessions.
    #[serde(default = "d_model")]
    pub chat_model: String,
    /// Per-call timeout for the remote model. A timeout surfaces as an
    /// upstream failure like any other.
    #[serde(default = "d_60000")]
    pub timeout_ms: u64,
    /// Startup policy when the provider cannot be initialized.
    ///
    /// - `allow_none` (default): the server boots, inference endpoints
    ///   answer 503 until credentials are configured.
    /// - `require_one`: abort startup.
    #[serde(default)]
    pub startup_policy: LlmStartupPolicy,
    #[serde(default)]
    pub provider: ProviderConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            vision_model: d_model(),
            chat_model: d_model(),
            timeout_ms: 60_000,
            startup_policy: LlmStartupPolicy::AllowNone,
            provider: ProviderConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LlmStartupPolicy {
    #[default]
    AllowNone,
    RequireOne,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "d_provider_id")]
    pub id: String,
    #[serde(default)]
    pub kind: ProviderKind,
    #[serde(default = "d_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            id: d_provider_id(),
            kind: ProviderKind::Google,
            base_url: d_base_url(),
            auth: AuthConfig::default(),
        }
    }
}

/// Which wire protocol the remote model speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Native Gemini `generateContent`.
    #[default]
    Google,
    /// Any OpenAI-compatible `chat/completions` endpoint (including
    /// Gemini's `/v1beta/openai/` surface).
    OpenaiCompat,
}

impl ProviderKind {
    pub fn label(self) -> &'static str {
        match self {
            ProviderKind::Google => "Google Gemini",
            ProviderKind::OpenaiCompat => "OpenAI-compatible",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Env var containing the key.
    #[serde(default = "d_key_env")]
    pub env: Option<String>,
    /// Direct key (for config-only setups; prefer env).
    #[serde(default)]
    pub key: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            env: d_key_env(),
            key: None,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_model() -> String {
    "gemini-2.5-flash".into()
}
fn d_60000() -> u64 {
    60_000
}
fn d_provider_id() -> String {
    "gemini".into()
}
fn d_base_url() -> String {
    "https://generativelanguage.googleapis.com".into()
}
fn d_key_env() -> Option<String> {
    Some("GEMINI_API_KEY".into())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
