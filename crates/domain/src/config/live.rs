use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Live sessions (WebSocket)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveConfig {
    /// Reject data-bearing messages until `start_session` has been received.
    /// Off by default: the first message of any kind activates the session.
    #[serde(default)]
    pub require_start: bool,
    /// Send earlier transcript turns to the model as multi-turn context.
    /// Off by default: each call only carries the current turn.
    #[serde(default)]
    pub replay_transcript: bool,
    #[serde(default = "d_500")]
    pub max_output_tokens: u32,
    /// Model override for live calls. Falls back to `llm.chat_model`.
    #[serde(default)]
    pub model: Option<String>,
    /// Capacity of the per-connection inbound frame queue.
    #[serde(default = "d_32")]
    pub inbound_queue: usize,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            require_start: false,
            replay_transcript: false,
            max_output_tokens: 500,
            model: None,
            inbound_queue: 32,
        }
    }
}

fn d_500() -> u32 {
    500
}
fn d_32() -> usize {
    32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_defaults_are_permissive() {
        let cfg: LiveConfig = toml::from_str("").unwrap();
        assert!(!cfg.require_start);
        assert!(!cfg.replay_transcript);
        assert_eq!(cfg.max_output_tokens, 500);
        assert!(cfg.model.is_none());
        assert_eq!(cfg.inbound_queue, 32);
    }

    #[test]
    fn live_policies_parse() {
        let cfg: LiveConfig = toml::from_str(
            r#"
            require_start = true
            replay_transcript = true
            model = "gemini-2.0-flash-live"
        "#,
        )
        .unwrap();
        assert!(cfg.require_start);
        assert!(cfg.replay_transcript);
        assert_eq!(cfg.model.as_deref(), Some("gemini-2.0-flash-live"));
    }
}
