//! Per-connection live-session state machine.
//!
//! A session holds at most one image and a transcript of completed turns,
//! both in memory only. `Idle -> Active -> Ended`; once ended, all content is
//! wiped and only `end_session` is still accepted.

use std::fmt;
use std::sync::Arc;

use base64::Engine as _;

use gg_domain::config::Config;
use gg_domain::content::{wipe_bytes, wipe_string, Message, Part, Role};
use gg_domain::error::{Error, Result};
use gg_providers::{GenerateRequest, InferenceClient};

use super::protocol::{ClientMessage, ServerMessage};

pub use gg_domain::content::Role as TurnRole;

/// Prepended to every live text message before it reaches the model.
pub const LIVE_TEXT_PREFIX: &str = "You are a privacy-focused assistant in a live session. \
Answer using the shared image as context if one is present. Be concise.\n\nUser: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Idle,
    Active,
    Ended,
}

/// The image shared in this session. At most one; a new upload replaces it.
pub struct ImageContext {
    data: Vec<u8>,
    mime_type: String,
}

impl ImageContext {
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The copy travels in the model request and is wiped with it.
    fn to_part(&self) -> Part {
        Part::inline(self.mime_type.clone(), self.data.clone())
    }

    fn wipe(&mut self) {
        wipe_bytes(&mut self.data);
    }
}

impl fmt::Debug for ImageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageContext")
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// One completed exchange half.
pub struct Turn {
    pub role: Role,
    text: String,
}

impl Turn {
    pub fn text(&self) -> &str {
        &self.text
    }

    fn to_message(&self) -> Message {
        match self.role {
            Role::User => Message::user_text(self.text.clone()),
            Role::Assistant => Message::assistant_text(self.text.clone()),
        }
    }
}

impl fmt::Debug for Turn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Turn")
            .field("role", &self.role)
            .field("chars", &self.text.chars().count())
            .finish()
    }
}

/// Behaviour knobs for live sessions, resolved once from config.
#[derive(Debug, Clone)]
pub struct SessionPolicy {
    /// Reject content messages until `start_session` has been seen.
    pub require_start: bool,
    /// Send earlier turns as prior messages on every model call.
    pub replay_transcript: bool,
    pub max_output_tokens: u32,
    pub model: String,
}

impl SessionPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            require_start: config.live.require_start,
            replay_transcript: config.live.replay_transcript,
            max_output_tokens: config.live.max_output_tokens,
            model: config
                .live
                .model
                .clone()
                .unwrap_or_else(|| config.llm.chat_model.clone()),
        }
    }
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct LiveSession {
    id: String,
    lifecycle: Lifecycle,
    image: Option<ImageContext>,
    transcript: Vec<Turn>,
    policy: SessionPolicy,
    client: Arc<dyn InferenceClient>,
}

impl LiveSession {
    pub fn new(client: Arc<dyn InferenceClient>, policy: SessionPolicy) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            lifecycle: Lifecycle::Idle,
            image: None,
            transcript: Vec::new(),
            policy,
            client,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn image(&self) -> Option<&ImageContext> {
        self.image.as_ref()
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    /// Apply one client message. Returns the reply to send, if any.
    ///
    /// Failures are reported as an `error` reply and leave the session
    /// usable; nothing from a failed turn is recorded.
    pub async fn handle(&mut self, msg: ClientMessage) -> Option<ServerMessage> {
        let kind = msg.kind();
        match self.dispatch(msg).await {
            Ok(reply) => reply,
            Err(err) => {
                tracing::debug!(session_id = %self.id, kind, code = err.kind().as_str(), "live message failed");
                Some(ServerMessage::error(&err))
            }
        }
    }

    async fn dispatch(&mut self, msg: ClientMessage) -> Result<Option<ServerMessage>> {
        match msg {
            ClientMessage::EndSession => {
                self.end();
                return Ok(Some(ServerMessage::SessionEnded {
                    message: "Session ended. All data cleared.".into(),
                }));
            }
            ClientMessage::Unknown => {
                tracing::debug!(session_id = %self.id, "ignoring unknown live message type");
                return Ok(None);
            }
            _ => {}
        }

        if self.lifecycle == Lifecycle::Ended {
            return Err(Error::Protocol("session has ended".into()));
        }

        match msg {
            ClientMessage::StartSession => {
                self.lifecycle = Lifecycle::Active;
                Ok(Some(ServerMessage::SessionStarted {
                    message: "Live session started".into(),
                    session_id: self.id.clone(),
                }))
            }
            ClientMessage::UploadImage { data, mime_type } => {
                self.ensure_started()?;
                self.upload_image(&data, mime_type).map(Some)
            }
            ClientMessage::AudioChunk { transcript } => {
                self.ensure_started()?;
                self.audio_chunk(transcript).await.map(Some)
            }
            ClientMessage::TextMessage { text } => {
                self.ensure_started()?;
                self.text_message(text).await.map(Some)
            }
            ClientMessage::EndSession | ClientMessage::Unknown => Ok(None),
        }
    }

    fn ensure_started(&mut self) -> Result<()> {
        if self.lifecycle == Lifecycle::Idle {
            if self.policy.require_start {
                return Err(Error::Protocol("send start_session first".into()));
            }
            self.lifecycle = Lifecycle::Active;
        }
        Ok(())
    }

    fn upload_image(&mut self, encoded: &str, mime_type: String) -> Result<ServerMessage> {
        let data = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| Error::Validation(format!("image data is not valid base64: {e}")))?;
        if data.is_empty() {
            return Err(Error::Validation("image data is empty".into()));
        }
        if mime_type.trim().is_empty() {
            return Err(Error::Validation("mimeType is required".into()));
        }

        if let Some(mut old) = self.image.take() {
            old.wipe();
        }
        let bytes = data.len();
        self.image = Some(ImageContext {
            data,
            mime_type: mime_type.clone(),
        });
        tracing::debug!(session_id = %self.id, bytes, mime = %mime_type, "live image stored");

        Ok(ServerMessage::ImageReceived {
            message: "Image received. Ask me anything about it.".into(),
            mime_type,
            bytes,
        })
    }

    async fn audio_chunk(&mut self, transcript: Option<String>) -> Result<ServerMessage> {
        let transcript = transcript.filter(|t| !t.trim().is_empty());
        if transcript.is_none() && self.image.is_none() {
            return Err(Error::Validation(
                "audio chunk has no transcript and there is no image to discuss".into(),
            ));
        }

        let mut parts = self.image_parts();
        if let Some(ref t) = transcript {
            parts.push(Part::text(t.clone()));
        }
        let reply = self.infer(parts).await?;

        if let Some(t) = transcript {
            self.record(Role::User, t);
        }
        self.record(Role::Assistant, reply.clone());
        Ok(ServerMessage::response(reply))
    }

    async fn text_message(&mut self, text: String) -> Result<ServerMessage> {
        if text.trim().is_empty() {
            return Err(Error::Validation("text message is empty".into()));
        }

        let mut parts = self.image_parts();
        parts.push(Part::text(format!("{LIVE_TEXT_PREFIX}{text}")));
        let reply = self.infer(parts).await?;

        self.record(Role::User, text);
        self.record(Role::Assistant, reply.clone());
        Ok(ServerMessage::response(reply))
    }

    fn image_parts(&self) -> Vec<Part> {
        self.image.iter().map(ImageContext::to_part).collect()
    }

    async fn infer(&self, parts: Vec<Part>) -> Result<String> {
        let mut messages: Vec<Message> = if self.policy.replay_transcript {
            self.transcript.iter().map(Turn::to_message).collect()
        } else {
            Vec::new()
        };
        messages.push(Message::user(parts));

        let mut req = GenerateRequest {
            messages,
            ..Default::default()
        }
        .with_model(&self.policy.model)
        .with_max_output_tokens(self.policy.max_output_tokens);

        let result = self.client.generate(&req).await;
        req.wipe();
        Ok(result?.text)
    }

    fn record(&mut self, role: Role, text: String) {
        self.transcript.push(Turn { role, text });
    }

    /// Wipe all content and move to `Ended`. Idempotent.
    pub fn end(&mut self) {
        self.wipe();
        self.lifecycle = Lifecycle::Ended;
    }

    fn wipe(&mut self) {
        if let Some(mut image) = self.image.take() {
            image.wipe();
        }
        for turn in self.transcript.iter_mut() {
            wipe_string(&mut turn.text);
        }
        self.transcript.clear();
        self.transcript.shrink_to_fit();
    }
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        self.wipe();
    }
}

impl fmt::Debug for LiveSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveSession")
            .field("id", &self.id)
            .field("lifecycle", &self.lifecycle)
            .field("image", &self.image)
            .field("turns", &self.transcript.len())
            .finish()
    }
}
