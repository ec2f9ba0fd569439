//! Live-session wire messages.
//!
//! Every frame is a JSON object tagged by `type`. Unknown client types
//! decode to [`ClientMessage::Unknown`] and are ignored; anything that is not
//! a JSON object with a string `type` is a protocol error.

use std::fmt;

use serde::{Deserialize, Serialize};

use gg_domain::error::{Error, Result};

/// Inbound message from a live client.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    StartSession,
    UploadImage {
        /// Base64-encoded image bytes.
        data: String,
        #[serde(rename = "mimeType", alias = "mime_type")]
        mime_type: String,
    },
    /// Audio arrives as a transcript; raw audio fields are ignored.
    AudioChunk {
        #[serde(default)]
        transcript: Option<String>,
    },
    TextMessage {
        text: String,
    },
    EndSession,
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::StartSession => "start_session",
            ClientMessage::UploadImage { .. } => "upload_image",
            ClientMessage::AudioChunk { .. } => "audio_chunk",
            ClientMessage::TextMessage { .. } => "text_message",
            ClientMessage::EndSession => "end_session",
            ClientMessage::Unknown => "unknown",
        }
    }
}

// Payloads are user content; only the kind is ever printed.
impl fmt::Debug for ClientMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClientMessage::{}", self.kind())
    }
}

/// Outbound message to a live client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    SessionStarted {
        message: String,
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    ImageReceived {
        message: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
        bytes: usize,
    },
    Response {
        text: String,
        /// RFC 3339, UTC.
        timestamp: String,
    },
    SessionEnded {
        message: String,
    },
    Error {
        message: String,
        /// `validation`, `upstream` or `protocol`.
        code: String,
    },
}

impl ServerMessage {
    pub fn response(text: String) -> Self {
        ServerMessage::Response {
            text,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(err: &Error) -> Self {
        ServerMessage::Error {
            message: err.to_string(),
            code: err.kind().as_str().to_string(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::SessionStarted { .. } => "session_started",
            ServerMessage::ImageReceived { .. } => "image_received",
            ServerMessage::Response { .. } => "response",
            ServerMessage::SessionEnded { .. } => "session_ended",
            ServerMessage::Error { .. } => "error",
        }
    }
}

/// Decode one text frame.
pub fn decode_frame(text: &str) -> Result<ClientMessage> {
    serde_json::from_str(text).map_err(|e| Error::Protocol(format!("malformed message: {e}")))
}
