use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// One piece of model input: either text or an inline binary payload.
///
/// `Debug` never prints content, only sizes and mime types.
#[derive(Clone, PartialEq, Eq)]
pub enum Part {
    Text { text: String },
    InlineData { mime_type: String, data: Vec<u8> },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn inline(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Part::InlineData {
            mime_type: mime_type.into(),
            data,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text.as_str()),
            Part::InlineData { .. } => None,
        }
    }

    pub fn mime_type(&self) -> Option<&str> {
        match self {
            Part::Text { .. } => None,
            Part::InlineData { mime_type, .. } => Some(mime_type.as_str()),
        }
    }
}

impl fmt::Debug for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Part::Text { text } => f
                .debug_struct("Text")
                .field("chars", &text.chars().count())
                .finish(),
            Part::InlineData { mime_type, data } => f
                .debug_struct("InlineData")
                .field("mime_type", mime_type)
                .field("bytes", &data.len())
                .finish(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A role-tagged message in a model request (provider-agnostic).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub parts: Vec<Part>,
}

// ── Convenience constructors ───────────────────────────────────────

impl Message {
    pub fn user(parts: Vec<Part>) -> Self {
        Self { role: Role::User, parts }
    }
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::user(vec![Part::text(text)])
    }
    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            parts: vec![Part::text(text)],
        }
    }

    /// Concatenate every text part, separated by blank lines.
    pub fn joined_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(Part::as_text)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Overwrite a byte buffer with zeros, then release it.
///
/// The whole allocation is zeroed, spare capacity included, with volatile
/// writes the optimizer cannot elide.
pub fn wipe_bytes(buf: &mut Vec<u8>) {
    buf.zeroize();
    buf.shrink_to_fit();
}

/// Overwrite a string's bytes with zeros, then release it.
pub fn wipe_string(s: &mut String) {
    s.zeroize();
    s.shrink_to_fit();
}
