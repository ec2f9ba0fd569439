/// Shared error type used across all GeminiGuard crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Missing or empty required input (file, text, message body).
    #[error("{0}")]
    Validation(String),

    /// Malformed or unusable inbound live-session message.
    #[error("{0}")]
    Protocol(String),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("provider {provider}: {message}")]
    Provider { provider: String, message: String },

    #[error("config: {0}")]
    Config(String),

    #[error("auth: {0}")]
    Auth(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse error class, used for HTTP status mapping and the `code` field of
/// live-session error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Protocol,
    Upstream,
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Protocol => "protocol",
            ErrorKind::Upstream => "upstream",
            ErrorKind::Internal => "internal",
        }
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::Protocol(_) | Error::Json(_) => ErrorKind::Protocol,
            Error::Http(_) | Error::Timeout(_) | Error::Provider { .. } => ErrorKind::Upstream,
            Error::Io(_) | Error::Config(_) | Error::Auth(_) => ErrorKind::Internal,
        }
    }

    /// True for failures of the remote inference call (including timeouts).
    pub fn is_upstream(&self) -> bool {
        self.kind() == ErrorKind::Upstream
    }
}
