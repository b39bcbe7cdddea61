use thiserror::Error;

/// Message shown to the user when an identification fails for any reason.
pub const IDENTIFY_RETRY_MESSAGE: &str =
    "Failed to analyze image. Please try again with a clearer photo.";

/// Message shown to the user when a chat reply cannot be completed.
pub const CHAT_FALLBACK_MESSAGE: &str =
    "I'm sorry, my root system is a bit tangled. Could you try asking again?";

#[derive(Debug, Error)]
pub enum BloomError {
    /// Backend unreachable or answered with a non-success status.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    /// The backend answered, but its text could not be decoded as JSON.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Decoded JSON is missing a required field, has the wrong type,
    /// or carries a value outside an enumerated set.
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("A reply is already streaming for this session")]
    SessionBusy,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BloomError {
    /// Stable label used in structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Timeout(_) => "timeout",
            Self::MalformedResponse(_) => "malformed_response",
            Self::SchemaViolation(_) => "schema_violation",
            Self::StreamInterrupted(_) => "stream_interrupted",
            Self::SessionBusy => "session_busy",
            Self::InvalidInput(_) => "invalid_input",
            Self::Config(_) => "config",
        }
    }

    /// Returns `true` for failures of the backend exchange itself
    /// (network, status, timeout) as opposed to bad content or bad input.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_))
    }

    /// Text the view layer shows for this failure. Transport, timeout,
    /// malformed and schema failures of an identification all read the same.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(_)
            | Self::Timeout(_)
            | Self::MalformedResponse(_)
            | Self::SchemaViolation(_) => IDENTIFY_RETRY_MESSAGE.to_string(),
            Self::StreamInterrupted(_) => CHAT_FALLBACK_MESSAGE.to_string(),
            Self::SessionBusy => "Please wait for the current reply to finish.".to_string(),
            Self::InvalidInput(msg) | Self::Config(msg) => msg.clone(),
        }
    }

    /// Text the chat view shows when a reply cannot be produced. Backend
    /// failures, whether at stream open or mid-stream, read as `fallback`.
    pub fn chat_user_message(&self, fallback: &str) -> String {
        match self {
            Self::SessionBusy | Self::InvalidInput(_) | Self::Config(_) => self.user_message(),
            _ => fallback.to_string(),
        }
    }
}

impl From<reqwest::Error> for BloomError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, BloomError>;
