// Error types for calendar sync and summarization

use thiserror::Error;

/// Result type alias for meeting sync operations
pub type Result<T> = std::result::Result<T, MeetingError>;

/// Errors that can occur while syncing meetings
#[derive(Debug, Error)]
pub enum MeetingError {
    /// No authenticated session, or no stored calendar credential for it
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Reaching or parsing the external calendar failed
    #[error("Calendar fetch error: {0}")]
    CalendarFetch(String),

    /// The MCP server answered with an error envelope
    #[error("Protocol error {code}: {message}")]
    Protocol { code: i64, message: String },

    /// Network failure or timeout talking to the MCP server
    #[error("Transport error: {0}")]
    Transport(String),

    /// Text generation failed (never surfaced past the summarizer)
    #[error("Generation error: {0}")]
    Generation(String),

    /// Persistence error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl MeetingError {
    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        MeetingError::Authentication(msg.into())
    }

    /// Create a calendar fetch error
    pub fn calendar(msg: impl Into<String>) -> Self {
        MeetingError::CalendarFetch(msg.into())
    }

    /// Create a protocol error from a remote error envelope
    pub fn protocol(code: i64, message: impl Into<String>) -> Self {
        MeetingError::Protocol {
            code,
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        MeetingError::Transport(msg.into())
    }

    /// Create a generation error
    pub fn generation(msg: impl Into<String>) -> Self {
        MeetingError::Generation(msg.into())
    }

    /// Create a storage error
    pub fn store(msg: impl Into<String>) -> Self {
        MeetingError::Storage(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        MeetingError::Configuration(msg.into())
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, MeetingError::Authentication(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_display() {
        let err = MeetingError::protocol(-32601, "Method not found");
        assert_eq!(err.to_string(), "Protocol error -32601: Method not found");
    }

    #[test]
    fn test_is_authentication() {
        assert!(MeetingError::auth("no session").is_authentication());
        assert!(!MeetingError::calendar("boom").is_authentication());
    }

    #[test]
    fn test_from_anyhow() {
        let err: MeetingError = anyhow::anyhow!("wrapped").into();
        assert!(matches!(err, MeetingError::Internal(_)));
    }
}
