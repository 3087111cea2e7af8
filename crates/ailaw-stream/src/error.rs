use ailaw_core::AilawError;
use thiserror::Error;

/// Errors raised by the socket client.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The WebSocket handshake failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A frame could not be written to the open socket.
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// The socket base URL is unusable.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<StreamError> for AilawError {
    fn from(e: StreamError) -> Self {
        match e {
            StreamError::ConfigError(msg) => AilawError::Config(msg),
            other => AilawError::Protocol(other.to_string()),
        }
    }
}
