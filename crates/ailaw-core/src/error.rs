use thiserror::Error;

#[derive(Debug, Error)]
pub enum AilawError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not signed in")]
    MissingToken,

    /// The backend told the client to log out (expired or revoked session).
    #[error("Logged out by server")]
    LoggedOut,

    #[error("Token refresh failed")]
    RefreshFailed,

    /// A backend response carrying one of the server error codes.
    #[error("API error {code}: {message}")]
    Api { code: String, message: String },

    #[error("HTTP transport error: {0}")]
    Http(String),

    #[error("WebSocket protocol error: {0}")]
    Protocol(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Request timeout after {ms}ms")]
    Timeout { ms: u64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AilawError {
    /// Short error code string used in logs and CLI output.
    pub fn code(&self) -> &'static str {
        match self {
            AilawError::Config(_) => "CONFIG_ERROR",
            AilawError::MissingToken => "MISSING_TOKEN",
            AilawError::LoggedOut => "LOGGED_OUT",
            AilawError::RefreshFailed => "REFRESH_FAILED",
            AilawError::Api { .. } => "API_ERROR",
            AilawError::Http(_) => "HTTP_ERROR",
            AilawError::Protocol(_) => "PROTOCOL_ERROR",
            AilawError::InvalidInput(_) => "INVALID_INPUT",
            AilawError::Serialization(_) => "SERIALIZATION_ERROR",
            AilawError::Io(_) => "IO_ERROR",
            AilawError::Timeout { .. } => "TIMEOUT",
            AilawError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// True when the user has to sign in again before anything else works.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            AilawError::MissingToken | AilawError::LoggedOut | AilawError::RefreshFailed
        )
    }
}

pub type Result<T> = std::result::Result<T, AilawError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_displays_code_and_message() {
        let e = AilawError::Api {
            code: "10002".into(),
            message: "quota exceeded".into(),
        };
        assert_eq!(e.to_string(), "API error 10002: quota exceeded");
        assert_eq!(e.code(), "API_ERROR");
        assert!(!e.requires_login());
    }

    #[test]
    fn auth_failures_require_login() {
        assert!(AilawError::LoggedOut.requires_login());
        assert!(AilawError::RefreshFailed.requires_login());
        assert!(AilawError::MissingToken.requires_login());
    }
}
