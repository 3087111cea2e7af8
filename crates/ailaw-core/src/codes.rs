//! Backend result codes and the user-facing messages shown for them.

use serde::{Deserialize, Serialize};

use crate::error::AilawError;

pub const SUCCESS: &str = "00000";
pub const INVALID_REQUEST: &str = "10000";
pub const PROMPT_TOO_LONG: &str = "10001";
pub const QUOTA_EXCEEDED: &str = "10002";
pub const UNAUTHORIZED: &str = "10003";
pub const INTERNAL_SERVER: &str = "99999";

/// Code reported when the failure did not carry a known server code.
pub const UNKNOWN: &str = "UNKNOWN";

const GENERIC_TITLE: &str = "Something went wrong";

/// A message ready to show to the user (toast, status line, CLI stderr).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub title: String,
    pub message: String,
    pub code: String,
}

impl ErrorInfo {
    fn new(title: &str, message: &str, code: &str) -> Self {
        Self {
            title: title.to_string(),
            message: message.to_string(),
            code: code.to_string(),
        }
    }

    /// Map a server code to its message. Unknown codes keep the raw code as
    /// the message so nothing the server said is lost.
    pub fn from_code(code: &str) -> Self {
        match code {
            INVALID_REQUEST => Self::new(
                "Invalid request",
                "Please check your input and try again.",
                code,
            ),
            PROMPT_TOO_LONG => Self::new(
                "Message too long",
                "Please shorten your message and try again.",
                code,
            ),
            QUOTA_EXCEEDED => Self::new(
                "Quota exceeded",
                "You have used up today's quota. Please come back tomorrow.",
                code,
            ),
            UNAUTHORIZED => Self::new("Unauthorized", "Please sign in again.", code),
            INTERNAL_SERVER => Self::new(
                "Internal server error",
                "Please try again later.",
                code,
            ),
            "" => Self::new(GENERIC_TITLE, "Please try again.", UNKNOWN),
            other => Self::new(GENERIC_TITLE, other, other),
        }
    }

    /// Plain text without a code.
    pub fn from_text(message: &str) -> Self {
        let message = if message.trim().is_empty() {
            "An unknown error occurred."
        } else {
            message
        };
        Self::new(GENERIC_TITLE, message, UNKNOWN)
    }

    /// Payload of a socket `error` frame. Known codes win; otherwise the
    /// frame's own message is shown.
    pub fn from_ws_error(code: Option<&str>, message: Option<&str>) -> Self {
        match code {
            Some(c) if is_known(c) => Self::from_code(c),
            _ => Self::from_text(message.unwrap_or_default()),
        }
    }

    pub fn from_error(err: &AilawError) -> Self {
        match err {
            AilawError::Api { code, .. } if is_known(code) => Self::from_code(code),
            AilawError::Api { message, .. } => Self::from_text(message),
            AilawError::LoggedOut | AilawError::RefreshFailed | AilawError::MissingToken => {
                Self::from_code(UNAUTHORIZED)
            }
            other => Self::from_text(&other.to_string()),
        }
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} [{}]", self.title, self.message, self.code)
    }
}

pub fn is_known(code: &str) -> bool {
    matches!(
        code,
        INVALID_REQUEST | PROMPT_TOO_LONG | QUOTA_EXCEEDED | UNAUTHORIZED | INTERNAL_SERVER
    )
}
