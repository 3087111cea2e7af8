use ailaw_core::types::{Feedback, ModelType, Role};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// Every REST response: `{ "code": "00000", "message": "SUCCESS", "data": … }`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Envelope {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Instruction carried in `data.action` when the access token is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Token expired: refresh it and retry.
    Refresh,
    /// Session is gone: drop the token and sign in again.
    Logout,
}

impl Envelope {
    pub fn action(&self) -> Option<Action> {
        match self.data.as_ref()?.get("action")?.as_str()? {
            "refresh" => Some(Action::Refresh),
            "logout" => Some(Action::Logout),
            _ => None,
        }
    }

    /// Decode `data` into a typed payload. Missing `data` decodes as `null`,
    /// so `()` and `Option<T>` targets accept empty responses.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data.clone().unwrap_or(Value::Null))
    }
}

/// `data` of `/auth/refresh` and `/auth/google/callback`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenData {
    pub access_token: String,
}

/// `POST /api/session`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub title: String,
}

/// `PATCH /api/name/session/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameSessionRequest {
    pub new_name: String,
}

/// `PATCH /api/feedback/{messageId}`. `None` serializes as `null` (cleared).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub feedback: Option<Feedback>,
}

/// `POST /api/model` — the one-shot HTTP path used when the socket is down.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRequest {
    pub session_id: String,
    pub model_type: ModelType,
    pub input: ModelInput,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInput {
    pub messages: ModelInputMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInputMessage {
    pub role: Role,
    pub content: String,
}

impl ModelRequest {
    pub fn user(session_id: impl Into<String>, model_type: ModelType, content: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            model_type,
            input: ModelInput {
                messages: ModelInputMessage {
                    role: Role::User,
                    content: content.into(),
                },
            },
        }
    }
}

/// `data` of `POST /api/model`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelReply {
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "modelMessageID", alias = "modelMessageId")]
    pub model_message_id: Option<String>,
}
