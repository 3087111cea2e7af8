use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// Chat session identifier, issued by the backend (UUID string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Message identifier. Server-issued for persisted messages, random UUIDv4
/// for messages created locally before the server has answered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Answering mode requested from the backend.
///
/// `Cot` asks for chain-of-thought answers, which is what produces the
/// `plan` and `cot_step` progress frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ModelType {
    #[default]
    Normal,
    Cot,
}

impl ModelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::Normal => "NORMAL",
            ModelType::Cot => "COT",
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NORMAL" => Ok(ModelType::Normal),
            "COT" => Ok(ModelType::Cot),
            other => Err(format!("unknown model type: {}", other)),
        }
    }
}

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Model => write!(f, "model"),
        }
    }
}

/// Thumbs up / thumbs down on a model answer. Wire values are `1` and `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feedback {
    Like,
    Dislike,
}

impl Feedback {
    pub fn as_i8(self) -> i8 {
        match self {
            Feedback::Like => 1,
            Feedback::Dislike => -1,
        }
    }

    pub fn from_i64(v: i64) -> Option<Self> {
        match v {
            1 => Some(Feedback::Like),
            -1 => Some(Feedback::Dislike),
            _ => None,
        }
    }
}

impl Serialize for Feedback {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_i8(self.as_i8())
    }
}

impl<'de> Deserialize<'de> for Feedback {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        feedback_from_value(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid feedback value: {raw}")))
    }
}

/// History rows store feedback as a nullable string column, live updates use
/// numbers. Accept both, plus `null`.
pub fn deserialize_optional_feedback<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Feedback>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    match raw {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => match feedback_from_value(&v) {
            Some(f) => Ok(Some(f)),
            // unknown strings ("", "none") mean no feedback recorded
            None if v.is_string() => Ok(None),
            None => Err(serde::de::Error::custom(format!("invalid feedback value: {v}"))),
        },
    }
}

fn feedback_from_value(v: &serde_json::Value) -> Option<Feedback> {
    match v {
        serde_json::Value::Number(n) => n.as_i64().and_then(Feedback::from_i64),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok().and_then(Feedback::from_i64),
        _ => None,
    }
}

/// One message of a conversation as held by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub message_id: MessageId,
    pub role: Role,
    pub content: String,
    /// RFC3339 timestamp.
    pub created_at: String,
    #[serde(default, deserialize_with = "deserialize_optional_feedback")]
    pub feedback: Option<Feedback>,
}

impl ChatMessage {
    /// A message created on this side, stamped now with a fresh local id.
    pub fn local(role: Role, content: impl Into<String>) -> Self {
        Self {
            message_id: MessageId::new(),
            role,
            content: content.into(),
            created_at: chrono::Utc::now().to_rfc3339(),
            feedback: None,
        }
    }
}

/// Entry of the session list shown in the sidebar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub title: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub last_message_at: Option<String>,
}

/// Title used for a session derived from its first prompt.
pub const TITLE_MAX_CHARS: usize = 50;

/// Fallback title when a conversation has no messages yet.
pub const DEFAULT_TITLE: &str = "New Chat";

/// First [`TITLE_MAX_CHARS`] characters of `text`, counted in chars so Thai
/// and other multi-byte text is never cut mid-codepoint.
pub fn title_from(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return DEFAULT_TITLE.to_string();
    }
    trimmed.chars().take(TITLE_MAX_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_type_wire_is_uppercase() {
        assert_eq!(serde_json::to_string(&ModelType::Cot).unwrap(), r#""COT""#);
        assert_eq!("normal".parse::<ModelType>().unwrap(), ModelType::Normal);
        assert!("fast".parse::<ModelType>().is_err());
    }

    #[test]
    fn feedback_accepts_numbers_and_strings() {
        let json = r#"{"messageId":"m1","role":"model","content":"hi","createdAt":"2025-01-01T00:00:00Z","feedback":"-1"}"#;
        let msg: ChatMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.feedback, Some(Feedback::Dislike));

        let json = r#"{"messageId":"m2","role":"model","content":"hi","createdAt":"2025-01-01T00:00:00Z","feedback":1}"#;
        let msg: ChatMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.feedback, Some(Feedback::Like));
    }

    #[test]
    fn feedback_null_or_missing_is_none() {
        let json = r#"{"messageId":"m1","role":"user","content":"q","createdAt":"x","feedback":null}"#;
        let msg: ChatMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.feedback, None);

        let json = r#"{"messageId":"m1","role":"user","content":"q","createdAt":"x"}"#;
        let msg: ChatMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.feedback, None);
    }

    #[test]
    fn title_counts_chars_not_bytes() {
        let thai = "ก".repeat(80);
        assert_eq!(title_from(&thai).chars().count(), TITLE_MAX_CHARS);
        assert_eq!(title_from("   "), DEFAULT_TITLE);
        assert_eq!(title_from(" short "), "short");
    }
}
