use ailaw_core::types::ModelType;
use serde::{Deserialize, Serialize};

/// Client → Server frame.
/// Wire: `{ "type": "chat", "sessionId": "…", "content": "…", "modelType": "NORMAL" }`
/// or the heartbeat `{ "type": "ping" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    #[serde(rename_all = "camelCase")]
    Chat {
        session_id: String,
        content: String,
        model_type: ModelType,
    },
    Ping,
}

impl ClientFrame {
    pub fn chat(session_id: impl Into<String>, content: impl Into<String>, model_type: ModelType) -> Self {
        ClientFrame::Chat {
            session_id: session_id.into(),
            content: content.into(),
            model_type,
        }
    }

    pub fn to_json(&self) -> String {
        // Only strings and unit enums inside; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Server → Client frame, discriminated by `type`.
///
/// Every payload field is optional on the wire; the backend omits empty
/// fields. Deciding which frames are complete enough to act on is the
/// receiver's job. Unknown `type` values decode to [`ServerFrame::Unknown`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Chat request accepted.
    #[serde(rename_all = "camelCase")]
    Ack {
        #[serde(default)]
        session_id: Option<String>,
    },

    /// Incremental text of the answer being generated.
    #[serde(rename_all = "camelCase")]
    Chunk {
        #[serde(default)]
        content: Option<String>,
        #[serde(default)]
        session_id: Option<String>,
    },

    /// Answer finished and persisted.
    #[serde(rename_all = "camelCase")]
    Done {
        #[serde(default)]
        session_id: Option<String>,
        #[serde(default)]
        model_message_id: Option<String>,
        #[serde(default)]
        content: Option<String>,
    },

    #[serde(rename_all = "camelCase")]
    Error {
        #[serde(default)]
        error: Option<WsError>,
        #[serde(default)]
        session_id: Option<String>,
    },

    /// Reply to a heartbeat `ping`.
    Pong,

    /// The input guard accepted the question.
    #[serde(rename_all = "camelCase")]
    GuardPassed {
        #[serde(default)]
        session_id: Option<String>,
    },

    /// Free-form progress line ("searching statutes…").
    #[serde(rename_all = "camelCase")]
    Status {
        #[serde(default)]
        status: Option<String>,
        #[serde(default)]
        session_id: Option<String>,
    },

    /// Chain-of-thought plan announced before the steps run.
    #[serde(rename_all = "camelCase")]
    Plan {
        #[serde(default)]
        steps: Option<Vec<String>>,
        #[serde(default)]
        rationale: Option<String>,
        #[serde(default)]
        session_id: Option<String>,
    },

    /// One chain-of-thought step started.
    #[serde(rename_all = "camelCase")]
    CotStep {
        #[serde(default)]
        current_step: Option<u32>,
        #[serde(default)]
        total_steps: Option<u32>,
        #[serde(default)]
        step_description: Option<String>,
        #[serde(default)]
        session_id: Option<String>,
    },

    #[serde(other)]
    Unknown,
}

impl ServerFrame {
    /// Parse one text frame.
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Wire name of the frame type, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerFrame::Ack { .. } => "ack",
            ServerFrame::Chunk { .. } => "chunk",
            ServerFrame::Done { .. } => "done",
            ServerFrame::Error { .. } => "error",
            ServerFrame::Pong => "pong",
            ServerFrame::GuardPassed { .. } => "guard_passed",
            ServerFrame::Status { .. } => "status",
            ServerFrame::Plan { .. } => "plan",
            ServerFrame::CotStep { .. } => "cot_step",
            ServerFrame::Unknown => "unknown",
        }
    }
}

/// Error payload of an `error` frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WsError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
