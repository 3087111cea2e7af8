use std::time::Duration;

use ailaw_core::types::{MessageId, SessionId};

/// Runtime state of the socket, published on the handle's `watch` channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No socket and nothing scheduled.
    Disconnected,

    /// Handshake in progress.
    Connecting,

    /// Open and ready to send.
    Connected,

    /// Waiting out the backoff before reconnect attempt `attempt` (1-based).
    Reconnecting { attempt: u32 },
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }
}

/// Everything the socket reports to its owner, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Socket opened; the attempt counter was reset.
    Connected,

    /// Socket closed. `code` is the close code the peer sent, if any.
    Disconnected { code: Option<u16>, reason: String },

    /// A reconnect is scheduled after `delay`.
    Reconnecting { attempt: u32, delay: Duration },

    /// Next piece of the answer being streamed for `session_id`.
    Chunk { session_id: SessionId, content: String },

    /// Answer finished. `content`, when present, is the full final text.
    Done {
        session_id: Option<SessionId>,
        model_message_id: Option<MessageId>,
        content: Option<String>,
    },

    /// Server-side failure for the in-flight request.
    Error {
        session_id: Option<SessionId>,
        code: Option<String>,
        message: String,
    },

    Status { session_id: Option<SessionId>, status: String },

    Plan {
        session_id: Option<SessionId>,
        steps: Vec<String>,
        rationale: String,
    },

    CotStep {
        session_id: Option<SessionId>,
        current_step: u32,
        total_steps: u32,
        description: String,
    },
}

impl StreamEvent {
    /// Session the event belongs to. Connection events belong to none.
    pub fn session_id(&self) -> Option<&SessionId> {
        match self {
            StreamEvent::Chunk { session_id, .. } => Some(session_id),
            StreamEvent::Done { session_id, .. }
            | StreamEvent::Error { session_id, .. }
            | StreamEvent::Status { session_id, .. }
            | StreamEvent::Plan { session_id, .. }
            | StreamEvent::CotStep { session_id, .. } => session_id.as_ref(),
            StreamEvent::Connected
            | StreamEvent::Disconnected { .. }
            | StreamEvent::Reconnecting { .. } => None,
        }
    }
}
