use ailaw_core::types::{MessageId, SessionId};
use ailaw_protocol::frames::ServerFrame;
use tracing::{debug, warn};

use crate::types::StreamEvent;

const UNKNOWN_ERROR: &str = "Unknown error";

/// Decode one text frame and turn it into an event.
///
/// Returns `None` for control frames (`ack`, `pong`, `guard_passed`),
/// unknown types, malformed JSON and frames missing the fields their
/// handler needs.
pub fn decode(text: &str) -> Option<StreamEvent> {
    match ServerFrame::decode(text) {
        Ok(frame) => to_event(frame),
        Err(e) => {
            warn!(error = %e, "dropping malformed frame");
            None
        }
    }
}

pub fn to_event(frame: ServerFrame) -> Option<StreamEvent> {
    let kind = frame.kind();
    let event = match frame {
        ServerFrame::Chunk {
            content: Some(content),
            session_id: Some(session_id),
        } => Some(StreamEvent::Chunk {
            session_id: SessionId(session_id),
            content,
        }),
        ServerFrame::Chunk { .. } => None,

        ServerFrame::Done {
            session_id,
            model_message_id,
            content,
        } => Some(StreamEvent::Done {
            session_id: session_id.map(SessionId),
            model_message_id: model_message_id.filter(|id| !id.is_empty()).map(MessageId),
            content,
        }),

        ServerFrame::Error { error, session_id } => {
            let error = error.unwrap_or_default();
            Some(StreamEvent::Error {
                session_id: session_id.map(SessionId),
                code: error.code,
                message: error.message.unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
            })
        }

        ServerFrame::Status {
            status: Some(status),
            session_id,
        } => Some(StreamEvent::Status {
            session_id: session_id.map(SessionId),
            status,
        }),
        ServerFrame::Status { .. } => None,

        ServerFrame::Plan {
            steps: Some(steps),
            rationale,
            session_id,
        } => Some(StreamEvent::Plan {
            session_id: session_id.map(SessionId),
            steps,
            rationale: rationale.unwrap_or_default(),
        }),
        ServerFrame::Plan { .. } => None,

        ServerFrame::CotStep {
            current_step: Some(current_step),
            total_steps: Some(total_steps),
            step_description,
            session_id,
        } => Some(StreamEvent::CotStep {
            session_id: session_id.map(SessionId),
            current_step,
            total_steps,
            description: step_description.unwrap_or_default(),
        }),
        ServerFrame::CotStep { .. } => None,

        ServerFrame::Ack { .. } | ServerFrame::Pong | ServerFrame::GuardPassed { .. } => None,
        ServerFrame::Unknown => None,
    };
    if event.is_none() {
        debug!(kind, "frame not dispatched");
    }
    event
}
