use ailaw_core::types::{title_from, ChatMessage, Feedback, MessageId, Role, SessionId, DEFAULT_TITLE};
use ailaw_core::ErrorInfo;
use ailaw_stream::StreamEvent;
use tracing::debug;

use crate::error::{ChatError, Result};
use crate::types::Progress;

/// Client-side state of one conversation.
///
/// Holds the settled messages, the answer currently being streamed, the
/// progress display and the optimistic user message still waiting for its
/// answer. All mutation is synchronous; network calls live in
/// [`crate::ChatSession`].
#[derive(Debug, Clone)]
pub struct Conversation {
    session_id: Option<SessionId>,
    title: String,
    messages: Vec<ChatMessage>,
    streaming: Option<String>,
    progress: Progress,
    pending: Option<MessageId>,
    /// An answer was given up on but the server may still be producing it;
    /// its frames are dropped until its `done` / `error` or a new socket.
    abandoned: bool,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    /// A fresh conversation without a server session yet.
    pub fn new() -> Self {
        Self {
            session_id: None,
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
            streaming: None,
            progress: Progress::default(),
            pending: None,
            abandoned: false,
        }
    }

    pub fn with_session(session_id: SessionId) -> Self {
        Self {
            session_id: Some(session_id),
            ..Self::new()
        }
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn set_session_id(&mut self, session_id: SessionId) {
        self.session_id = Some(session_id);
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Text received so far for the answer in flight.
    pub fn streaming_text(&self) -> Option<&str> {
        self.streaming.as_deref()
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming.is_some()
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    /// Id of the optimistic user message still waiting for an answer.
    pub fn pending(&self) -> Option<&MessageId> {
        self.pending.as_ref()
    }

    /// Replace the messages with server history and drop any transient state.
    pub fn load(&mut self, messages: Vec<ChatMessage>) {
        self.title = messages
            .first()
            .map(|m| title_from(&m.content))
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());
        self.messages = messages;
        self.streaming = None;
        self.progress.clear();
        self.pending = None;
        self.abandoned = false;
    }

    /// Optimistically append the user's prompt. The first prompt also names
    /// the conversation.
    pub fn push_user(&mut self, content: &str) -> Result<MessageId> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ChatError::EmptyInput);
        }
        if self.messages.is_empty() {
            self.title = title_from(content);
        }
        let message = ChatMessage::local(Role::User, content);
        let id = message.message_id.clone();
        self.messages.push(message);
        self.pending = Some(id.clone());
        Ok(id)
    }

    /// Take back the pending user message after a failed send.
    pub fn revert_pending(&mut self) -> Option<ChatMessage> {
        let id = self.pending.take()?;
        let pos = self.messages.iter().position(|m| m.message_id == id)?;
        let removed = self.messages.remove(pos);
        if self.messages.is_empty() {
            self.title = DEFAULT_TITLE.to_string();
        }
        Some(removed)
    }

    /// Give up on the answer in flight. The user message stays; the partial
    /// text is returned. Later frames of that answer are ignored.
    pub fn abort_stream(&mut self) -> Option<String> {
        if self.pending.is_some() || self.streaming.is_some() {
            self.abandoned = true;
        }
        self.progress.clear();
        self.pending = None;
        self.streaming.take()
    }

    /// Settle a complete (non-streamed) answer.
    pub fn push_model(&mut self, message_id: Option<MessageId>, content: impl Into<String>) -> MessageId {
        let mut message = ChatMessage::local(Role::Model, content);
        if let Some(id) = message_id {
            message.message_id = id;
        }
        let id = message.message_id.clone();
        self.messages.push(message);
        self.streaming = None;
        self.progress.clear();
        self.pending = None;
        id
    }

    /// Whether `event` is addressed to this conversation. Events without a
    /// session, or seen before the session exists, are accepted.
    pub fn accepts(&self, event: &StreamEvent) -> bool {
        match (event.session_id(), self.session_id.as_ref()) {
            (Some(theirs), Some(ours)) => theirs == ours,
            _ => true,
        }
    }

    /// Whether `event` belongs to the answer this conversation is waiting
    /// for, rather than another session or an abandoned answer.
    pub fn is_current(&self, event: &StreamEvent) -> bool {
        self.accepts(event) && !self.abandoned
    }

    /// Fold one socket event into the state. Returns the message to show
    /// when the event was an error.
    pub fn apply(&mut self, event: &StreamEvent) -> Option<ErrorInfo> {
        if !self.accepts(event) {
            debug!(session_id = ?event.session_id(), "event for another session ignored");
            return None;
        }
        if self.abandoned && self.skip_abandoned(event) {
            return None;
        }
        match event {
            StreamEvent::Chunk { content, .. } => {
                self.streaming.get_or_insert_with(String::new).push_str(content);
                None
            }
            StreamEvent::Done {
                model_message_id,
                content,
                ..
            } => {
                let streamed = self.streaming.take();
                let text = content
                    .clone()
                    .filter(|c| !c.is_empty())
                    .or(streamed)
                    .unwrap_or_default();
                if text.is_empty() {
                    debug!("done without content");
                    self.progress.clear();
                    self.pending = None;
                } else {
                    self.push_model(model_message_id.clone(), text);
                }
                None
            }
            StreamEvent::Error { code, message, .. } => {
                self.streaming = None;
                self.progress.clear();
                self.revert_pending();
                Some(ErrorInfo::from_ws_error(code.as_deref(), Some(message.as_str())))
            }
            StreamEvent::Status { status, .. } => {
                self.progress.status = Some(status.clone());
                None
            }
            StreamEvent::Plan { steps, rationale, .. } => {
                self.progress.plan = steps.clone();
                self.progress.rationale = rationale.clone();
                None
            }
            StreamEvent::CotStep {
                current_step,
                total_steps,
                description,
                ..
            } => {
                self.progress.current_step = Some(*current_step);
                self.progress.total_steps = Some(*total_steps);
                self.progress.step_description = Some(description.clone());
                None
            }
            StreamEvent::Connected
            | StreamEvent::Disconnected { .. }
            | StreamEvent::Reconnecting { .. } => None,
        }
    }

    /// Drop a frame of the abandoned answer. Its end, or any socket
    /// transition, stops the dropping.
    fn skip_abandoned(&mut self, event: &StreamEvent) -> bool {
        match event {
            StreamEvent::Chunk { .. }
            | StreamEvent::Status { .. }
            | StreamEvent::Plan { .. }
            | StreamEvent::CotStep { .. } => true,
            StreamEvent::Done { .. } | StreamEvent::Error { .. } => {
                debug!("end of abandoned answer");
                self.abandoned = false;
                true
            }
            StreamEvent::Connected | StreamEvent::Disconnected { .. } => {
                self.abandoned = false;
                false
            }
            StreamEvent::Reconnecting { .. } => false,
        }
    }

    pub fn feedback_of(&self, id: &MessageId) -> Option<Feedback> {
        self.messages
            .iter()
            .find(|m| &m.message_id == id)
            .and_then(|m| m.feedback)
    }

    /// Flip like/dislike on a model message: the same kind twice clears it.
    /// Returns the previous value for [`Conversation::revert_feedback`].
    pub fn toggle_feedback(&mut self, id: &MessageId, kind: Feedback) -> Result<Option<Feedback>> {
        let message = self
            .messages
            .iter_mut()
            .find(|m| &m.message_id == id && m.role == Role::Model)
            .ok_or_else(|| ChatError::UnknownMessage { id: id.clone() })?;
        let previous = message.feedback;
        message.feedback = if previous == Some(kind) { None } else { Some(kind) };
        Ok(previous)
    }

    pub fn revert_feedback(&mut self, id: &MessageId, previous: Option<Feedback>) {
        if let Some(message) = self.messages.iter_mut().find(|m| &m.message_id == id) {
            message.feedback = previous;
        }
    }
}
