use std::sync::Arc;

use ailaw_api::ApiClient;
use ailaw_core::types::{title_from, Feedback, MessageId, ModelType, SessionId};
use ailaw_core::ErrorInfo;
use ailaw_stream::{StreamEvent, StreamHandle};
use tracing::{debug, info, instrument, warn};

use crate::conversation::Conversation;
use crate::error::{ChatError, Result};

/// Shown when the one-shot HTTP answer comes back empty.
const NO_RESPONSE: &str = "No response";

/// How a prompt was delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Went out on the socket; the answer arrives as events.
    Streaming,
    /// Socket unavailable; answered in one piece over HTTP.
    Answered(MessageId),
}

/// Drives one [`Conversation`] against the backend: history, sending with
/// socket-first delivery and HTTP fallback, and message feedback.
pub struct ChatSession {
    api: Arc<ApiClient>,
    stream: Option<StreamHandle>,
    conversation: Conversation,
    model_type: ModelType,
    sending: bool,
}

impl ChatSession {
    /// `stream` is optional; without one every prompt takes the HTTP path.
    pub fn new(api: Arc<ApiClient>, stream: Option<StreamHandle>, model_type: ModelType) -> Self {
        Self {
            api,
            stream,
            conversation: Conversation::new(),
            model_type,
            sending: false,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn model_type(&self) -> ModelType {
        self.model_type
    }

    pub fn set_model_type(&mut self, model_type: ModelType) {
        self.model_type = model_type;
    }

    /// True between a streamed send and its `done` / `error`.
    pub fn is_sending(&self) -> bool {
        self.sending
    }

    /// Switch to `session_id` and load its history.
    #[instrument(skip(self))]
    pub async fn load_history(&mut self, session_id: SessionId) -> Result<()> {
        let messages = self.api.messages(&session_id).await?;
        debug!(count = messages.len(), "history loaded");
        self.conversation = Conversation::with_session(session_id);
        self.conversation.load(messages);
        self.sending = false;
        Ok(())
    }

    /// Send a prompt.
    ///
    /// Creates the server session on the first prompt. Tries the socket
    /// first; when it is not open, asks the model over HTTP. A failed HTTP
    /// send removes the optimistic message and returns the prompt inside
    /// [`ChatError::SendFailed`].
    #[instrument(skip(self, content), fields(len = content.len()))]
    pub async fn send(&mut self, content: &str) -> Result<SendOutcome> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ChatError::EmptyInput);
        }
        if self.sending {
            return Err(ChatError::Busy);
        }

        let session_id = match self.conversation.session_id() {
            Some(id) => id.clone(),
            None => {
                let id = self
                    .api
                    .create_session(&title_from(content))
                    .await
                    .map_err(|source| ChatError::SendFailed {
                        input: content.to_string(),
                        source,
                    })?;
                self.conversation.set_session_id(id.clone());
                id
            }
        };

        self.conversation.push_user(content)?;

        if let Some(stream) = &self.stream {
            if stream.send_chat(&session_id, content, self.model_type) {
                debug!(%session_id, "prompt sent on socket");
                self.sending = true;
                return Ok(SendOutcome::Streaming);
            }
        }

        info!(%session_id, "socket unavailable, asking over http");
        self.sending = true;
        let reply = self.api.ask_model(&session_id, self.model_type, content).await;
        self.sending = false;
        match reply {
            Ok(reply) => {
                let text = if reply.message.is_empty() {
                    NO_RESPONSE.to_string()
                } else {
                    reply.message
                };
                let id = self
                    .conversation
                    .push_model(reply.model_message_id.map(MessageId::from), text);
                Ok(SendOutcome::Answered(id))
            }
            Err(source) => {
                warn!(error = %source, "http send failed");
                self.conversation.revert_pending();
                Err(ChatError::SendFailed {
                    input: content.to_string(),
                    source,
                })
            }
        }
    }

    /// Feed a socket event into the conversation. Returns the message to
    /// show if the event reported an error.
    pub fn handle(&mut self, event: &StreamEvent) -> Option<ErrorInfo> {
        if matches!(event, StreamEvent::Done { .. } | StreamEvent::Error { .. })
            && self.conversation.is_current(event)
        {
            self.sending = false;
        }
        self.conversation.apply(event)
    }

    /// Stop waiting for the streamed answer. Whatever the server still sends
    /// for it is dropped, so the next prompt gets its own answer.
    pub fn interrupt(&mut self) -> Option<String> {
        if !self.sending {
            return None;
        }
        self.sending = false;
        self.conversation.abort_stream()
    }

    pub async fn like(&mut self, message_id: &MessageId) -> Result<Option<Feedback>> {
        self.feedback(message_id, Feedback::Like).await
    }

    pub async fn dislike(&mut self, message_id: &MessageId) -> Result<Option<Feedback>> {
        self.feedback(message_id, Feedback::Dislike).await
    }

    /// Optimistic toggle, persisted; restored if the server refuses.
    /// Returns the feedback now in effect.
    #[instrument(skip(self))]
    async fn feedback(&mut self, message_id: &MessageId, kind: Feedback) -> Result<Option<Feedback>> {
        let previous = self.conversation.toggle_feedback(message_id, kind)?;
        let current = self.conversation.feedback_of(message_id);
        if let Err(e) = self.api.set_feedback(message_id, current).await {
            warn!(error = %e, "feedback not saved, reverting");
            self.conversation.revert_feedback(message_id, previous);
            return Err(e.into());
        }
        Ok(current)
    }
}
