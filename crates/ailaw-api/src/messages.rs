use ailaw_core::error::Result;
use ailaw_core::types::{ChatMessage, Feedback, MessageId, ModelType, SessionId};
use ailaw_protocol::envelope::{FeedbackRequest, ModelReply, ModelRequest};
use ailaw_protocol::routes;
use reqwest::Method;
use tracing::{debug, instrument};

use crate::client::ApiClient;

impl ApiClient {
    /// Full message history of a session, oldest first.
    pub async fn messages(&self, session_id: &SessionId) -> Result<Vec<ChatMessage>> {
        let messages: Option<Vec<ChatMessage>> = self
            .call::<(), _>(Method::GET, &routes::messages_history(session_id.as_str()), None)
            .await?;
        Ok(messages.unwrap_or_default())
    }

    /// One-shot, non-streaming answer. Used when the socket is unavailable.
    #[instrument(skip(self, content), fields(len = content.len()))]
    pub async fn ask_model(
        &self,
        session_id: &SessionId,
        model_type: ModelType,
        content: &str,
    ) -> Result<ModelReply> {
        let body = ModelRequest::user(session_id.as_str(), model_type, content);
        let reply: ModelReply = self.call(Method::POST, routes::MODEL, Some(&body)).await?;
        debug!(reply_len = reply.message.len(), "model replied over http");
        Ok(reply)
    }

    /// Record like / dislike on a model message; `None` clears it.
    #[instrument(skip(self))]
    pub async fn set_feedback(&self, message_id: &MessageId, feedback: Option<Feedback>) -> Result<()> {
        let body = FeedbackRequest { feedback };
        let _: serde_json::Value = self
            .call(Method::PATCH, &routes::feedback(message_id.as_str()), Some(&body))
            .await?;
        Ok(())
    }
}
