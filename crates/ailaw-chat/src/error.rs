use ailaw_core::types::MessageId;
use ailaw_core::AilawError;
use thiserror::Error;

/// Errors that can occur while driving a conversation.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Blank prompt.
    #[error("message is empty")]
    EmptyInput,

    /// A previous message is still being answered.
    #[error("a message is already being answered")]
    Busy,

    /// Feedback target is not a model message of this conversation.
    #[error("message not found: {id}")]
    UnknownMessage { id: MessageId },

    /// The prompt could not be delivered. The optimistic message was removed
    /// and `input` holds the text so it can be offered again.
    #[error("send failed: {source}")]
    SendFailed {
        input: String,
        #[source]
        source: AilawError,
    },

    #[error(transparent)]
    Api(#[from] AilawError),
}

impl ChatError {
    /// Text to put back into the input box, if the failure returned it.
    pub fn into_input(self) -> Option<String> {
        match self {
            ChatError::SendFailed { input, .. } => Some(input),
            _ => None,
        }
    }

    pub fn api_error(&self) -> Option<&AilawError> {
        match self {
            ChatError::SendFailed { source, .. } => Some(source),
            ChatError::Api(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;
