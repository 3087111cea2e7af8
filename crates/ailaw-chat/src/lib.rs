pub mod conversation;
pub mod error;
pub mod session;
pub mod types;

pub use conversation::Conversation;
pub use error::ChatError;
pub use session::{ChatSession, SendOutcome};
pub use types::Progress;
