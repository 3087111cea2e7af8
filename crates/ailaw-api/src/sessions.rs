use ailaw_core::error::{AilawError, Result};
use ailaw_core::types::{SessionId, SessionSummary};
use ailaw_protocol::envelope::{CreateSessionRequest, RenameSessionRequest};
use ailaw_protocol::routes;
use reqwest::Method;
use tracing::{info, instrument};

use crate::client::ApiClient;

impl ApiClient {
    /// Sessions of the signed-in user, newest first as the server orders them.
    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        let sessions: Option<Vec<SessionSummary>> = self
            .call::<(), _>(Method::GET, routes::SESSIONS_HISTORY, None)
            .await?;
        Ok(sessions.unwrap_or_default())
    }

    /// Create a session and return its id. See
    /// [`ailaw_core::types::title_from`] for deriving a title from a prompt.
    #[instrument(skip(self))]
    pub async fn create_session(&self, title: &str) -> Result<SessionId> {
        let body = CreateSessionRequest {
            title: title.to_string(),
        };
        let id: String = self
            .call(Method::POST, routes::SESSION_CREATE, Some(&body))
            .await?;
        if id.is_empty() {
            return Err(AilawError::Protocol("server returned an empty session id".into()));
        }
        info!(session_id = %id, "session created");
        Ok(SessionId(id))
    }

    /// Rename a session. The name is trimmed and must not be blank.
    #[instrument(skip(self))]
    pub async fn rename_session(&self, session_id: &SessionId, new_name: &str) -> Result<String> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(AilawError::InvalidInput("session name must not be blank".into()));
        }
        let body = RenameSessionRequest {
            new_name: new_name.to_string(),
        };
        let _: serde_json::Value = self
            .call(Method::PATCH, &routes::session_name(session_id.as_str()), Some(&body))
            .await?;
        Ok(new_name.to_string())
    }

    #[instrument(skip(self))]
    pub async fn delete_session(&self, session_id: &SessionId) -> Result<()> {
        let _: serde_json::Value = self
            .call::<(), _>(Method::DELETE, &routes::session(session_id.as_str()), None)
            .await?;
        info!(%session_id, "session deleted");
        Ok(())
    }
}
