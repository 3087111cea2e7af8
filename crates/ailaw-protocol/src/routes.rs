// Backend route paths, relative to the API base URL.

pub const HEALTH: &str = "/health";

// sessions
pub const SESSIONS_HISTORY: &str = "/api/sessions-history";
pub const SESSION_CREATE: &str = "/api/session";

pub fn session(session_id: &str) -> String {
    format!("/api/session/{session_id}")
}

pub fn session_name(session_id: &str) -> String {
    format!("/api/name/session/{session_id}")
}

// messages
pub fn messages_history(session_id: &str) -> String {
    format!("/api/messages-history/{session_id}")
}

pub const MODEL: &str = "/api/model";

pub fn feedback(message_id: &str) -> String {
    format!("/api/feedback/{message_id}")
}

// streaming (token travels in the `token` query parameter)
pub const WS: &str = "/api/ws";

// auth
pub const AUTH_REFRESH: &str = "/auth/refresh";
pub const AUTH_LOGOUT: &str = "/auth/logout";
pub const AUTH_GOOGLE_LOGIN: &str = "/auth/google/login";
pub const AUTH_GOOGLE_CALLBACK: &str = "/auth/google/callback";

/// Cookie that carries the refresh token, scoped to `/auth`.
pub const REFRESH_COOKIE: &str = "refresh_token";
