use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::ModelType;

// Connection constants, matching what the web client does against the same backend
pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const RECONNECT_BASE_MS: u64 = 1_000;
pub const RECONNECT_MAX_MS: u64 = 30_000;
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;
pub const HEARTBEAT_INTERVAL_SECS: u64 = 30; // ping cadence while connected
pub const REQUEST_TIMEOUT_SECS: u64 = 300; // backend waits up to 300s on the model

/// Top-level config (ailaw.toml + AILAW_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AilawConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// WebSocket base URL. Derived from `api_url` when unset.
    #[serde(default)]
    pub ws_url: Option<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            ws_url: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ServerConfig {
    /// API base without a trailing slash.
    pub fn api_base(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    /// WebSocket base: explicit `ws_url`, otherwise `api_url` with the
    /// scheme swapped (`http` → `ws`, `https` → `wss`).
    pub fn ws_base(&self) -> crate::error::Result<String> {
        if let Some(ws) = self.ws_url.as_deref().filter(|s| !s.trim().is_empty()) {
            return Ok(ws.trim_end_matches('/').to_string());
        }
        let mut url = url::Url::parse(self.api_base()).map_err(|e| {
            crate::error::AilawError::Config(format!("invalid api_url {}: {e}", self.api_url))
        })?;
        let scheme = match url.scheme() {
            "https" => "wss",
            "http" => "ws",
            other => {
                return Err(crate::error::AilawError::Config(format!(
                    "cannot derive websocket url from scheme {other}"
                )))
            }
        };
        url.set_scheme(scheme).map_err(|_| {
            crate::error::AilawError::Config(format!("cannot set scheme {scheme}"))
        })?;
        Ok(url.as_str().trim_end_matches('/').to_string())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Reconnect and heartbeat tuning for the socket client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    #[serde(default = "default_reconnect_base")]
    pub reconnect_base_ms: u64,
    #[serde(default = "default_reconnect_max")]
    pub reconnect_max_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_reconnect_attempts: u32,
    #[serde(default = "default_heartbeat")]
    pub heartbeat_secs: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            reconnect_base_ms: default_reconnect_base(),
            reconnect_max_ms: default_reconnect_max(),
            max_reconnect_attempts: default_max_attempts(),
            heartbeat_secs: default_heartbeat(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChatConfig {
    #[serde(default)]
    pub model_type: ModelType,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    pub access_token: Option<String>,
    /// Value of the `refresh_token` cookie issued by the backend under `/auth`.
    pub refresh_token: Option<String>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}
fn default_request_timeout() -> u64 {
    REQUEST_TIMEOUT_SECS
}
fn default_reconnect_base() -> u64 {
    RECONNECT_BASE_MS
}
fn default_reconnect_max() -> u64 {
    RECONNECT_MAX_MS
}
fn default_max_attempts() -> u32 {
    MAX_RECONNECT_ATTEMPTS
}
fn default_heartbeat() -> u64 {
    HEARTBEAT_INTERVAL_SECS
}

impl AilawConfig {
    /// Load config from a TOML file with AILAW_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. `AILAW_CONFIG` env var
    ///   3. ~/.ailaw/ailaw.toml
    ///
    /// A missing file is not an error; every field has a default. Env keys
    /// use `__` between section and field: `AILAW_SERVER__API_URL`.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .or_else(|| std::env::var("AILAW_CONFIG").ok())
            .unwrap_or_else(default_config_path);

        Self::figment(&path)
            .merge(Env::prefixed("AILAW_").split("__"))
            .extract()
            .map_err(|e| crate::error::AilawError::Config(e.to_string()))
    }

    /// File-only layer, without env overrides.
    pub fn load_file(path: &str) -> crate::error::Result<Self> {
        Self::figment(path)
            .extract()
            .map_err(|e| crate::error::AilawError::Config(e.to_string()))
    }

    fn figment(path: &str) -> Figment {
        Figment::new().merge(Toml::file(path))
    }
}

pub fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.ailaw/ailaw.toml", home)
}
