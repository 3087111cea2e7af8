use std::sync::Arc;

use ailaw_api::ApiClient;
use ailaw_core::{AilawConfig, TokenStore};

/// Shared state of one CLI invocation.
pub struct App {
    pub config: AilawConfig,
    pub tokens: TokenStore,
    pub api: Arc<ApiClient>,
}

impl App {
    pub fn new(config: AilawConfig) -> anyhow::Result<Self> {
        let tokens = TokenStore::new(config.auth.access_token.clone());
        let api = ApiClient::new(&config.server, tokens.clone(), config.auth.refresh_token.as_deref())?;
        Ok(Self {
            config,
            tokens,
            api: Arc::new(api),
        })
    }

    /// Fail early with a hint instead of a 401 from the server.
    pub fn require_login(&self) -> anyhow::Result<()> {
        if self.tokens.is_present() {
            Ok(())
        } else {
            anyhow::bail!("not signed in; run `ailaw login --url` first")
        }
    }
}
