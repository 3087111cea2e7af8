use std::sync::Arc;

use ailaw_core::config::ServerConfig;
use ailaw_core::error::{AilawError, Result};
use ailaw_core::TokenStore;
use ailaw_protocol::envelope::{Action, Envelope};
use ailaw_protocol::routes;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

/// HTTP client bound to one backend and one signed-in user.
pub struct ApiClient {
    pub(crate) http: reqwest::Client,
    pub(crate) base: String,
    pub(crate) tokens: TokenStore,
    jar: Arc<Jar>,
    /// Serializes token refreshes so concurrent callers share one refresh.
    refresh_lock: tokio::sync::Mutex<()>,
    timeout_ms: u64,
}

impl ApiClient {
    /// Build a client. `refresh_token`, when given, seeds the cookie jar the
    /// way a browser would hold the backend's `refresh_token` cookie.
    pub fn new(
        server: &ServerConfig,
        tokens: TokenStore,
        refresh_token: Option<&str>,
    ) -> Result<Self> {
        let base = server.api_base().to_string();
        let base_url = url::Url::parse(&base)
            .map_err(|e| AilawError::Config(format!("invalid api_url {base}: {e}")))?;

        let jar = Arc::new(Jar::default());
        if let Some(rt) = refresh_token.filter(|t| !t.trim().is_empty()) {
            jar.add_cookie_str(
                &format!("{}={}; Path=/auth", routes::REFRESH_COOKIE, rt.trim()),
                &base_url,
            );
        }

        let http = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .timeout(server.request_timeout())
            .build()
            .map_err(|e| AilawError::Http(e.to_string()))?;

        Ok(Self {
            http,
            base,
            tokens,
            jar,
            refresh_lock: tokio::sync::Mutex::new(()),
            timeout_ms: server.request_timeout().as_millis() as u64,
        })
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// The `refresh_token` cookie the jar would send to the refresh
    /// endpoint. Set by the OAuth callback and rotated by refreshes.
    pub fn refresh_token(&self) -> Option<String> {
        let url = url::Url::parse(&self.url(routes::AUTH_REFRESH)).ok()?;
        let header = self.jar.cookies(&url)?;
        header
            .to_str()
            .ok()?
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == routes::REFRESH_COOKIE)
            .map(|(_, value)| value.to_string())
            .filter(|value| !value.is_empty())
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Authenticated JSON call that returns the envelope's `data`.
    ///
    /// - `data.action == "logout"`: token dropped, [`AilawError::LoggedOut`].
    /// - `data.action == "refresh"`: token refreshed once and the request
    ///   retried; a failed refresh logs out with [`AilawError::RefreshFailed`].
    /// - any other non-2xx: [`AilawError::Api`] with the envelope's code.
    #[instrument(skip(self, body))]
    pub async fn call<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut retried = false;
        loop {
            let token = self.tokens.get().ok_or(AilawError::MissingToken)?;
            let (status, envelope) = self.send(method.clone(), path, body, Some(&token)).await?;

            match envelope.action() {
                Some(Action::Logout) => {
                    warn!("server requested logout");
                    self.logout().await;
                    return Err(AilawError::LoggedOut);
                }
                Some(Action::Refresh) if !retried => {
                    debug!("access token expired, refreshing");
                    if self.refresh_after(&token).await {
                        retried = true;
                        continue;
                    }
                    warn!("refresh failed, logging out");
                    self.logout().await;
                    return Err(AilawError::RefreshFailed);
                }
                Some(Action::Refresh) => {
                    warn!("refreshed token rejected, logging out");
                    self.logout().await;
                    return Err(AilawError::RefreshFailed);
                }
                None => {}
            }

            if !status.is_success() {
                return Err(api_error(status, envelope));
            }
            return envelope.data_as().map_err(AilawError::from);
        }
    }

    /// One HTTP round trip, decoded into the envelope. Auth actions are left
    /// to the caller.
    pub(crate) async fn send<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        token: Option<&str>,
    ) -> Result<(StatusCode, Envelope)>
    where
        B: Serialize + ?Sized,
    {
        let mut req = self.http.request(method, self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await.map_err(|e| self.transport_error(e))?;
        let status = resp.status();
        let text = resp.text().await.map_err(|e| self.transport_error(e))?;

        if text.trim().is_empty() {
            return Ok((status, Envelope::default()));
        }
        match serde_json::from_str::<Envelope>(&text) {
            Ok(env) => Ok((status, env)),
            Err(e) => {
                debug!(%status, error = %e, "response body is not an envelope");
                Err(AilawError::Http(format!("HTTP {status}: unexpected response body")))
            }
        }
    }

    /// Refresh unless another caller already replaced `stale` while we
    /// waited for the lock.
    async fn refresh_after(&self, stale: &str) -> bool {
        let _guard = self.refresh_lock.lock().await;
        match self.tokens.get() {
            Some(current) if current != stale => {
                debug!("token already refreshed by a concurrent request");
                true
            }
            _ => self.refresh().await,
        }
    }

    /// Exchange the refresh cookie for a new access token.
    ///
    /// Returns `false` on any failure; the caller decides whether to log out.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> bool {
        let (status, envelope) = match self
            .send::<()>(Method::POST, routes::AUTH_REFRESH, None, None)
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "token refresh request failed");
                return false;
            }
        };
        if !status.is_success() {
            warn!(%status, code = %envelope.code, "token refresh rejected");
            return false;
        }
        match envelope.data_as::<ailaw_protocol::envelope::AccessTokenData>() {
            Ok(data) if !data.access_token.is_empty() => {
                self.tokens.set(data.access_token);
                info!("access token refreshed");
                true
            }
            _ => {
                warn!("refresh response carried no access token");
                false
            }
        }
    }

    /// Tell the server to drop the session, then forget the token locally
    /// whatever the server answered.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        let token = self.tokens.get();
        if let Err(e) = self
            .send::<()>(Method::POST, routes::AUTH_LOGOUT, None, token.as_deref())
            .await
        {
            warn!(error = %e, "logout request failed");
        }
        self.tokens.clear();
        info!("logged out");
    }

    /// `GET /health`, unauthenticated.
    pub async fn health(&self) -> Result<()> {
        let resp = self
            .http
            .get(self.url(routes::HEALTH))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(AilawError::Http(format!("health check returned {}", resp.status())))
        }
    }

    pub(crate) fn transport_error(&self, e: reqwest::Error) -> AilawError {
        if e.is_timeout() {
            AilawError::Timeout { ms: self.timeout_ms }
        } else {
            AilawError::Http(e.to_string())
        }
    }
}

pub(crate) fn api_error(status: StatusCode, envelope: Envelope) -> AilawError {
    let code = if envelope.code.is_empty() {
        status.as_u16().to_string()
    } else {
        envelope.code
    };
    let message = if envelope.message.is_empty() {
        "API request failed".to_string()
    } else {
        envelope.message
    };
    AilawError::Api { code, message }
}
