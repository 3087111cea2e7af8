use ailaw_core::error::{AilawError, Result};
use ailaw_protocol::envelope::AccessTokenData;
use ailaw_protocol::routes;
use reqwest::Method;
use tracing::{info, instrument};

use crate::client::{api_error, ApiClient};

impl ApiClient {
    /// Browser URL that starts the Google OAuth flow. The optional email is
    /// passed through as a login hint.
    pub fn google_login_url(&self, email_hint: Option<&str>) -> Result<String> {
        let mut url = url::Url::parse(&self.url(routes::AUTH_GOOGLE_LOGIN))
            .map_err(|e| AilawError::Config(e.to_string()))?;
        if let Some(email) = email_hint.map(str::trim).filter(|e| !e.is_empty()) {
            url.query_pairs_mut().append_pair("email", email);
        }
        Ok(url.into())
    }

    /// Trade the OAuth `code` from the callback redirect for an access token.
    /// The token is stored and also returned.
    #[instrument(skip(self, code))]
    pub async fn exchange_code(&self, code: &str) -> Result<String> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AilawError::InvalidInput("authorization code is empty".into()));
        }
        let path = format!(
            "{}?{}",
            routes::AUTH_GOOGLE_CALLBACK,
            url::form_urlencoded::Serializer::new(String::new())
                .append_pair("code", code)
                .finish()
        );
        let (status, envelope) = self.send::<()>(Method::GET, &path, None, None).await?;
        if !status.is_success() {
            return Err(api_error(status, envelope));
        }
        let data: AccessTokenData = envelope
            .data_as()
            .map_err(|_| AilawError::Protocol("access token not found".into()))?;
        if data.access_token.is_empty() {
            return Err(AilawError::Protocol("access token not found".into()));
        }
        self.tokens.set(data.access_token.clone());
        info!("signed in");
        Ok(data.access_token)
    }
}
