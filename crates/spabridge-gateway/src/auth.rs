//! [`LwaTokenClient`] – authorization-code grant against Login With Amazon.
//!
//! Posts `grant_type=authorization_code` with the skill's client credentials
//! and parses the returned [`GrantTokens`].  The client secret never appears
//! in `Debug` output or logs.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, error, info};

use crate::{GatewayError, GrantTokens, TokenExchange};

/// Default Login With Amazon token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://api.amazon.com/auth/o2/token";

pub struct LwaTokenClient {
    token_url: String,
    client_id: String,
    client_secret: String,
    client: Client,
}

impl std::fmt::Debug for LwaTokenClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LwaTokenClient")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                if self.client_secret.is_empty() { &"<not set>" } else { &"<redacted>" },
            )
            .finish()
    }
}

impl LwaTokenClient {
    /// # Errors
    ///
    /// [`GatewayError::Http`] if the HTTP client cannot be built.
    pub fn new(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, GatewayError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            client: builder.build()?,
        })
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }
}

impl TokenExchange for LwaTokenClient {
    fn accept_grant(&self, code: &str) -> Result<GrantTokens, GatewayError> {
        debug!(url = %self.token_url, "POST authorization code");

        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        let response = self.client.post(&self.token_url).form(&form).send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            error!(url = %self.token_url, status = status.as_u16(), %body, "token exchange rejected");
            return Err(GatewayError::Status {
                url: self.token_url.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let tokens: GrantTokens = serde_json::from_str(&body)
            .map_err(|e| GatewayError::BadResponse(format!("{}: {e}", self.token_url)))?;
        info!(
            token_type = %tokens.token_type,
            expires_in = tokens.expires_in,
            "authorization code exchanged"
        );
        Ok(tokens)
    }
}
