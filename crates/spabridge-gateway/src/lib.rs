//! `spabridge-gateway` – the device cloud seen from the bridge.
//!
//! Handlers never talk HTTP directly.  They call a [`DeviceGateway`] for
//! endpoint discovery, state changes and state reports, and a
//! [`TokenExchange`] for the authorization-code grant.
//!
//! # Modules
//!
//! - [`cloud`] – [`HttpDeviceCloud`][cloud::HttpDeviceCloud]: blocking
//!   reqwest client for the `/spa/...` backend routes, addressed through a
//!   [`CloudAddress`][cloud::CloudAddress].
//! - [`auth`] – [`LwaTokenClient`][auth::LwaTokenClient]: exchanges an
//!   authorization code for access/refresh tokens.
//! - [`sim`] – [`SimDeviceCloud`][sim::SimDeviceCloud] and
//!   [`SimTokenExchange`][sim::SimTokenExchange]: in-process stand-ins that
//!   behave like the test backend, for unit tests and the mock cloud.

pub mod auth;
pub mod cloud;
pub mod sim;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use auth::LwaTokenClient;
pub use cloud::{CloudAddress, HttpDeviceCloud};
pub use sim::{SimDeviceCloud, SimTokenExchange};

/// Current state of every device on an endpoint, keyed by device slug
/// (e.g. `"lights" → "Off"`).
pub type DeviceState = BTreeMap<String, String>;

/// An endpoint visible to a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredEndpoint {
    pub endpoint_id: String,
}

/// Body of a successful discovery call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryResponse {
    pub endpoints: Vec<DiscoveredEndpoint>,
}

/// New state reported by the backend after a state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateUpdate {
    pub endpoint_id: String,
    pub state: String,
}

/// Body of a successful state-change call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStateResponse {
    pub status: StateUpdate,
}

/// Token bundle returned by the authorization server.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

impl std::fmt::Debug for GrantTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrantTokens")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Errors that can arise from device cloud or token endpoint calls.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The request never got a response (connection refused, timeout, …).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{url} answered HTTP {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// The server answered, but not with the expected shape.
    #[error("Unexpected response format: {0}")]
    BadResponse(String),

    /// The configured base address is not a usable URL.
    #[error("Invalid device cloud address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },
}

impl GatewayError {
    /// `true` when no response was received at all.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}

/// The backend device cloud.
///
/// Implementations make exactly one round trip per call and never retry.
pub trait DeviceGateway: Send + Sync {
    /// Endpoints visible to `token`.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Status`] when the token is unknown to the backend.
    fn discover(&self, token: &str) -> Result<Vec<DiscoveredEndpoint>, GatewayError>;

    /// Apply `value` (`TurnOn` / `TurnOff`) to `device` on the spa owned by
    /// `token` and return the state the backend reports afterwards.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Status`] when the token or device is unknown.
    fn update_state(&self, device: &str, value: &str, token: &str) -> Result<StateUpdate, GatewayError>;

    /// Current state of every device on `endpoint_id`.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Status`] when the endpoint is unknown.
    fn report_state(&self, endpoint_id: &str) -> Result<DeviceState, GatewayError>;
}

/// Exchange of an authorization code for tokens.
pub trait TokenExchange: Send + Sync {
    /// # Errors
    ///
    /// Any [`GatewayError`] when the code could not be exchanged.
    fn accept_grant(&self, code: &str) -> Result<GrantTokens, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grant_tokens_debug_redacts_secrets() {
        let tokens = GrantTokens {
            access_token: "Atza|secret-access".to_string(),
            refresh_token: "Atzr|secret-refresh".to_string(),
            token_type: "bearer".to_string(),
            expires_in: 3600,
        };
        let debug = format!("{tokens:?}");
        assert!(!debug.contains("secret-access"));
        assert!(!debug.contains("secret-refresh"));
        assert!(debug.contains("3600"));
    }

    #[test]
    fn discovery_response_parses_backend_body() {
        let body = r#"{"endpoints":[{"endpoint_id":"spa_test_1"}]}"#;
        let parsed: DiscoveryResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.endpoints[0].endpoint_id, "spa_test_1");
    }

    #[test]
    fn status_error_display_names_url_and_status() {
        let err = GatewayError::Status {
            url: "http://localhost:3434/spa/discovery/0000".to_string(),
            status: 400,
            body: "Token does not match any existing spa".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("400"));
        assert!(text.contains("/spa/discovery/0000"));
        assert!(!err.is_unreachable());
    }
}
