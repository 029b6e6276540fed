//! Inbound [`Directive`] messages.
//!
//! A request arrives as `{"directive": {...}}`.  The dispatcher checks the
//! envelope on the raw JSON first (presence of `directive`, payload version)
//! and only then parses the typed form with [`Directive::from_value`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::event::Scope;
use crate::{BridgeError, PAYLOAD_VERSION};

/// Inbound command describing an intent against an endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Directive {
    pub header: DirectiveHeader,
    /// Absent for Discovery and Authorization directives.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<DirectiveEndpoint>,
    #[serde(default)]
    pub payload: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectiveHeader {
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub message_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_token: Option<String>,
    pub payload_version: String,
    /// Required for instance-scoped controllers such as `Alexa.ToggleController`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectiveEndpoint {
    pub endpoint_id: String,
    pub scope: Scope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie: Option<Map<String, Value>>,
}

impl Directive {
    /// Start a directive for `namespace`/`name` with a fresh message id and
    /// an empty payload.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            header: DirectiveHeader {
                namespace: namespace.into(),
                name: name.into(),
                message_id: Uuid::new_v4().to_string(),
                correlation_token: None,
                payload_version: PAYLOAD_VERSION.to_string(),
                instance: None,
            },
            endpoint: None,
            payload: Map::new(),
        }
    }

    pub fn with_correlation_token(mut self, token: impl Into<String>) -> Self {
        self.header.correlation_token = Some(token.into());
        self
    }

    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.header.instance = Some(instance.into());
        self
    }

    /// Target `endpoint_id` on behalf of the account identified by `token`.
    pub fn with_endpoint(mut self, endpoint_id: impl Into<String>, token: impl Into<String>) -> Self {
        self.endpoint = Some(DirectiveEndpoint {
            endpoint_id: endpoint_id.into(),
            scope: Scope::bearer(token),
            cookie: None,
        });
        self
    }

    /// Put a bearer-token scope in the payload, as Discover directives do.
    pub fn with_payload_scope(mut self, token: impl Into<String>) -> Self {
        self.payload.insert(
            "scope".to_string(),
            json!({ "type": crate::BEARER_TOKEN, "token": token.into() }),
        );
        self
    }

    /// Put an authorization grant in the payload, as AcceptGrant directives do.
    pub fn with_grant(mut self, code: impl Into<String>, grantee_token: impl Into<String>) -> Self {
        self.payload.insert(
            "grant".to_string(),
            json!({ "type": "OAuth2.AuthorizationCode", "code": code.into() }),
        );
        self.payload.insert(
            "grantee".to_string(),
            json!({ "type": crate::BEARER_TOKEN, "token": grantee_token.into() }),
        );
        self
    }

    /// Wrap the directive in its request envelope `{"directive": ...}`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Serialization`] if the payload cannot be
    /// represented as JSON.
    pub fn into_request(self) -> Result<Value, BridgeError> {
        let directive =
            serde_json::to_value(self).map_err(|e| BridgeError::Serialization(e.to_string()))?;
        Ok(json!({ "directive": directive }))
    }

    /// Parse the value found under the request's `directive` key.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Malformed`] when required header fields are
    /// missing or have the wrong type.
    pub fn from_value(value: &Value) -> Result<Self, BridgeError> {
        Self::deserialize(value).map_err(|e| BridgeError::Malformed(e.to_string()))
    }

    /// Endpoint id addressed by the directive, if it carries an endpoint.
    pub fn endpoint_id(&self) -> Option<&str> {
        self.endpoint.as_ref().map(|e| e.endpoint_id.as_str())
    }

    /// Bearer token from the directive's endpoint scope.
    pub fn endpoint_token(&self) -> Option<&str> {
        self.endpoint.as_ref().map(|e| e.scope.token.as_str())
    }

    /// Bearer token from `payload.scope.token`.
    pub fn payload_scope_token(&self) -> Option<&str> {
        self.payload
            .get("scope")
            .and_then(|scope| scope.get("token"))
            .and_then(Value::as_str)
    }

    /// Authorization code from `payload.grant.code`.
    pub fn grant_code(&self) -> Option<&str> {
        self.payload
            .get("grant")
            .and_then(|grant| grant.get("code"))
            .and_then(Value::as_str)
    }
}
