//! Outbound [`EventMessage`] construction.
//!
//! An event message serializes as
//!
//! ```json
//! {
//!   "context": { "properties": [ ... ] },
//!   "event": { "header": { ... }, "endpoint": { ... }, "payload": { ... } }
//! }
//! ```
//!
//! The rules encoded here:
//!
//! | Field | Rule |
//! |---|---|
//! | `header.messageId` | fresh UUID v4 unless supplied |
//! | `header.correlationToken` | echoed, or `"INVALID"` |
//! | `endpoint` | omitted for `AcceptGrant.Response`, `Discover.Response` and every error event |
//! | `context` | omitted until a property is attached |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::discovery::EndpointDescriptor;
use crate::{BEARER_TOKEN, ErrorKind, INVALID, PAYLOAD_VERSION};

/// Response names that never carry an endpoint.  Matched case-sensitively.
const ENDPOINTLESS_RESPONSES: [&str; 2] = ["AcceptGrant.Response", "Discover.Response"];

/// Bearer-token scope shared by directive and event endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    #[serde(rename = "type")]
    pub kind: String,
    pub token: String,
}

impl Scope {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            kind: BEARER_TOKEN.to_string(),
            token: token.into(),
        }
    }
}

/// A complete outbound message: the event plus its optional context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<EventContext>,
    pub event: Event,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventContext {
    pub properties: Vec<ContextProperty>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub header: EventHeader,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<EventEndpoint>,
    #[serde(default)]
    pub payload: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventHeader {
    pub namespace: String,
    pub name: String,
    pub message_id: String,
    pub correlation_token: String,
    pub payload_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEndpoint {
    pub scope: Scope,
    pub endpoint_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie: Option<Map<String, Value>>,
}

/// A timestamped state observation attached to a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextProperty {
    pub namespace: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    pub value: Value,
    pub time_of_sample: DateTime<Utc>,
    pub uncertainty_in_milliseconds: u64,
}

impl ContextProperty {
    /// Sample `value` now, with zero uncertainty and no instance.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            instance: None,
            value: value.into(),
            time_of_sample: Utc::now(),
            uncertainty_in_milliseconds: 0,
        }
    }

    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    pub fn with_uncertainty(mut self, milliseconds: u64) -> Self {
        self.uncertainty_in_milliseconds = milliseconds;
        self
    }
}

/// Optional parts of a regular event.  Every field defaults sensibly.
#[derive(Debug, Clone, Default)]
pub struct EventOptions {
    pub message_id: Option<String>,
    pub correlation_token: Option<String>,
    pub endpoint_id: Option<String>,
    /// Bearer token echoed in the endpoint scope.
    pub token: Option<String>,
    pub cookie: Option<Map<String, Value>>,
    pub payload: Option<Map<String, Value>>,
}

impl EventOptions {
    pub fn correlated(correlation_token: Option<&str>) -> Self {
        Self {
            correlation_token: correlation_token.map(str::to_string),
            ..Self::default()
        }
    }

    pub fn with_endpoint(mut self, endpoint_id: impl Into<String>, token: impl Into<String>) -> Self {
        self.endpoint_id = Some(endpoint_id.into());
        self.token = Some(token.into());
        self
    }

    pub fn with_payload(mut self, payload: Map<String, Value>) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Optional parts of an error event.
#[derive(Debug, Clone)]
pub struct ErrorOptions {
    pub namespace: String,
    pub name: String,
    pub message_id: Option<String>,
    pub correlation_token: Option<String>,
}

impl Default for ErrorOptions {
    fn default() -> Self {
        Self {
            namespace: "Alexa".to_string(),
            name: "ErrorResponse".to_string(),
            message_id: None,
            correlation_token: None,
        }
    }
}

impl ErrorOptions {
    /// Error event in `namespace`, named `ErrorResponse`.
    pub fn in_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    /// Override the header name, e.g. `Discovery.ErrorResponse`.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn correlated(mut self, correlation_token: Option<&str>) -> Self {
        self.correlation_token = correlation_token.map(str::to_string);
        self
    }
}

impl EventMessage {
    /// Build a response event named `name` in `namespace`.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, options: EventOptions) -> Self {
        let name = name.into();
        let endpoint = if ENDPOINTLESS_RESPONSES.contains(&name.as_str()) {
            None
        } else {
            Some(EventEndpoint {
                scope: Scope::bearer(options.token.unwrap_or_else(|| INVALID.to_string())),
                endpoint_id: options.endpoint_id.unwrap_or_else(|| INVALID.to_string()),
                cookie: options.cookie,
            })
        };

        Self {
            context: None,
            event: Event {
                header: header(
                    namespace.into(),
                    name,
                    options.message_id,
                    options.correlation_token,
                ),
                endpoint,
                payload: options.payload.unwrap_or_default(),
            },
        }
    }

    /// Build an error event whose payload is `{type, message}`.
    ///
    /// Error events never carry an endpoint, whatever the namespace.
    pub fn error(kind: ErrorKind, message: impl Into<String>, options: ErrorOptions) -> Self {
        let mut payload = Map::new();
        payload.insert("type".to_string(), Value::from(kind.as_str()));
        payload.insert("message".to_string(), Value::from(message.into()));

        Self {
            context: None,
            event: Event {
                header: header(
                    options.namespace,
                    options.name,
                    options.message_id,
                    options.correlation_token,
                ),
                endpoint: None,
                payload,
            },
        }
    }

    /// Attach a context property, creating the context on first use.
    pub fn add_context_property(&mut self, property: ContextProperty) {
        self.context
            .get_or_insert_with(|| EventContext {
                properties: Vec::new(),
            })
            .properties
            .push(property);
    }

    pub fn context_properties(&self) -> &[ContextProperty] {
        self.context
            .as_ref()
            .map(|c| c.properties.as_slice())
            .unwrap_or_default()
    }

    pub fn header(&self) -> &EventHeader {
        &self.event.header
    }

    pub fn endpoint(&self) -> Option<&EventEndpoint> {
        self.event.endpoint.as_ref()
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.event.payload
    }

    pub fn set_payload(&mut self, payload: Map<String, Value>) {
        self.event.payload = payload;
    }

    /// Set `payload.endpoints` to the discovered endpoint descriptors.
    pub fn set_payload_endpoints(&mut self, endpoints: Vec<EndpointDescriptor>) {
        self.event.payload.insert("endpoints".to_string(), json!(endpoints));
    }

    /// The error type when this is an error event.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.event
            .payload
            .get("type")
            .and_then(|t| ErrorKind::deserialize(t).ok())
    }

    /// Serialize to the wire representation.
    ///
    /// Every field is a string, a JSON value or a timestamp, so this cannot
    /// fail.
    pub fn to_value(&self) -> Value {
        json!(self)
    }
}

fn header(
    namespace: String,
    name: String,
    message_id: Option<String>,
    correlation_token: Option<String>,
) -> EventHeader {
    EventHeader {
        namespace,
        name,
        message_id: message_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
        correlation_token: correlation_token.unwrap_or_else(|| INVALID.to_string()),
        payload_version: PAYLOAD_VERSION.to_string(),
    }
}
