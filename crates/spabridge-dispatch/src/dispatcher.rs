//! Request entry point: validate → route → handle → respond.
//!
//! [`Dispatcher`] is the single place a directive enters the bridge.  Every
//! call ends in exactly one [`EventMessage`]; protocol and handler failures
//! are converted to error events here and never escape as `Err`.

use serde_json::Value;
use spabridge_gateway::{DeviceGateway, TokenExchange};
use spabridge_types::{Directive, EventMessage, PAYLOAD_VERSION};
use tracing::{debug, info, warn};

use crate::errors::{DispatchError, ProtocolError};
use crate::handlers::HandlerContext;
use crate::router::{DISPATCH_TARGET, DirectiveKind};

/// Answers smart-home directives against a device cloud.
///
/// Holds no per-request state, so one instance can serve any number of
/// sequential or concurrent requests.
pub struct Dispatcher {
    gateway: Box<dyn DeviceGateway>,
    tokens: Box<dyn TokenExchange>,
}

impl Dispatcher {
    pub fn new(gateway: Box<dyn DeviceGateway>, tokens: Box<dyn TokenExchange>) -> Self {
        Self { gateway, tokens }
    }

    /// Answer one request and return the response event.
    ///
    /// `context` is the opaque invocation context supplied by the host; it is
    /// only logged.
    pub fn dispatch(&self, request: &Value, context: Option<&Value>) -> EventMessage {
        let correlation_token = correlation_token(request);
        if let Some(context) = context {
            debug!(target: DISPATCH_TARGET, %context, "invocation context");
        }

        match self.try_dispatch(request) {
            Ok(event) => {
                info!(
                    target: DISPATCH_TARGET,
                    namespace = %event.header().namespace,
                    name = %event.header().name,
                    "directive answered"
                );
                event
            }
            Err(e) => {
                warn!(target: DISPATCH_TARGET, kind = %e.kind(), error = %e, "directive failed");
                e.into_event(correlation_token)
            }
        }
    }

    /// [`dispatch`](Self::dispatch) serialized to the wire form.
    pub fn handle(&self, request: &Value, context: Option<&Value>) -> Value {
        self.dispatch(request, context).to_value()
    }

    fn try_dispatch(&self, request: &Value) -> Result<EventMessage, DispatchError> {
        let directive = validate(request)?;
        info!(
            target: DISPATCH_TARGET,
            namespace = %directive.header.namespace,
            name = %directive.header.name,
            message_id = %directive.header.message_id,
            "directive received"
        );

        let kind = DirectiveKind::resolve(&directive.header.namespace, &directive.header.name)?;
        let context = HandlerContext {
            gateway: self.gateway.as_ref(),
            tokens: self.tokens.as_ref(),
        };
        Ok(kind.handle(&directive, &context)?)
    }
}

/// Check the envelope and parse the directive it carries.
///
/// # Errors
///
/// - [`ProtocolError::InvalidDirective`] – no `directive` key, or a header
///   that cannot be read.
/// - [`ProtocolError::UnsupportedVersion`] – `payloadVersion` is not `"3"`.
pub fn validate(request: &Value) -> Result<Directive, ProtocolError> {
    let raw = request
        .get("directive")
        .ok_or_else(|| ProtocolError::invalid("Missing key: directive, Is request a valid Alexa directive?"))?;

    match raw.pointer("/header/payloadVersion") {
        Some(Value::String(v)) if v == PAYLOAD_VERSION => {}
        Some(Value::String(v)) => return Err(ProtocolError::UnsupportedVersion(v.clone())),
        Some(other) => return Err(ProtocolError::UnsupportedVersion(other.to_string())),
        None => return Err(ProtocolError::invalid("Missing key: directive.header.payloadVersion")),
    }

    Directive::from_value(raw).map_err(|e| ProtocolError::invalid(e.to_string()))
}

/// Correlation token of the request, when one can be read.
fn correlation_token(request: &Value) -> Option<&str> {
    request
        .pointer("/directive/header/correlationToken")
        .and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use spabridge_gateway::{SimDeviceCloud, SimTokenExchange};
    use spabridge_types::{ErrorKind, INVALID};

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(
            Box::new(SimDeviceCloud::seeded()),
            Box::new(SimTokenExchange::new()),
        )
    }

    fn request(namespace: &str, name: &str) -> Value {
        Directive::new(namespace, name)
            .with_correlation_token("corr-xyz")
            .into_request()
            .unwrap()
    }

    #[test]
    fn missing_directive_key_is_invalid_directive() {
        let event = dispatcher().dispatch(&json!({ "foo": 1 }), None);
        assert_eq!(event.header().namespace, "Alexa");
        assert_eq!(event.header().name, "ErrorResponse");
        assert_eq!(event.header().correlation_token, INVALID);
        assert_eq!(event.error_kind(), Some(ErrorKind::InvalidDirective));
    }

    #[test]
    fn unsupported_version_names_version_three() {
        let mut req = request("Alexa.Discovery", "Discover");
        req["directive"]["header"]["payloadVersion"] = json!("2");
        let event = dispatcher().dispatch(&req, None);
        assert_eq!(event.error_kind(), Some(ErrorKind::InvalidDirective));
        assert!(event.payload()["message"].as_str().unwrap().contains("version 3"));
        assert_eq!(event.header().correlation_token, "corr-xyz");
    }

    #[test]
    fn unknown_pair_is_invalid_directive_with_token_echoed() {
        let event = dispatcher().dispatch(&request("Alexa.PowerController", "TurnOn"), None);
        assert_eq!(event.header().namespace, "Alexa");
        assert_eq!(event.error_kind(), Some(ErrorKind::InvalidDirective));
        assert_eq!(event.header().correlation_token, "corr-xyz");
    }

    #[test]
    fn unreadable_header_is_invalid_directive() {
        let req = json!({ "directive": { "header": { "payloadVersion": "3" } } });
        let event = dispatcher().dispatch(&req, None);
        assert_eq!(event.error_kind(), Some(ErrorKind::InvalidDirective));
    }

    #[test]
    fn validate_accepts_well_formed_envelope() {
        let directive = validate(&request("Alexa.Discovery", "Discover")).unwrap();
        assert_eq!(directive.header.name, "Discover");
    }

    #[test]
    fn non_string_version_is_unsupported() {
        let mut req = request("Alexa.Discovery", "Discover");
        req["directive"]["header"]["payloadVersion"] = json!(3);
        assert!(matches!(validate(&req), Err(ProtocolError::UnsupportedVersion(_))));
    }

    #[test]
    fn handle_returns_wire_json() {
        let req = Directive::new("Alexa.Discovery", "Discover")
            .with_payload_scope("0202")
            .into_request()
            .unwrap();
        let out = dispatcher().handle(&req, Some(&json!({ "requestId": "r-1" })));
        assert_eq!(out["event"]["header"]["name"], "Discover.Response");
        assert_eq!(out["event"]["payload"]["endpoints"][0]["endpointId"], "spa_test_2");
        assert!(out.get("context").is_none());
    }

    #[test]
    fn handled_error_is_wire_error_event() {
        let req = request("Alexa.PowerController", "TurnOn");
        let out = dispatcher().handle(&req, None);
        assert_eq!(out["event"]["header"]["namespace"], "Alexa");
        assert_eq!(out["event"]["header"]["name"], "ErrorResponse");
        assert_eq!(out["event"]["header"]["correlationToken"], "corr-xyz");
        assert_eq!(out["event"]["header"]["payloadVersion"], "3");
        assert_eq!(out["event"]["payload"]["type"], "INVALID_DIRECTIVE");
        assert!(out["event"].get("endpoint").is_none());
    }
}
