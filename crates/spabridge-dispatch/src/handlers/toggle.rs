//! `Alexa.ToggleController` / `TurnOn` and `TurnOff`.
//!
//! The directive's `instance` picks the backend device.  Instances with no
//! mapping are sent as [`UNMAPPED_DEVICE`] and left for the backend to
//! refuse.

use spabridge_gateway::{DeviceGateway, GatewayError};
use spabridge_types::{ContextProperty, Directive, ErrorKind, EventMessage, EventOptions};
use tracing::{info, instrument, warn};

use super::{UNMAPPED_DEVICE, missing_field, property_for_instance};
use crate::errors::BusinessError;
use crate::router::{ALEXA, DirectiveKind, TOGGLE_CONTROLLER};

const RESPONSE: &str = "Response";
const ERROR_RESPONSE: &str = "ToggleController.ErrorResponse";
const TOGGLE_STATE: &str = "toggleState";

#[instrument(name = "toggle", skip_all, fields(value = kind.name()))]
pub(super) fn handle(
    kind: DirectiveKind,
    directive: &Directive,
    gateway: &dyn DeviceGateway,
) -> Result<EventMessage, BusinessError> {
    let missing = |field: &str| missing_field(field, TOGGLE_CONTROLLER).named(ERROR_RESPONSE);
    let endpoint_id = directive.endpoint_id().ok_or_else(|| missing("endpoint.endpointId"))?;
    let token = directive.endpoint_token().ok_or_else(|| missing("endpoint.scope.token"))?;
    let instance = directive
        .header
        .instance
        .as_deref()
        .ok_or_else(|| missing("header.instance"))?;

    let device = property_for_instance(instance).map_or(UNMAPPED_DEVICE, |p| p.slug);

    let update = gateway
        .update_state(device, kind.name(), token)
        .map_err(|e| {
            warn!(error = %e, endpoint_id, device, "state change failed");
            toggle_error(&e)
        })?;
    info!(endpoint_id, device, state = %update.state, "state changed");

    let mut event = EventMessage::new(
        ALEXA,
        RESPONSE,
        EventOptions::correlated(directive.header.correlation_token.as_deref())
            .with_endpoint(endpoint_id, token),
    );
    event.add_context_property(
        ContextProperty::new(TOGGLE_CONTROLLER, TOGGLE_STATE, update.state).with_instance(instance),
    );
    Ok(event)
}

fn toggle_error(error: &GatewayError) -> BusinessError {
    let message = match error {
        GatewayError::Status { .. } => {
            "Got HTTPError for directive request. Token not found".to_string()
        }
        GatewayError::Http(_) | GatewayError::InvalidAddress { .. } => {
            format!("Device cloud unreachable: {error}")
        }
        GatewayError::BadResponse(_) => error.to_string(),
    };
    BusinessError::new(ErrorKind::HttpError, message, TOGGLE_CONTROLLER).named(ERROR_RESPONSE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spabridge_gateway::SimDeviceCloud;

    fn toggle(name: &str, token: &str, instance: &str) -> Directive {
        Directive::new(TOGGLE_CONTROLLER, name)
            .with_endpoint("spa_test_1", token)
            .with_instance(instance)
            .with_correlation_token("corr-1")
    }

    #[test]
    fn turn_on_reports_on_state() {
        let cloud = SimDeviceCloud::seeded();
        let event = handle(DirectiveKind::TurnOn, &toggle("TurnOn", "0101", "Spa.Lights"), &cloud).unwrap();

        assert_eq!(event.header().namespace, ALEXA);
        assert_eq!(event.header().name, RESPONSE);
        assert_eq!(event.header().correlation_token, "corr-1");
        let endpoint = event.endpoint().unwrap();
        assert_eq!(endpoint.endpoint_id, "spa_test_1");
        assert_eq!(endpoint.scope.token, "0101");

        let property = &event.context_properties()[0];
        assert_eq!(property.namespace, TOGGLE_CONTROLLER);
        assert_eq!(property.name, TOGGLE_STATE);
        assert_eq!(property.instance.as_deref(), Some("Spa.Lights"));
        assert_eq!(property.value, "On");
    }

    #[test]
    fn turn_off_after_turn_on_is_not_on() {
        let cloud = SimDeviceCloud::seeded();
        handle(DirectiveKind::TurnOn, &toggle("TurnOn", "0101", "Spa.Lights"), &cloud).unwrap();
        let event = handle(DirectiveKind::TurnOff, &toggle("TurnOff", "0101", "Spa.Lights"), &cloud).unwrap();
        assert_ne!(event.context_properties()[0].value, "On");
    }

    #[test]
    fn unknown_token_is_http_error() {
        let cloud = SimDeviceCloud::seeded();
        let err = handle(DirectiveKind::TurnOn, &toggle("TurnOn", "0000", "Spa.Lights"), &cloud).unwrap_err();
        assert_eq!(err.kind, ErrorKind::HttpError);
        assert_eq!(err.namespace, TOGGLE_CONTROLLER);
        assert_eq!(err.response_name, ERROR_RESPONSE);
    }

    #[test]
    fn unmapped_instance_is_passed_through_to_backend() {
        let cloud = SimDeviceCloud::seeded();
        // The simulated backend only knows `lights`, so the pass-through slug
        // comes back as a 404 and surfaces as an HTTP error.
        let err = handle(DirectiveKind::TurnOn, &toggle("TurnOn", "0101", "Spa.Jets"), &cloud).unwrap_err();
        assert_eq!(err.kind, ErrorKind::HttpError);
    }

    #[test]
    fn missing_instance_is_invalid_directive() {
        let directive = Directive::new(TOGGLE_CONTROLLER, "TurnOn").with_endpoint("spa_test_1", "0101");
        let err = handle(DirectiveKind::TurnOn, &directive, &SimDeviceCloud::seeded()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidDirective);
        assert!(err.message.contains("header.instance"));
    }

    #[test]
    fn missing_endpoint_is_invalid_directive() {
        let directive = Directive::new(TOGGLE_CONTROLLER, "TurnOn").with_instance("Spa.Lights");
        let err = handle(DirectiveKind::TurnOn, &directive, &SimDeviceCloud::seeded()).unwrap_err();
        assert!(err.message.contains("endpoint.endpointId"));
    }
}
