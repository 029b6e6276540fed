//! `Alexa.Discovery` / `Discover`.
//!
//! Every spa the token can see is described with the same two capabilities:
//! the base `Alexa` interface and a retrievable `Alexa.ToggleController`
//! scoped to the `Spa.Lights` instance.

use spabridge_gateway::{DeviceGateway, GatewayError};
use spabridge_types::discovery::friendly_name_resources;
use spabridge_types::{
    CapabilityDescriptor, CapabilityOptions, Directive, EndpointDescriptor, EndpointOptions,
    ErrorKind, EventMessage, EventOptions, SupportedProperty,
};
use tracing::{info, instrument, warn};

use super::{DEVICE_PROPERTIES, DeviceProperty, FRIENDLY_NAME_LOCALE, missing_field};
use crate::errors::BusinessError;
use crate::router::DISCOVERY;

const RESPONSE: &str = "Discover.Response";
const ERROR_RESPONSE: &str = "Discovery.ErrorResponse";

#[instrument(name = "discover", skip_all)]
pub(super) fn handle(
    directive: &Directive,
    gateway: &dyn DeviceGateway,
) -> Result<EventMessage, BusinessError> {
    let token = directive
        .payload_scope_token()
        .ok_or_else(|| missing_field("payload.scope.token", DISCOVERY).named(ERROR_RESPONSE))?;

    let endpoints = gateway.discover(token).map_err(|e| {
        warn!(error = %e, "discovery failed");
        discovery_error(&e)
    })?;
    info!(count = endpoints.len(), "endpoints discovered");

    let capabilities = spa_capabilities();
    let descriptors = endpoints
        .into_iter()
        .map(|e| EndpointDescriptor::new(e.endpoint_id, capabilities.clone(), EndpointOptions::default()))
        .collect();

    let mut event = EventMessage::new(
        DISCOVERY,
        RESPONSE,
        EventOptions::correlated(directive.header.correlation_token.as_deref()),
    );
    event.set_payload_endpoints(descriptors);
    Ok(event)
}

/// Base interface plus one toggle capability per switchable device.
fn spa_capabilities() -> Vec<CapabilityDescriptor> {
    device_capabilities(DEVICE_PROPERTIES)
}

fn device_capabilities(devices: &[DeviceProperty]) -> Vec<CapabilityDescriptor> {
    std::iter::once(CapabilityDescriptor::alexa())
        .chain(devices.iter().map(|device| {
            CapabilityDescriptor::new(CapabilityOptions {
                interface: device.namespace.to_string(),
                supported: vec![SupportedProperty::new(device.name)],
                instance: Some(device.instance.to_string()),
                capability_resources: Some(friendly_name_resources(
                    device.friendly_name,
                    FRIENDLY_NAME_LOCALE,
                )),
                proactively_reported: false,
                retrievable: true,
            })
        }))
        .collect()
}

fn discovery_error(error: &GatewayError) -> BusinessError {
    let (kind, message) = match error {
        GatewayError::BadResponse(_) => (
            ErrorKind::DiscoveryFailed,
            format!("Device cloud returned an unusable discovery body: {error}"),
        ),
        GatewayError::Status { .. } => (
            ErrorKind::HttpError,
            "Got HTTPError for directive request. Token not found".to_string(),
        ),
        GatewayError::Http(_) | GatewayError::InvalidAddress { .. } => (
            ErrorKind::HttpError,
            format!("Device cloud unreachable: {error}"),
        ),
    };
    BusinessError::new(kind, message, DISCOVERY).named(ERROR_RESPONSE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spabridge_gateway::SimDeviceCloud;

    fn discover(token: &str) -> Directive {
        Directive::new(DISCOVERY, "Discover").with_payload_scope(token)
    }

    #[test]
    fn known_token_yields_one_described_endpoint() {
        let event = handle(&discover("0101"), &SimDeviceCloud::seeded()).unwrap();
        assert_eq!(event.header().name, RESPONSE);
        assert!(event.endpoint().is_none());

        let endpoints = event.payload()["endpoints"].as_array().unwrap();
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0]["endpointId"], "spa_test_1");

        let toggle = endpoints[0]["capabilities"]
            .as_array()
            .unwrap()
            .iter()
            .find(|c| c["interface"] == "Alexa.ToggleController")
            .expect("toggle capability");
        assert!(toggle.get("capabilityResources").is_some());
        assert_eq!(toggle["instance"], "Spa.Lights");
        assert_eq!(toggle["properties"]["retrievable"], true);
    }

    #[test]
    fn base_interface_is_listed_first_without_properties() {
        let capabilities = spa_capabilities();
        assert_eq!(capabilities[0].interface, "Alexa");
        assert!(capabilities[0].properties.is_none());
        assert_eq!(capabilities.len(), 2);
    }

    #[test]
    fn each_device_advertises_its_own_friendly_name() {
        let jets = DeviceProperty {
            slug: "jets",
            instance: "Spa.Jets",
            friendly_name: "Jets",
            namespace: "Alexa.ToggleController",
            name: "toggleState",
        };
        let capabilities = device_capabilities(&[DEVICE_PROPERTIES[0], jets]);
        let names: Vec<_> = capabilities[1..]
            .iter()
            .map(|c| {
                let resources = c.capability_resources.as_ref().unwrap();
                resources["friendlyNames"][0]["value"]["text"].as_str().unwrap().to_string()
            })
            .collect();
        assert_eq!(names, ["Lights", "Jets"]);
    }

    #[test]
    fn unknown_token_is_discovery_error_response() {
        let err = handle(&discover("0000"), &SimDeviceCloud::seeded()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::HttpError);
        assert_eq!(err.namespace, DISCOVERY);
        assert_eq!(err.response_name, ERROR_RESPONSE);
    }

    #[test]
    fn bad_body_is_discovery_failed() {
        let err = discovery_error(&GatewayError::BadResponse("eof".into()));
        assert_eq!(err.kind, ErrorKind::DiscoveryFailed);
    }

    #[test]
    fn missing_scope_is_invalid_directive() {
        let directive = Directive::new(DISCOVERY, "Discover");
        let err = handle(&directive, &SimDeviceCloud::seeded()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidDirective);
        assert_eq!(err.response_name, ERROR_RESPONSE);
    }
}
