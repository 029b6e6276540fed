//! `Alexa` / `ReportState`.

use spabridge_gateway::{DeviceGateway, GatewayError};
use spabridge_types::{ContextProperty, Directive, ErrorKind, EventMessage, EventOptions};
use tracing::{debug, instrument, warn};

use super::{missing_field, property_for_slug};
use crate::errors::BusinessError;
use crate::router::ALEXA;

const RESPONSE: &str = "StateReport";

#[instrument(name = "report_state", skip_all)]
pub(super) fn handle(
    directive: &Directive,
    gateway: &dyn DeviceGateway,
) -> Result<EventMessage, BusinessError> {
    let endpoint_id = directive
        .endpoint_id()
        .ok_or_else(|| missing_field("endpoint.endpointId", ALEXA))?;
    let token = directive
        .endpoint_token()
        .ok_or_else(|| missing_field("endpoint.scope.token", ALEXA))?;

    let state = gateway.report_state(endpoint_id).map_err(|e| {
        warn!(error = %e, endpoint_id, "state query failed");
        report_error(&e)
    })?;

    let mut event = EventMessage::new(
        ALEXA,
        RESPONSE,
        EventOptions::correlated(directive.header.correlation_token.as_deref())
            .with_endpoint(endpoint_id, token),
    );
    for (slug, value) in state {
        let Some(device) = property_for_slug(&slug) else {
            warn!(endpoint_id, slug = %slug, "backend reported an unmapped device");
            return Err(BusinessError::new(
                ErrorKind::InternalError,
                format!("No property mapping for device '{slug}'"),
                ALEXA,
            ));
        };
        debug!(endpoint_id, slug = %slug, value = %value, "reporting property");
        event.add_context_property(
            ContextProperty::new(device.namespace, device.name, value).with_instance(device.instance),
        );
    }
    Ok(event)
}

fn report_error(error: &GatewayError) -> BusinessError {
    let (kind, message) = if error.is_unreachable() {
        (
            ErrorKind::EndpointUnreachable,
            format!("Device cloud unreachable: {error}"),
        )
    } else {
        (ErrorKind::HttpError, error.to_string())
    };
    BusinessError::new(kind, message, ALEXA)
}
