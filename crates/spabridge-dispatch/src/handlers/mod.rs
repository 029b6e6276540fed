//! One handler per [`DirectiveKind`].
//!
//! Each handler consumes a parsed [`Directive`], makes at most one backend
//! call, and returns either the response [`EventMessage`] or the
//! [`BusinessError`] describing the error event to send instead.

mod accept_grant;
mod discover;
mod report_state;
mod toggle;

use spabridge_gateway::{DeviceGateway, TokenExchange};
use spabridge_types::{Directive, ErrorKind, EventMessage};

use crate::errors::BusinessError;
use crate::router::{DirectiveKind, TOGGLE_CONTROLLER};

/// Backend collaborators available to handlers for one dispatch.
pub struct HandlerContext<'a> {
    pub gateway: &'a dyn DeviceGateway,
    pub tokens: &'a dyn TokenExchange,
}

/// Slug passed to the backend for instances it does not know.
pub const UNMAPPED_DEVICE: &str = "Unmaped device";

/// A backend device and the context property that reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceProperty {
    pub slug: &'static str,
    pub instance: &'static str,
    /// Name advertised at discovery, in [`FRIENDLY_NAME_LOCALE`].
    pub friendly_name: &'static str,
    pub namespace: &'static str,
    pub name: &'static str,
}

pub const FRIENDLY_NAME_LOCALE: &str = "en-US";

/// Devices the bridge can switch and report.
pub const DEVICE_PROPERTIES: &[DeviceProperty] = &[DeviceProperty {
    slug: "lights",
    instance: "Spa.Lights",
    friendly_name: "Lights",
    namespace: TOGGLE_CONTROLLER,
    name: "toggleState",
}];

pub(crate) fn property_for_instance(instance: &str) -> Option<&'static DeviceProperty> {
    DEVICE_PROPERTIES.iter().find(|p| p.instance == instance)
}

pub(crate) fn property_for_slug(slug: &str) -> Option<&'static DeviceProperty> {
    DEVICE_PROPERTIES.iter().find(|p| p.slug == slug)
}

impl DirectiveKind {
    /// Run the handler for this kind.
    ///
    /// # Errors
    ///
    /// Returns a [`BusinessError`] when the directive lacks a field the
    /// handler needs or the backend call fails.
    pub fn handle(
        self,
        directive: &Directive,
        context: &HandlerContext<'_>,
    ) -> Result<EventMessage, BusinessError> {
        match self {
            Self::AcceptGrant => accept_grant::handle(directive, context.tokens),
            Self::Discover => discover::handle(directive, context.gateway),
            Self::TurnOn | Self::TurnOff => toggle::handle(self, directive, context.gateway),
            Self::ReportState => report_state::handle(directive, context.gateway),
        }
    }
}

/// A missing directive field, reported in the handler's namespace.
fn missing_field(field: &str, namespace: &str) -> BusinessError {
    BusinessError::new(
        ErrorKind::InvalidDirective,
        format!("Missing key: {field}"),
        namespace,
    )
}
