//! `spabridge-types` – the smart-home message model.
//!
//! Typed representations of the two message shapes exchanged with the voice
//! assistant, plus the builders that own every default value and every
//! conditional-field rule of the wire format:
//!
//! - [`directive`] – the inbound [`Directive`] and its header/endpoint parts.
//! - [`event`] – the outbound [`EventMessage`]: header, optional endpoint,
//!   payload and the optional top-level context.
//! - [`discovery`] – [`CapabilityDescriptor`] and [`EndpointDescriptor`]
//!   elements carried by a `Discover.Response` payload.
//!
//! Handlers never assemble raw JSON; they go through these builders so the
//! protocol shape lives in exactly one place.

pub mod directive;
pub mod discovery;
pub mod event;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use directive::{Directive, DirectiveEndpoint, DirectiveHeader};
pub use discovery::{
    AdditionalAttributes, CapabilityDescriptor, CapabilityOptions, CapabilityProperties,
    EndpointDescriptor, EndpointOptions, SupportedProperty,
};
pub use event::{
    ContextProperty, ErrorOptions, Event, EventContext, EventEndpoint, EventHeader, EventMessage,
    EventOptions, Scope,
};

/// The only payload version this bridge speaks.
pub const PAYLOAD_VERSION: &str = "3";

/// Sentinel used for identifiers the caller did not supply.
pub const INVALID: &str = "INVALID";

/// Scope type carried by every endpoint.
pub const BEARER_TOKEN: &str = "BearerToken";

/// Error types surfaced in `event.payload.type`.
///
/// The wire strings are stable across the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Malformed envelope, unsupported version, or no handler for the
    /// directive's namespace/name pair.
    InvalidDirective,
    /// The authorization code could not be exchanged for tokens.
    AcceptGrantFailed,
    /// The device cloud answered with an error status or could not be reached.
    HttpError,
    /// The device cloud answered discovery with an unusable body.
    DiscoveryFailed,
    /// The target endpoint could not be reached.
    EndpointUnreachable,
    /// The interface named by the directive is not implemented.
    ///
    /// Reserved: the dispatcher never emits it.  Unknown namespace/name
    /// pairs are reported as [`ErrorKind::InvalidDirective`].
    InterfaceNotImplemented,
    /// Anything else that went wrong while producing a response.
    InternalError,
}

impl ErrorKind {
    /// Returns the wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidDirective => "INVALID_DIRECTIVE",
            Self::AcceptGrantFailed => "ACCEPT_GRANT_FAILED",
            Self::HttpError => "HTTP_ERROR",
            Self::DiscoveryFailed => "DISCOVERY_FAILED",
            Self::EndpointUnreachable => "ENDPOINT_UNREACHABLE",
            Self::InterfaceNotImplemented => "INTERFACE_NOT_IMPLEMENTED",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures raised by the message model itself.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Malformed directive: {0}")]
    Malformed(String),

    #[error("Event serialization error: {0}")]
    Serialization(String),
}
