//! Failures surfaced while answering a directive.
//!
//! Two layers, caught at two boundaries:
//!
//! - [`ProtocolError`] – the envelope itself is unusable (no `directive`,
//!   wrong payload version, unknown namespace/name).  Raised before any
//!   handler runs.
//! - [`BusinessError`] – a handler could not complete (gateway failure,
//!   missing field).  Carries the namespace and response name of the error
//!   event it becomes.
//!
//! Both turn into a fully shaped error [`EventMessage`]; neither ever reaches
//! the caller as a raw error.

use spabridge_types::{ErrorKind, ErrorOptions, EventMessage};
use thiserror::Error;

use crate::router::ALEXA;

/// The envelope could not be routed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("{0}")]
    InvalidDirective(String),

    #[error("This skill only supports Smart Home API version 3, got {0}")]
    UnsupportedVersion(String),

    #[error("Unimplemented interface: no handler for {namespace} {name}")]
    Unimplemented { namespace: String, name: String },
}

impl ProtocolError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidDirective(reason.into())
    }

    pub fn unimplemented(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Unimplemented {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidDirective
    }

    /// Error event in the `Alexa` namespace.
    pub fn into_event(self, correlation_token: Option<&str>) -> EventMessage {
        EventMessage::error(
            self.kind(),
            self.to_string(),
            ErrorOptions::in_namespace(ALEXA).correlated(correlation_token),
        )
    }
}

/// A handler failed after routing succeeded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind} in {namespace}: {message}")]
pub struct BusinessError {
    pub kind: ErrorKind,
    pub message: String,
    pub namespace: String,
    pub response_name: String,
}

impl BusinessError {
    /// Error reported as `ErrorResponse` in `namespace`.
    pub fn new(kind: ErrorKind, message: impl Into<String>, namespace: &str) -> Self {
        Self {
            kind,
            message: message.into(),
            namespace: namespace.to_string(),
            response_name: ErrorOptions::default().name,
        }
    }

    /// Override the response name, e.g. `Discovery.ErrorResponse`.
    pub fn named(mut self, response_name: &str) -> Self {
        self.response_name = response_name.to_string();
        self
    }

    pub fn into_event(self, correlation_token: Option<&str>) -> EventMessage {
        EventMessage::error(
            self.kind,
            self.message,
            ErrorOptions::in_namespace(self.namespace)
                .named(self.response_name)
                .correlated(correlation_token),
        )
    }
}

/// Anything that stops a dispatch from producing its regular response.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("handler error: {0}")]
    Business(#[from] BusinessError),
}

impl DispatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Protocol(e) => e.kind(),
            Self::Business(e) => e.kind,
        }
    }

    pub fn into_event(self, correlation_token: Option<&str>) -> EventMessage {
        match self {
            Self::Protocol(e) => e.into_event(correlation_token),
            Self::Business(e) => e.into_event(correlation_token),
        }
    }
}
