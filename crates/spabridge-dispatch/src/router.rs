//! Static `(namespace, name)` → handler routing.
//!
//! Names alone are ambiguous (`TurnOn` exists in several controller
//! namespaces), so every route is keyed on the pair.  The table is a `const`
//! and cannot change after start-up.

use tracing::debug;

use crate::errors::ProtocolError;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

pub const ALEXA: &str = "Alexa";
pub const AUTHORIZATION: &str = "Alexa.Authorization";
pub const DISCOVERY: &str = "Alexa.Discovery";
pub const TOGGLE_CONTROLLER: &str = "Alexa.ToggleController";

/// The closed set of directives this bridge answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    AcceptGrant,
    Discover,
    TurnOn,
    TurnOff,
    ReportState,
}

/// Every routable directive.
pub const ROUTES: [DirectiveKind; 5] = [
    DirectiveKind::AcceptGrant,
    DirectiveKind::Discover,
    DirectiveKind::TurnOn,
    DirectiveKind::TurnOff,
    DirectiveKind::ReportState,
];

impl DirectiveKind {
    /// Look up the handler for a directive.  Matching is case-sensitive.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Unimplemented`] when no route matches both
    /// the namespace and the name.
    pub fn resolve(namespace: &str, name: &str) -> Result<Self, ProtocolError> {
        let kind = ROUTES
            .into_iter()
            .find(|k| k.namespace() == namespace && k.name() == name)
            .ok_or_else(|| ProtocolError::unimplemented(namespace, name))?;

        debug!(
            target: DISPATCH_TARGET,
            namespace,
            name,
            kind = ?kind,
            "routing directive"
        );
        Ok(kind)
    }

    pub fn namespace(&self) -> &'static str {
        match self {
            Self::AcceptGrant => AUTHORIZATION,
            Self::Discover => DISCOVERY,
            Self::TurnOn | Self::TurnOff => TOGGLE_CONTROLLER,
            Self::ReportState => ALEXA,
        }
    }

    /// The directive name, which is also the state-change value sent to the
    /// backend for toggles.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AcceptGrant => "AcceptGrant",
            Self::Discover => "Discover",
            Self::TurnOn => "TurnOn",
            Self::TurnOff => "TurnOff",
            Self::ReportState => "ReportState",
        }
    }
}
