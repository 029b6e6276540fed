//! `Alexa.Authorization` / `AcceptGrant`.

use spabridge_gateway::TokenExchange;
use spabridge_types::{Directive, ErrorKind, EventMessage, EventOptions};
use tracing::{info, instrument, warn};

use super::missing_field;
use crate::errors::BusinessError;
use crate::router::AUTHORIZATION;

const RESPONSE: &str = "AcceptGrant.Response";

#[instrument(name = "accept_grant", skip_all)]
pub(super) fn handle(
    directive: &Directive,
    tokens: &dyn TokenExchange,
) -> Result<EventMessage, BusinessError> {
    let code = directive
        .grant_code()
        .ok_or_else(|| missing_field("payload.grant.code", AUTHORIZATION))?;

    let grant = tokens.accept_grant(code).map_err(|e| {
        warn!(error = %e, "token exchange failed");
        BusinessError::new(
            ErrorKind::AcceptGrantFailed,
            "Failed to retrieve the LWA tokens from the user's auth code.",
            AUTHORIZATION,
        )
    })?;
    info!(token_type = %grant.token_type, expires_in = grant.expires_in, "grant accepted");

    Ok(EventMessage::new(
        AUTHORIZATION,
        RESPONSE,
        EventOptions::correlated(directive.header.correlation_token.as_deref()),
    ))
}
