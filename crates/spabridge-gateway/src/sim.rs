//! In-process stand-ins for the device cloud and the token endpoint.
//!
//! [`SimDeviceCloud`] keeps a token → spa map and per-spa device state in
//! memory and answers exactly like the test backend:
//!
//! | Call | Unknown input | Result |
//! |---|---|---|
//! | `discover` | token | `Status 400` "Token does not match any existing spa" |
//! | `update_state` | token | `Status 400`; device other than `lights` → `Status 404` |
//! | `report_state` | endpoint | `Status 404` |
//!
//! A state change stores `"Off"` for `TurnOff` and `"On"` for anything else.
//!
//! # Example
//!
//! ```rust
//! use spabridge_gateway::{DeviceGateway, SimDeviceCloud};
//!
//! let cloud = SimDeviceCloud::builder().with_spa("0101", "spa_test_1").build();
//! let update = cloud.update_state("lights", "TurnOn", "0101").unwrap();
//! assert_eq!(update.state, "On");
//! assert_eq!(cloud.report_state("spa_test_1").unwrap()["lights"], "On");
//! ```

use std::collections::HashMap;
use std::sync::Mutex;

use crate::{
    DeviceGateway, DeviceState, DiscoveredEndpoint, GatewayError, GrantTokens, StateUpdate,
    TokenExchange,
};

/// Accounts the test backend ships with: bearer token → endpoint id.
pub const SEED_ACCOUNTS: [(&str, &str); 4] = [
    ("0101", "spa_test_1"),
    ("0202", "spa_test_2"),
    ("0303", "spa_test_3"),
    ("este-es-nuestro.access.token", "spa_test_4"),
];

/// The only device slug the backend can switch.
pub const LIGHTS: &str = "lights";

/// Authorization code the simulated token endpoint refuses.
pub const REJECTED_CODE: &str = "invalid";

const UNKNOWN_TOKEN: &str = "Token does not match any existing spa";

/// In-memory device cloud.
#[derive(Debug, Default)]
pub struct SimDeviceCloud {
    accounts: HashMap<String, String>,
    state: Mutex<HashMap<String, DeviceState>>,
}

/// Builder for [`SimDeviceCloud`].
#[derive(Debug, Default)]
pub struct SimDeviceCloudBuilder {
    accounts: HashMap<String, String>,
    state: HashMap<String, DeviceState>,
}

impl SimDeviceCloudBuilder {
    /// Register a spa reachable with `token`, lights off.
    pub fn with_spa(self, token: &str, endpoint_id: &str) -> Self {
        self.with_device(token, endpoint_id, LIGHTS, "Off")
    }

    /// Register a spa and set one of its devices.  Repeated calls for the
    /// same endpoint add devices.
    pub fn with_device(mut self, token: &str, endpoint_id: &str, device: &str, value: &str) -> Self {
        self.accounts.insert(token.to_string(), endpoint_id.to_string());
        self.state
            .entry(endpoint_id.to_string())
            .or_default()
            .insert(device.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> SimDeviceCloud {
        SimDeviceCloud {
            accounts: self.accounts,
            state: Mutex::new(self.state),
        }
    }
}

impl SimDeviceCloud {
    pub fn builder() -> SimDeviceCloudBuilder {
        SimDeviceCloudBuilder::default()
    }

    /// A cloud holding the [`SEED_ACCOUNTS`], every spa with its lights off.
    pub fn seeded() -> Self {
        SEED_ACCOUNTS
            .iter()
            .fold(Self::builder(), |b, (token, endpoint)| b.with_spa(token, endpoint))
            .build()
    }

    fn endpoint_for(&self, token: &str, url: String) -> Result<&str, GatewayError> {
        self.accounts
            .get(token)
            .map(String::as_str)
            .ok_or_else(|| GatewayError::Status {
                url,
                status: 400,
                body: UNKNOWN_TOKEN.to_string(),
            })
    }

    fn lock_state(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, DeviceState>>, GatewayError> {
        self.state
            .lock()
            .map_err(|_| GatewayError::BadResponse("simulated state lock poisoned".to_string()))
    }
}

impl DeviceGateway for SimDeviceCloud {
    fn discover(&self, token: &str) -> Result<Vec<DiscoveredEndpoint>, GatewayError> {
        let endpoint_id = self.endpoint_for(token, format!("sim:/spa/discovery/{token}"))?;
        Ok(vec![DiscoveredEndpoint {
            endpoint_id: endpoint_id.to_string(),
        }])
    }

    fn update_state(&self, device: &str, value: &str, token: &str) -> Result<StateUpdate, GatewayError> {
        let url = format!("sim:/spa/updatestate/{device}/{value}/{token}");
        if device != LIGHTS {
            return Err(GatewayError::Status {
                url,
                status: 404,
                body: format!("Unknown device '{device}'"),
            });
        }
        let endpoint_id = self.endpoint_for(token, url)?;

        let state = if value == "TurnOff" { "Off" } else { "On" };
        self.lock_state()?
            .entry(endpoint_id.to_string())
            .or_default()
            .insert(device.to_string(), state.to_string());

        Ok(StateUpdate {
            endpoint_id: endpoint_id.to_string(),
            state: state.to_string(),
        })
    }

    fn report_state(&self, endpoint_id: &str) -> Result<DeviceState, GatewayError> {
        self.lock_state()?
            .get(endpoint_id)
            .cloned()
            .ok_or_else(|| GatewayError::Status {
                url: format!("sim:/spa/reportstate/{endpoint_id}"),
                status: 404,
                body: format!("Unknown endpoint '{endpoint_id}'"),
            })
    }
}

/// Token endpoint that grants every code except [`REJECTED_CODE`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SimTokenExchange;

impl SimTokenExchange {
    pub fn new() -> Self {
        Self
    }
}

impl TokenExchange for SimTokenExchange {
    fn accept_grant(&self, code: &str) -> Result<GrantTokens, GatewayError> {
        if code == REJECTED_CODE || code.is_empty() {
            return Err(GatewayError::Status {
                url: "sim:/auth/o2/token".to_string(),
                status: 400,
                body: r#"{"error":"invalid_grant"}"#.to_string(),
            });
        }
        Ok(GrantTokens {
            access_token: format!("Atza|{code}"),
            refresh_token: format!("Atzr|{code}"),
            token_type: "bearer".to_string(),
            expires_in: 3600,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_cloud_discovers_known_tokens() {
        let cloud = SimDeviceCloud::seeded();
        let endpoints = cloud.discover("0101").unwrap();
        assert_eq!(endpoints, vec![DiscoveredEndpoint { endpoint_id: "spa_test_1".into() }]);
        assert_eq!(cloud.discover("este-es-nuestro.access.token").unwrap()[0].endpoint_id, "spa_test_4");
    }

    #[test]
    fn unknown_token_is_a_400() {
        let cloud = SimDeviceCloud::seeded();
        let err = cloud.discover("0000").unwrap_err();
        assert!(matches!(err, GatewayError::Status { status: 400, .. }));
        let err = cloud.update_state(LIGHTS, "TurnOn", "0000").unwrap_err();
        assert!(matches!(err, GatewayError::Status { status: 400, .. }));
    }

    #[test]
    fn toggle_updates_reported_state() {
        let cloud = SimDeviceCloud::seeded();
        assert_eq!(cloud.update_state(LIGHTS, "TurnOn", "0202").unwrap().state, "On");
        assert_eq!(cloud.report_state("spa_test_2").unwrap()[LIGHTS], "On");

        assert_eq!(cloud.update_state(LIGHTS, "TurnOff", "0202").unwrap().state, "Off");
        assert_eq!(cloud.report_state("spa_test_2").unwrap()[LIGHTS], "Off");
    }

    #[test]
    fn unmapped_device_is_rejected_by_backend() {
        let cloud = SimDeviceCloud::seeded();
        let err = cloud.update_state("Unmaped device", "TurnOn", "0101").unwrap_err();
        assert!(matches!(err, GatewayError::Status { status: 404, .. }));
    }

    #[test]
    fn report_state_for_unknown_endpoint_fails() {
        let cloud = SimDeviceCloud::seeded();
        assert!(cloud.report_state("spa_missing").is_err());
    }

    #[test]
    fn builder_can_add_extra_devices() {
        let cloud = SimDeviceCloud::builder()
            .with_spa("t", "spa_x")
            .with_device("t", "spa_x", "jets", "On")
            .build();
        let state = cloud.report_state("spa_x").unwrap();
        assert_eq!(state.len(), 2);
        assert_eq!(state["jets"], "On");
    }

    #[test]
    fn sim_token_exchange_rejects_invalid_code() {
        let exchange = SimTokenExchange::new();
        assert!(exchange.accept_grant("good-code").is_ok());
        assert!(matches!(
            exchange.accept_grant(REJECTED_CODE),
            Err(GatewayError::Status { status: 400, .. })
        ));
    }
}
