//! [`HttpDeviceCloud`] – blocking HTTP client for the spa backend.
//!
//! Every call is a single `GET` under `{base}/spa/`:
//!
//! | Operation | Route |
//! |---|---|
//! | discover | `spa/discovery/{token}` |
//! | update state | `spa/updatestate/{device}/{value}/{token}` |
//! | report state | `spa/reportstate/{endpoint_id}` |
//!
//! Path segments are percent-encoded, so the `Unmaped device` pass-through
//! slug reaches the backend intact.

use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info};

use crate::{
    DeviceGateway, DeviceState, DiscoveredEndpoint, DiscoveryResponse, GatewayError, StateUpdate,
    UpdateStateResponse,
};

const BASE_SEGMENT: &str = "spa";

/// Scheme, host and port of the device cloud.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudAddress {
    pub scheme: String,
    pub host: String,
    /// May be empty, in which case no port segment is emitted.
    pub port: String,
}

impl CloudAddress {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            port: port.into(),
        }
    }

    /// `{scheme}://{host}[:{port}]`
    pub fn base_url(&self) -> String {
        if self.port.trim().is_empty() {
            format!("{}://{}", self.scheme, self.host)
        } else {
            format!("{}://{}:{}", self.scheme, self.host, self.port.trim())
        }
    }
}

/// Blocking client for the device cloud.  Construct once per process.
#[derive(Debug)]
pub struct HttpDeviceCloud {
    base: Url,
    client: Client,
}

impl HttpDeviceCloud {
    /// Create a client for `address`, optionally bounding each call by
    /// `timeout`.
    ///
    /// # Errors
    ///
    /// [`GatewayError::InvalidAddress`] if the address does not form a base
    /// URL, [`GatewayError::Http`] if the HTTP client cannot be built.
    pub fn new(address: &CloudAddress, timeout: Option<Duration>) -> Result<Self, GatewayError> {
        let raw = address.base_url();
        let base = Url::parse(&raw).map_err(|e| GatewayError::InvalidAddress {
            address: raw.clone(),
            reason: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(GatewayError::InvalidAddress {
                address: raw,
                reason: "cannot be a base URL".to_string(),
            });
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            base,
            client: builder.build()?,
        })
    }

    /// The base URL requests are issued under.
    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    fn url_for(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push(BASE_SEGMENT).extend(segments);
        }
        url
    }

    fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, GatewayError> {
        let url = self.url_for(segments);
        debug!(%url, "GET device cloud");

        let response = self.client.get(url.clone()).send().map_err(|e| {
            error!(%url, error = %e, "device cloud unreachable");
            GatewayError::Http(e)
        })?;

        let status = response.status();
        info!(%url, status = status.as_u16(), "device cloud response");
        let body = response.text()?;

        if !status.is_success() {
            error!(%url, status = status.as_u16(), %body, "device cloud rejected request");
            return Err(GatewayError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| GatewayError::BadResponse(format!("{url}: {e}")))
    }
}

impl DeviceGateway for HttpDeviceCloud {
    fn discover(&self, token: &str) -> Result<Vec<DiscoveredEndpoint>, GatewayError> {
        let response: DiscoveryResponse = self.get_json(&["discovery", token])?;
        Ok(response.endpoints)
    }

    fn update_state(&self, device: &str, value: &str, token: &str) -> Result<StateUpdate, GatewayError> {
        let response: UpdateStateResponse = self.get_json(&["updatestate", device, value, token])?;
        Ok(response.status)
    }

    fn report_state(&self, endpoint_id: &str) -> Result<DeviceState, GatewayError> {
        self.get_json(&["reportstate", endpoint_id])
    }
}
