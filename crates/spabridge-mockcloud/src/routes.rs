//! Route table of the mock backend.
//!
//! | Method | Path | Answer |
//! |---|---|---|
//! | GET | `/spa/discovery/:token` | `{"endpoints":[{"endpoint_id":…}]}` |
//! | GET | `/spa/updatestate/:device/:value/:token` | `{"status":{"endpoint_id":…,"state":…}}` |
//! | GET | `/spa/reportstate/:endpoint_id` | `{"lights":"Off"}` |
//! | POST | `/auth/o2/token` | token bundle, or 400 for code `invalid` |
//!
//! Backend refusals keep the status chosen by the simulated cloud and carry a
//! plain-text body.  Unknown paths are a 404.

use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use spabridge_gateway::{
    DeviceGateway, GatewayError, SimDeviceCloud, SimTokenExchange, TokenExchange,
};
use tracing::debug;

/// Device cloud plus token endpoint behind the HTTP surface.
#[derive(Debug, Default)]
pub struct MockBackend {
    cloud: SimDeviceCloud,
    tokens: SimTokenExchange,
}

impl MockBackend {
    pub fn new(cloud: SimDeviceCloud) -> Self {
        Self {
            cloud,
            tokens: SimTokenExchange::new(),
        }
    }

    /// A backend holding the seeded spa accounts.
    pub fn seeded() -> Self {
        Self::new(SimDeviceCloud::seeded())
    }

    pub fn cloud(&self) -> &SimDeviceCloud {
        &self.cloud
    }
}

type SharedBackend = Arc<MockBackend>;

/// Axum router serving `backend`.
pub fn router(backend: SharedBackend) -> Router {
    Router::new()
        .route("/spa/discovery/:token", get(discovery))
        .route("/spa/updatestate/:device/:value/:token", get(update_state))
        .route("/spa/reportstate/:endpoint_id", get(report_state))
        .route("/auth/o2/token", post(token))
        .with_state(backend)
}

async fn discovery(State(backend): State<SharedBackend>, Path(token): Path<String>) -> Response {
    debug!(%token, "mock discovery");
    answer(
        backend
            .cloud
            .discover(&token)
            .map(|endpoints| json!({ "endpoints": endpoints })),
    )
}

async fn update_state(
    State(backend): State<SharedBackend>,
    Path((device, value, token)): Path<(String, String, String)>,
) -> Response {
    debug!(%device, %value, "mock update");
    answer(
        backend
            .cloud
            .update_state(&device, &value, &token)
            .map(|status| json!({ "status": status })),
    )
}

async fn report_state(State(backend): State<SharedBackend>, Path(endpoint_id): Path<String>) -> Response {
    debug!(%endpoint_id, "mock report");
    answer(backend.cloud.report_state(&endpoint_id).map(|state| json!(state)))
}

#[derive(Debug, Deserialize)]
struct TokenForm {
    #[serde(default)]
    code: String,
}

async fn token(State(backend): State<SharedBackend>, Form(form): Form<TokenForm>) -> Response {
    match backend.tokens.accept_grant(&form.code) {
        Ok(tokens) => Json(tokens).into_response(),
        Err(GatewayError::Status { status, body, .. }) => (
            status_code(status),
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

fn answer(result: Result<Value, GatewayError>) -> Response {
    match result {
        Ok(body) => Json(body).into_response(),
        Err(GatewayError::Status { status, body, .. }) => (status_code(status), body).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

fn status_code(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}
