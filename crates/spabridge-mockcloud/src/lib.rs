//! `spabridge-mockcloud` – local test backend.
//!
//! Serves the spa backend routes and the authorization-code token route over
//! plain HTTP, backed by the in-memory
//! [`SimDeviceCloud`][spabridge_gateway::SimDeviceCloud].  Used by the
//! end-to-end tests and by `spabridge mock-cloud` for manual runs.
//!
//! # Modules
//!
//! - [`server`] – [`MockCloud`][server::MockCloud] and its background
//!   [`MockCloudHandle`][server::MockCloudHandle].
//! - [`routes`] – [`MockBackend`][routes::MockBackend] and the axum
//!   [`router`][routes::router] in front of it.

pub mod routes;
pub mod server;

use std::net::SocketAddr;

use thiserror::Error;

pub use routes::{MockBackend, router};
pub use server::{DEFAULT_PORT, MockCloud, MockCloudHandle};

#[derive(Debug, Error)]
pub enum MockCloudError {
    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
