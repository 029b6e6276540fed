//! [`MockCloud`] – local HTTP stand-in for the spa backend and token endpoint.
//!
//! Listens on `127.0.0.1:3434` by default (configurable via
//! [`MockCloud::with_port`]).  Requests are served by the axum
//! [`router`][crate::routes::router].

use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::sync::Arc;
use std::thread::JoinHandle;

use spabridge_gateway::{CloudAddress, SimDeviceCloud};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::MockCloudError;
use crate::routes::{MockBackend, router};

/// Default port, matching the default `cloud_port` setting.
pub const DEFAULT_PORT: u16 = 3434;

/// Mock backend server.
///
/// # Example
///
/// ```rust,no_run
/// use spabridge_mockcloud::MockCloud;
///
/// #[tokio::main]
/// async fn main() {
///     MockCloud::new()
///         .with_port(8000)
///         .run()
///         .await
///         .expect("mock cloud failed");
/// }
/// ```
pub struct MockCloud {
    backend: MockBackend,
    port: u16,
}

impl Default for MockCloud {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCloud {
    /// Seeded backend on the [`DEFAULT_PORT`].
    pub fn new() -> Self {
        Self {
            backend: MockBackend::seeded(),
            port: DEFAULT_PORT,
        }
    }

    /// Override the listening port.  `0` picks a free one.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Serve a custom simulated cloud instead of the seeded one.
    pub fn with_cloud(mut self, cloud: SimDeviceCloud) -> Self {
        self.backend = MockBackend::new(cloud);
        self
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until the task is cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`MockCloudError::Bind`] if the listener cannot bind and
    /// [`MockCloudError::Io`] if serving fails.
    pub async fn run(self) -> Result<(), MockCloudError> {
        let addr = SocketAddr::from(([127, 0, 0, 1], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| MockCloudError::Bind { addr, source })?;
        info!(%addr, "mock cloud listening");

        axum::serve(listener, router(Arc::new(self.backend))).await?;
        Ok(())
    }

    /// Seeded backend on a free port, served from a background thread.
    ///
    /// # Errors
    ///
    /// See [`MockCloud::start`].
    pub fn spawn() -> Result<MockCloudHandle, MockCloudError> {
        Self::new().with_port(0).start()
    }

    /// Bind now and serve from a background thread until the returned
    /// handle is dropped.
    ///
    /// # Errors
    ///
    /// [`MockCloudError::Bind`] if the port is taken, [`MockCloudError::Io`]
    /// if the runtime cannot be built.
    pub fn start(self) -> Result<MockCloudHandle, MockCloudError> {
        let requested = SocketAddr::from(([127, 0, 0, 1], self.port));
        let listener = StdTcpListener::bind(requested).map_err(|source| MockCloudError::Bind {
            addr: requested,
            source,
        })?;
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let backend = Arc::new(self.backend);

        let thread = std::thread::Builder::new()
            .name("spabridge-mockcloud".to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    match TcpListener::from_std(listener) {
                        Ok(listener) => serve(listener, backend, shutdown_rx).await,
                        Err(e) => error!(error = %e, "mock cloud listener setup failed"),
                    }
                });
            })?;
        info!(%addr, "mock cloud started");

        Ok(MockCloudHandle {
            addr,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        })
    }
}

/// A running background [`MockCloud`].  Dropping it stops the server.
#[derive(Debug)]
pub struct MockCloudHandle {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl MockCloudHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Address for a gateway client pointed at this server.
    pub fn cloud_address(&self) -> CloudAddress {
        CloudAddress::new("http", self.addr.ip().to_string(), self.addr.port().to_string())
    }

    /// URL of the token route.
    pub fn token_url(&self) -> String {
        format!("http://{}/auth/o2/token", self.addr)
    }

    /// Stop the server and wait for its thread.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            warn!("mock cloud thread panicked");
        }
    }
}

impl Drop for MockCloudHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn serve(listener: TcpListener, backend: Arc<MockBackend>, shutdown: oneshot::Receiver<()>) {
    let stopped = async move {
        let _ = shutdown.await;
        debug!("mock cloud shutting down");
    };
    if let Err(e) = axum::serve(listener, router(backend))
        .with_graceful_shutdown(stopped)
        .await
    {
        error!(error = %e, "mock cloud server failed");
    }
}
