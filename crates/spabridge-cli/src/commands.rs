//! Subcommand implementations.

use std::io::Read;
use std::path::{Path, PathBuf};

use serde_json::Value;
use spabridge_dispatch::Dispatcher;
use spabridge_gateway::{GatewayError, HttpDeviceCloud, LwaTokenClient};
use spabridge_mockcloud::{MockCloud, MockCloudError};
use thiserror::Error;
use tracing::info;

use crate::config::{self, Config, ConfigError};

#[derive(Debug, Error)]
pub(crate) enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot build gateway client: {0}")]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    MockCloud(#[from] MockCloudError),

    #[error("cannot read {source_name}: {source}")]
    Input {
        source_name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{source_name} is not valid JSON: {source}")]
    Json {
        source_name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Build a dispatcher wired to the configured device cloud and token endpoint.
pub(crate) fn dispatcher(cfg: &Config) -> Result<Dispatcher, CliError> {
    let timeout = cfg.request_timeout();
    let cloud = HttpDeviceCloud::new(&cfg.cloud_address(), timeout)?;
    let tokens = LwaTokenClient::new(&cfg.token_url, &cfg.client_id, &cfg.client_secret, timeout)?;
    info!(cloud = %cloud.base_url(), token_url = %tokens.token_url(), "dispatcher ready");
    Ok(Dispatcher::new(Box::new(cloud), Box::new(tokens)))
}

pub(crate) fn dispatch(request: Option<&Path>, context: Option<&Path>) -> Result<Value, CliError> {
    let cfg = config::load()?;
    let request = read_json(request)?;
    let context = context.map(|p| read_json(Some(p))).transpose()?;
    Ok(dispatcher(&cfg)?.handle(&request, context.as_ref()))
}

pub(crate) fn mock_cloud(port: u16) -> Result<(), CliError> {
    let runtime = tokio::runtime::Runtime::new().map_err(MockCloudError::Io)?;
    runtime.block_on(MockCloud::new().with_port(port).run())?;
    Ok(())
}

/// Effective configuration and the path it is read from.
pub(crate) fn show_config(init: bool) -> Result<(PathBuf, Config), CliError> {
    let path = if init {
        let path = config::save(&Config::default())?;
        info!(path = %path.display(), "default configuration written");
        path
    } else {
        config::config_path()
    };
    Ok((path, config::load()?))
}

/// Parse JSON from `path`, or stdin for `None` / `-`.
fn read_json(path: Option<&Path>) -> Result<Value, CliError> {
    let (source_name, raw) = match path {
        Some(p) if p != Path::new("-") => {
            let name = p.display().to_string();
            let raw = std::fs::read_to_string(p).map_err(|source| CliError::Input {
                source_name: name.clone(),
                source,
            })?;
            (name, raw)
        }
        _ => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .map_err(|source| CliError::Input {
                    source_name: "stdin".to_string(),
                    source,
                })?;
            ("stdin".to_string(), raw)
        }
    };
    serde_json::from_str(&raw).map_err(|source| CliError::Json { source_name, source })
}
