//! `spabridge` – smart-home directive bridge CLI.
//!
//! - `spabridge dispatch [FILE]` answers one directive against the configured
//!   device cloud and prints the response event to stdout.
//! - `spabridge mock-cloud` runs the local mock backend.
//! - `spabridge config` shows the effective `~/.spabridge/config.toml`.
//!
//! Logs go to stderr so stdout carries only command output.

mod cli;
mod commands;
mod config;

use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use cli::{Cli, Command};

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Dispatch { request, context } => {
            commands::dispatch(request.as_deref(), context.as_deref())
                .map(|response| print_json(&response))
        }
        Command::MockCloud { port } => commands::mock_cloud(port),
        Command::Config { init } => commands::show_config(init).map(|(path, cfg)| {
            println!("# {}", path.display());
            println!("{cfg:#?}");
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "spabridge failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` filter (default `info`); `SPABRIDGE_LOG_FORMAT=json` emits
/// newline-delimited JSON instead of the compact format.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if std::env::var("SPABRIDGE_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(_) => println!("{value}"),
    }
}
