//! Command-line surface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "spabridge", version, about = "Smart-home directive bridge for the spa backend")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum Command {
    /// Answers one directive and prints the response event as JSON.
    Dispatch {
        /// Request JSON file; reads stdin when omitted or `-`.
        #[arg(value_name = "FILE")]
        request: Option<PathBuf>,
        /// Invocation context JSON file, logged at debug level.
        #[arg(long, value_name = "FILE")]
        context: Option<PathBuf>,
    },
    /// Runs the mock device cloud in the foreground.
    MockCloud {
        #[arg(long, default_value_t = spabridge_mockcloud::DEFAULT_PORT)]
        port: u16,
    },
    /// Prints the effective configuration and its path.
    Config {
        /// Writes the default configuration file first.
        #[arg(long)]
        init: bool,
    },
}
