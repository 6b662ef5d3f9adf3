//! Main CLI parser and top-level argument handling.
//!
//! This module defines the root CLI structure with global options.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::{Commands, ProviderArgs};

/// Command-line interface for the LAN cache monitor.
#[derive(Parser)]
#[command(name = "cachewatch")]
#[command(about = "Monitor LAN cache hit/miss traffic per service")]
#[command(version)]
pub struct Cli {
    /// Database file (defaults to the platform data directory)
    #[arg(long = "database", env = "CACHEWATCH_DATABASE", global = true)]
    pub database: Option<PathBuf>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub provider: ProviderArgs,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default log directive when `RUST_LOG` is unset.
    pub const fn default_log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}
