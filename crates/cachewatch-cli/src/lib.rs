//! Command-line front end for cachewatch.
//!
//! `main.rs` parses arguments and dispatches; everything else lives here so
//! it can be tested.

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Silence unused dev-dependency warnings; used by handler tests
#[cfg(test)]
use tempfile as _;

// Used by the binary only
use dotenvy as _;
use tokio as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod handlers;
pub mod parser;
pub mod presentation;

// Re-export primary types for convenient access
pub use bootstrap::{CliConfig, CliContext, bootstrap};
pub use commands::{Commands, ExcludeCommand, MetadataCommand, ProviderArgs};
pub use parser::Cli;
