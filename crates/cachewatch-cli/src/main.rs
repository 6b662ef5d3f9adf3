//! CLI entry point.
//!
//! Parses arguments, initializes logging and dispatches to handlers.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cachewatch_cli::handlers::serve::ServeOptions;
use cachewatch_cli::{Cli, CliConfig, Commands, bootstrap, handlers};

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before parsing so env fallbacks see it
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.default_log_level());

    let provider = cli.provider.settings()?;

    match cli.command {
        Commands::Serve {
            port,
            refresh_interval_ms,
            allowed_origin,
        } => {
            handlers::serve::execute(ServeOptions {
                port,
                refresh_interval_ms,
                allowed_origins: allowed_origin,
                database_path: cli.database,
                provider,
            })
            .await?;
        }
        Commands::Metadata { command } => {
            handlers::metadata::execute(provider, command).await?;
        }
        Commands::Exclude { command } => {
            let ctx = bootstrap(CliConfig {
                database_path: cli.database,
            })
            .await?;
            handlers::exclude::execute(&ctx, command).await?;
        }
        Commands::Stats { days, include_all } => {
            let ctx = bootstrap(CliConfig {
                database_path: cli.database,
            })
            .await?;
            handlers::stats::execute(&ctx, days, include_all).await?;
        }
        Commands::Record {
            service,
            hit,
            miss,
            ip,
        } => {
            let ctx = bootstrap(CliConfig {
                database_path: cli.database,
            })
            .await?;
            handlers::record::execute(&ctx, &service, hit, miss, &ip).await?;
        }
    }

    Ok(())
}
