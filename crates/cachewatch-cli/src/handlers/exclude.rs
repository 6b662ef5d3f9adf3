//! Exclude command handler.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::commands::ExcludeCommand;

/// Execute an exclusion registry subcommand.
pub async fn execute(ctx: &CliContext, command: ExcludeCommand) -> Result<()> {
    let exclusions = ctx.app().exclusions();
    match command {
        ExcludeCommand::List => {
            let ips = exclusions.list().await?;
            if ips.is_empty() {
                println!("No excluded IPs.");
            } else {
                for ip in ips {
                    println!("{ip}");
                }
            }
        }
        ExcludeCommand::Add { ip } => {
            let added = exclusions.add(&ip).await?;
            println!("Added {added} to excluded IPs");
        }
        ExcludeCommand::Remove { ip } => {
            let removed = exclusions.remove(&ip).await?;
            println!("Removed {removed} from excluded IPs");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::{CliConfig, bootstrap};
    use cachewatch_core::ExclusionError;

    #[tokio::test]
    async fn test_add_then_duplicate_then_remove() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = bootstrap(CliConfig {
            database_path: Some(dir.path().join("cw.db")),
        })
        .await
        .unwrap();

        execute(&ctx, ExcludeCommand::Add { ip: "10.0.0.7".into() })
            .await
            .unwrap();

        let err = execute(&ctx, ExcludeCommand::Add { ip: "10.0.0.7".into() })
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExclusionError>(),
            Some(ExclusionError::AlreadyExists(_))
        ));

        execute(&ctx, ExcludeCommand::Remove { ip: "10.0.0.7".into() })
            .await
            .unwrap();
        assert!(ctx.app().exclusions().list().await.unwrap().is_empty());
    }
}
