//! Record command handler.

use anyhow::Result;
use cachewatch_core::NewDownloadEvent;

use crate::bootstrap::CliContext;

/// Record one download event stamped with the current time.
pub async fn execute(ctx: &CliContext, service: &str, hit: u64, miss: u64, ip: &str) -> Result<()> {
    let stored = ctx
        .app()
        .downloads()
        .record(NewDownloadEvent::now(service, hit, miss, ip))
        .await?;

    println!(
        "Recorded event #{} for {} ({} hit / {} miss from {})",
        stored.id, stored.service_name, stored.bytes_hit, stored.bytes_miss, stored.source_ip
    );
    Ok(())
}
