//! Scan command

use super::Context;
use crate::system::SnapshotFile;
use anyhow::Result;
use std::path::Path;

/// Refresh and report how each update was matched.
pub async fn scan(ctx: &Context, dump: Option<&Path>) -> Result<()> {
    let (_, scan) = ctx.refresh(true).await?;

    for line in &scan.trace {
        ctx.output.info(&line.to_string());
    }

    let removable = scan.records.iter().filter(|r| r.is_removable()).count();
    ctx.output.success(&format!(
        "{} update(s), {} removable, {} driver(s) matched",
        scan.records.len(),
        removable,
        scan.drivers_matched
    ));

    if let Some(path) = dump {
        let snapshot = SnapshotFile {
            history: scan.history,
            inventory: scan.snapshot,
        };
        snapshot.save(path)?;
        ctx.output
            .success(&format!("Snapshot written to {}", path.display()));
    }

    ctx.output.wait_async().await;
    Ok(())
}
