//! One refresh cycle: gather every inventory, then build and match records.
//!
//! The four queries are independent and run concurrently on the blocking
//! pool. Matching starts only once all of them have returned. A source that
//! fails contributes an empty list and a warning, never an error.

use crate::drivers::resolve_drivers;
use crate::history::{RawHistoryEntry, build_records, mark_latest_security};
use crate::matcher::{IdentityMatcher, MatchContext, MatchLog};
use crate::sources::{DriverSource, HistorySource, PackageSource, SecondaryIndex, SourceError};
use std::sync::Arc;
use tracing::{info, warn};
use winup_schema::{InventorySnapshot, UpdateRecord};

/// The collaborators a refresh queries.
#[derive(Clone)]
pub struct Sources {
    pub history: Arc<dyn HistorySource>,
    pub packages: Arc<dyn PackageSource>,
    pub secondary: Arc<dyn SecondaryIndex>,
    pub drivers: Arc<dyn DriverSource>,
}

impl std::fmt::Debug for Sources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sources").finish_non_exhaustive()
    }
}

/// Result of a refresh.
#[derive(Debug, Clone, Default)]
pub struct Scan {
    /// Raw history the records were built from.
    pub history: Vec<RawHistoryEntry>,
    pub records: Vec<UpdateRecord>,
    pub snapshot: InventorySnapshot,
    /// One line per identity-matching decision.
    pub trace: Vec<MatchLog>,
    /// Driver records paired with a driver package.
    pub drivers_matched: usize,
    /// Warnings for sources that could not be queried.
    pub degraded: Vec<String>,
}

async fn query<T, F>(label: &'static str, f: F, degraded: &mut Vec<String>) -> Vec<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<Vec<T>, SourceError> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(Ok(items)) => items,
        Ok(Err(e)) => {
            warn!("{label} unavailable: {e}");
            degraded.push(format!("{label}: {e}"));
            Vec::new()
        }
        Err(e) => {
            warn!("{label} query aborted: {e}");
            degraded.push(format!("{label}: query aborted"));
            Vec::new()
        }
    }
}

/// Query every source concurrently and match the results.
pub async fn scan(sources: &Sources) -> Scan {
    let mut history_err = Vec::new();
    let mut packages_err = Vec::new();
    let mut secondary_err = Vec::new();
    let mut drivers_err = Vec::new();

    let history = Arc::clone(&sources.history);
    let packages = Arc::clone(&sources.packages);
    let secondary = Arc::clone(&sources.secondary);
    let drivers = Arc::clone(&sources.drivers);

    let (history, packages, secondary_names, drivers) = tokio::join!(
        query("update history", move || history.history(), &mut history_err),
        query("package inventory", move || packages.packages(), &mut packages_err),
        query(
            "secondary package index",
            move || secondary.secondary_names(),
            &mut secondary_err
        ),
        query("driver inventory", move || drivers.drivers(), &mut drivers_err),
    );

    let snapshot = InventorySnapshot {
        packages,
        secondary_names,
        drivers,
    };
    let mut scan = assemble(&history, snapshot);
    scan.degraded = [history_err, packages_err, secondary_err, drivers_err].concat();
    scan
}

/// Build records from history and match them against a complete snapshot.
pub fn assemble(history: &[RawHistoryEntry], snapshot: InventorySnapshot) -> Scan {
    let mut records = build_records(history);

    let ctx = MatchContext {
        packages: &snapshot.packages,
        secondary_names: &snapshot.secondary_names,
    };
    let trace = IdentityMatcher::default().resolve(&mut records, &ctx);
    let drivers_matched = resolve_drivers(&mut records, &snapshot.drivers);
    mark_latest_security(&mut records);

    info!(
        "{} update(s), {} removable, {} driver(s) matched",
        records.len(),
        records.iter().filter(|r| r.is_removable()).count(),
        drivers_matched
    );

    Scan {
        history: history.to_vec(),
        records,
        snapshot,
        trace,
        drivers_matched,
        degraded: Vec::new(),
    }
}
