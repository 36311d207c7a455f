//! Collaborator traits for the inventories the matchers consume.
//!
//! Implementations live at the edge (the Windows query layer in the CLI, a
//! JSON snapshot, or in-memory test doubles). Every trait is blocking; the
//! refresh runs them on the blocking pool.

use crate::history::RawHistoryEntry;
use winup_schema::{DriverInventoryEntry, InventorySnapshot, PackageInventoryEntry};

/// Failure to query an inventory source.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("{source_name} is not available on this platform")]
    Unsupported { source_name: &'static str },

    #[error("failed to run {tool}: {reason}")]
    Query { tool: String, reason: String },

    #[error("could not read {source_name} output: {reason}")]
    Malformed {
        source_name: &'static str,
        reason: String,
    },
}

/// Installed-update history.
pub trait HistorySource: Send + Sync {
    fn history(&self) -> Result<Vec<RawHistoryEntry>, SourceError>;
}

/// Primary servicing package inventory.
pub trait PackageSource: Send + Sync {
    fn packages(&self) -> Result<Vec<PackageInventoryEntry>, SourceError>;
}

/// Best-effort secondary package name index.
///
/// Queried once per refresh and again by the standalone-installer fallback.
pub trait SecondaryIndex: Send + Sync {
    fn secondary_names(&self) -> Result<Vec<String>, SourceError>;
}

/// Third-party driver packages.
pub trait DriverSource: Send + Sync {
    fn drivers(&self) -> Result<Vec<DriverInventoryEntry>, SourceError>;
}

impl PackageSource for InventorySnapshot {
    fn packages(&self) -> Result<Vec<PackageInventoryEntry>, SourceError> {
        Ok(self.packages.clone())
    }
}

impl SecondaryIndex for InventorySnapshot {
    fn secondary_names(&self) -> Result<Vec<String>, SourceError> {
        Ok(self.secondary_names.clone())
    }
}

impl DriverSource for InventorySnapshot {
    fn drivers(&self) -> Result<Vec<DriverInventoryEntry>, SourceError> {
        Ok(self.drivers.clone())
    }
}

impl HistorySource for Vec<RawHistoryEntry> {
    fn history(&self) -> Result<Vec<RawHistoryEntry>, SourceError> {
        Ok(self.clone())
    }
}
