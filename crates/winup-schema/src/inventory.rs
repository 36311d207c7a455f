//! Inventory snapshots gathered once per refresh.

use serde::{Deserialize, Serialize};

/// An installed servicing package as listed by the package manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInventoryEntry {
    /// Full package identity, e.g. `Package_for_KB5034441~31bf3856ad364e35~amd64~~22621.3007.1.1`.
    pub identity: String,
    /// Install state string, e.g. `Installed` or `Superseded`.
    #[serde(default)]
    pub state: String,
}

impl PackageInventoryEntry {
    /// Create an entry from an identity and a state.
    pub fn new(identity: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            state: state.into(),
        }
    }
}

/// A third-party driver package from the driver store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverInventoryEntry {
    /// Published inf name, e.g. `oem12.inf`.
    pub inf_name: String,
    /// Original inf file name, e.g. `iigd_dch.inf`.
    #[serde(default)]
    pub original_name: String,
    /// Provider name, e.g. `Intel Corporation`.
    #[serde(default)]
    pub provider: String,
    /// Device class name, e.g. `Display`.
    #[serde(default)]
    pub class_name: String,
    /// Driver version and date as printed by the driver store.
    #[serde(default)]
    pub version_and_date: String,
    /// Signer name.
    #[serde(default)]
    pub signer: String,
}

/// Joint snapshot of every inventory the matchers need.
///
/// Matching only starts once all three inventories have been gathered; a
/// source that could not be queried contributes an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    /// Primary package inventory.
    #[serde(default)]
    pub packages: Vec<PackageInventoryEntry>,
    /// Secondary package names, used only as fallback matching keys.
    #[serde(default)]
    pub secondary_names: Vec<String>,
    /// Third-party driver packages.
    #[serde(default)]
    pub drivers: Vec<DriverInventoryEntry>,
}

impl InventorySnapshot {
    /// First secondary name containing `pattern`, compared case-insensitively.
    pub fn find_secondary(&self, pattern: &str) -> Option<&str> {
        find_containing(&self.secondary_names, pattern)
    }
}

/// First name containing `pattern`, compared case-insensitively.
pub fn find_containing<'a>(names: &'a [String], pattern: &str) -> Option<&'a str> {
    let needle = pattern.to_lowercase();
    names
        .iter()
        .find(|name| name.to_lowercase().contains(&needle))
        .map(String::as_str)
}
