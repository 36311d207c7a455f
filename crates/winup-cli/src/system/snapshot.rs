//! Offline inventories loaded from a JSON file.
//!
//! A snapshot holds the raw history plus the three inventories, in the same
//! shapes the live queries produce. `winup scan --dump` writes one.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use winup_core::Sources;
use winup_core::history::RawHistoryEntry;
use winup_schema::InventorySnapshot;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotFile {
    #[serde(default)]
    pub history: Vec<RawHistoryEntry>,
    #[serde(default)]
    pub inventory: InventorySnapshot,
}

impl SnapshotFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse snapshot {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))
    }

    /// Serve the snapshot through the engine's source traits.
    pub fn into_sources(self) -> Sources {
        let inventory = Arc::new(self.inventory);
        Sources {
            history: Arc::new(self.history),
            packages: inventory.clone(),
            secondary: inventory.clone(),
            drivers: inventory,
        }
    }
}
