//! Bindings from the engine's collaborator traits to this machine.
//!
//! Inventories come either from the live system (PowerShell, DISM, the
//! registry and pnputil) or from a JSON snapshot file. Removals always go
//! through the configured native tools.

pub mod live;
pub mod snapshot;

use crate::config::Config;
use std::sync::Arc;
use winup_core::process::{
    CommandExecutor, dism_remove_args, pnputil_delete_args, wusa_uninstall_args,
};
use winup_core::{Executors, Sources};

pub use snapshot::SnapshotFile;

/// Query the running system.
pub fn live_sources(config: &Config) -> Sources {
    Sources {
        history: Arc::new(live::UpdateHistory::new(&config.tools.powershell)),
        packages: Arc::new(live::DismPackages::new(&config.tools.dism)),
        secondary: Arc::new(live::ServicingRegistry::new(&config.secondary_index_filter)),
        drivers: Arc::new(live::DriverStore::new(&config.tools.pnputil)),
    }
}

#[derive(Debug)]
pub struct RemovalTools {
    pub dism: CommandExecutor,
    pub pnputil: CommandExecutor,
    pub wusa: CommandExecutor,
}

impl RemovalTools {
    pub fn new(config: &Config) -> Self {
        Self {
            dism: CommandExecutor::new("DISM", &config.tools.dism, dism_remove_args),
            pnputil: CommandExecutor::new("PnPUtil", &config.tools.pnputil, pnputil_delete_args),
            wusa: CommandExecutor::new("WUSA", &config.tools.wusa, wusa_uninstall_args),
        }
    }

    pub fn into_executors(self) -> Executors {
        Executors {
            package_manager: Arc::new(self.dism),
            driver_tool: Arc::new(self.pnputil),
            standalone: Arc::new(self.wusa),
        }
    }
}
