//! Command implementations.

pub mod completions;
pub mod export;
pub mod list;
pub mod remove;
pub mod scan;

use crate::config::Config;
use crate::system::{SnapshotFile, live_sources};
use crate::ui::Output;
use anyhow::Result;
use std::path::PathBuf;
use winup_core::{Scan, Sources};

/// State shared by every command.
#[derive(Debug)]
pub struct Context {
    pub config: Config,
    pub snapshot: Option<PathBuf>,
    pub dry_run: bool,
    pub output: Output,
}

impl Context {
    pub fn new(snapshot: Option<PathBuf>, dry_run: bool, quiet: bool) -> Result<Self> {
        Ok(Self {
            config: Config::load()?,
            snapshot,
            dry_run,
            output: Output::new().quiet(quiet),
        })
    }

    /// The inventory sources: the snapshot file when one was given, otherwise
    /// the live system.
    pub fn sources(&self) -> Result<Sources> {
        match &self.snapshot {
            Some(path) => Ok(SnapshotFile::load(path)?.into_sources()),
            None => Ok(live_sources(&self.config)),
        }
    }

    /// Run one refresh cycle.
    ///
    /// With `announce`, unavailable sources are reported on the terminal;
    /// otherwise they are only logged.
    pub async fn refresh(&self, announce: bool) -> Result<(Sources, Scan)> {
        let sources = self.sources()?;
        if announce {
            self.output.section("Scanning installed updates");
        }
        let scan = winup_core::refresh::scan(&sources).await;
        if announce {
            for warning in &scan.degraded {
                self.output.warning(&format!("{warning} (treated as empty)"));
            }
        }
        Ok((sources, scan))
    }
}
