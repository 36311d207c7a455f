//! winup - inspect and remove installed Windows updates
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_panics_doc)]
//!
//! # Overview
//!
//! `winup` reads the update history, pairs each update with the native tool
//! that can uninstall it, and removes a selection in one batch.
//!
//! # Architecture
//!
//! - **Engine**: `winup-core` holds the matchers, the removal orchestrator
//!   and the batch runner. It only sees this machine through traits.
//! - **System bindings**: [`system`] implements those traits with
//!   PowerShell, DISM, pnputil, wusa and the registry, or with a JSON
//!   snapshot for offline inspection.
//! - **Actor Pattern**: all terminal output goes through one UI thread.
//!
//! # Directory Layout
//!
//! ```text
//! ~/.winup/
//! └── config.toml   # Tool paths and timeouts (optional)
//! ```

pub mod cmd;
pub mod config;
pub mod system;
pub mod ui;

pub use winup_core::paths::*;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use winup_schema::UpdateCategory;

/// winup - inspect and remove installed Windows updates
#[derive(Parser, Debug)]
#[command(name = "winup")]
#[command(author, version = env!("WINUP_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Show what would happen without removing anything
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Only print warnings, errors and results
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Read inventories from a snapshot file instead of the live system
    #[arg(long, global = true, env = "WINUP_SNAPSHOT")]
    pub snapshot: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Query the system and show how each update can be removed
    Scan {
        /// Write the gathered inventories to a snapshot file
        #[arg(long)]
        dump: Option<PathBuf>,
    },
    /// List installed updates
    List {
        /// Only show updates of this category
        #[arg(long, short = 'c')]
        category: Option<CategoryArg>,
        /// Only show updates that can be removed
        #[arg(long, short = 'r')]
        removable: bool,
        /// Only show updates whose title, KB or description contains this text
        #[arg(long, short = 's')]
        search: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Remove one or more updates
    Remove {
        /// KB identifiers (KB5034441 or 5034441), removal targets such as a
        /// driver inf name (oem12.inf), or full update titles
        #[arg(required_unless_present = "all_removable")]
        updates: Vec<String>,
        /// Remove every removable update
        #[arg(long, conflicts_with = "updates")]
        all_removable: bool,
        /// With --all-removable, only this category
        #[arg(long, short = 'c', requires = "all_removable")]
        category: Option<CategoryArg>,
        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Export the update list to a file (csv, json or text)
    Export {
        /// Destination file
        path: PathBuf,
        /// Output format
        #[arg(long, short = 'f', value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

/// Category filter accepted on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CategoryArg {
    Quality,
    Driver,
    Definition,
    Other,
}

impl From<CategoryArg> for UpdateCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Quality => Self::Quality,
            CategoryArg::Driver => Self::Driver,
            CategoryArg::Definition => Self::Definition,
            CategoryArg::Other => Self::Other,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
    /// Human-readable report grouped by category
    Text,
}
