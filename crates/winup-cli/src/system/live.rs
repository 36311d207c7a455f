//! Live inventory queries.

use std::path::{Path, PathBuf};
use winup_core::exec::ExecError;
use winup_core::history::RawHistoryEntry;
use winup_core::parse::{parse_driver_list, parse_package_list};
use winup_core::process::run_tool;
use winup_core::sources::{
    DriverSource, HistorySource, PackageSource, SecondaryIndex, SourceError,
};
use winup_schema::{DriverInventoryEntry, PackageInventoryEntry};

/// Registry key whose subkeys name every servicing package.
pub const SERVICING_PACKAGES_KEY: &str =
    r"SOFTWARE\Microsoft\Windows\CurrentVersion\Component Based Servicing\Packages";

const HISTORY_SCRIPT: &str = r"
$ErrorActionPreference = 'Stop'
[Console]::OutputEncoding = [System.Text.Encoding]::UTF8
$searcher = (New-Object -ComObject Microsoft.Update.Session).CreateUpdateSearcher()
$count = $searcher.GetTotalHistoryCount()
$entries = @()
if ($count -gt 0) {
  $entries = @($searcher.QueryHistory(0, $count) | ForEach-Object {
    [pscustomobject]@{
      title = [string]$_.Title
      date = $_.Date.ToUniversalTime().ToString('o')
      description = [string]$_.Description
      support_url = [string]$_.SupportUrl
      update_id = [string]$_.UpdateIdentity.UpdateID
      operation = [int]$_.Operation
      result_code = [int]$_.ResultCode
      categories = @($_.Categories | ForEach-Object {
        [pscustomobject]@{ name = [string]$_.Name; id = [string]$_.CategoryID }
      })
    }
  })
}
ConvertTo-Json -InputObject $entries -Depth 4 -Compress
";

fn query_error(e: ExecError) -> SourceError {
    match e {
        ExecError::Spawn { tool, reason } | ExecError::Io { tool, reason } => {
            SourceError::Query { tool, reason }
        }
        ExecError::Timeout(limit) => SourceError::Query {
            tool: "query".to_string(),
            reason: format!("timed out after {}s", limit.as_secs()),
        },
    }
}

/// Run a listing tool and return its output, treating a non-zero exit as a
/// failed query.
fn capture(tool: &str, program: &Path, args: &[&str]) -> Result<String, SourceError> {
    let args: Vec<String> = args.iter().map(|a| (*a).to_string()).collect();
    let out = run_tool(tool, program, &args, None).map_err(query_error)?;
    if out.exit_code != 0 {
        return Err(SourceError::Query {
            tool: tool.to_string(),
            reason: format!("exit code {}: {}", out.exit_code, out.output.trim()),
        });
    }
    Ok(out.output)
}

/// Parse the history script's JSON output.
pub fn parse_history_json(json: &str) -> Result<Vec<RawHistoryEntry>, SourceError> {
    let json = json.trim().trim_start_matches('\u{feff}');
    if json.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(json).map_err(|e| SourceError::Malformed {
        source_name: "update history",
        reason: e.to_string(),
    })
}

/// Installed-update history through the Windows Update agent.
#[derive(Debug, Clone)]
pub struct UpdateHistory {
    powershell: PathBuf,
}

impl UpdateHistory {
    pub fn new(powershell: &Path) -> Self {
        Self {
            powershell: powershell.to_path_buf(),
        }
    }
}

impl HistorySource for UpdateHistory {
    fn history(&self) -> Result<Vec<RawHistoryEntry>, SourceError> {
        let out = capture(
            "PowerShell",
            &self.powershell,
            &["-NoProfile", "-NonInteractive", "-Command", HISTORY_SCRIPT],
        )?;
        parse_history_json(&out)
    }
}

/// `dism /Online /Get-Packages`.
#[derive(Debug, Clone)]
pub struct DismPackages {
    dism: PathBuf,
}

impl DismPackages {
    pub fn new(dism: &Path) -> Self {
        Self {
            dism: dism.to_path_buf(),
        }
    }
}

impl PackageSource for DismPackages {
    fn packages(&self) -> Result<Vec<PackageInventoryEntry>, SourceError> {
        let out = capture(
            "DISM",
            &self.dism,
            &["/Online", "/Get-Packages", "/English"],
        )?;
        Ok(parse_package_list(&out))
    }
}

/// `pnputil /enum-drivers`.
#[derive(Debug, Clone)]
pub struct DriverStore {
    pnputil: PathBuf,
}

impl DriverStore {
    pub fn new(pnputil: &Path) -> Self {
        Self {
            pnputil: pnputil.to_path_buf(),
        }
    }
}

impl DriverSource for DriverStore {
    fn drivers(&self) -> Result<Vec<DriverInventoryEntry>, SourceError> {
        let out = capture("PnPUtil", &self.pnputil, &["/enum-drivers"])?;
        Ok(parse_driver_list(&out))
    }
}

/// Servicing package names from the registry, filtered by substring.
#[derive(Debug, Clone)]
pub struct ServicingRegistry {
    filter: String,
}

impl ServicingRegistry {
    pub fn new(filter: &str) -> Self {
        Self {
            filter: filter.to_string(),
        }
    }

    pub fn matches_filter(&self, name: &str) -> bool {
        name.to_lowercase().contains(&self.filter.to_lowercase())
    }
}

#[cfg(windows)]
impl SecondaryIndex for ServicingRegistry {
    fn secondary_names(&self) -> Result<Vec<String>, SourceError> {
        use winreg::RegKey;
        use winreg::enums::{HKEY_LOCAL_MACHINE, KEY_READ, KEY_WOW64_64KEY};

        let registry_error = |e: std::io::Error| SourceError::Query {
            tool: "registry".to_string(),
            reason: e.to_string(),
        };

        let hklm = RegKey::predef(HKEY_LOCAL_MACHINE);
        let packages = hklm
            .open_subkey_with_flags(SERVICING_PACKAGES_KEY, KEY_READ | KEY_WOW64_64KEY)
            .map_err(registry_error)?;

        let mut names = Vec::new();
        for name in packages.enum_keys() {
            let name = name.map_err(registry_error)?;
            if self.matches_filter(&name) {
                names.push(name);
            }
        }
        Ok(names)
    }
}

#[cfg(not(windows))]
impl SecondaryIndex for ServicingRegistry {
    fn secondary_names(&self) -> Result<Vec<String>, SourceError> {
        Err(SourceError::Unsupported {
            source_name: "servicing registry",
        })
    }
}
