//! End-to-end tests for the `winup` binary.

use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

const SNAPSHOT: &str = r#"{
  "history": [
    {
      "title": "2024-01 Cumulative Update for Windows 11 Version 23H2 for x64-based Systems (KB5034441)",
      "date": "2024-01-09T18:00:00Z",
      "categories": [{ "name": "Security Updates" }]
    },
    {
      "title": "2024-01 Cumulative Update for .NET Framework 3.5 and 4.8.1 for Windows 11 (KB5033920)",
      "date": "2024-01-10T18:00:00Z"
    },
    {
      "title": "Failed attempt (KB5000000)",
      "date": "2024-01-11T18:00:00Z",
      "result_code": 4
    }
  ],
  "inventory": {
    "packages": [
      {
        "identity": "Package_for_KB5034441~31bf3856ad364e35~amd64~~22621.3007.1.1",
        "state": "Installed"
      }
    ]
  }
}"#;

const DRIVER_SNAPSHOT: &str = r#"{
  "history": [
    { "title": "Intel - Display - 31.0.101.4502", "date": "2024-02-01T09:00:00Z" },
    { "title": "Realtek - Extension - 10.0.22000.1", "date": "2024-02-02T09:00:00Z" }
  ],
  "inventory": {
    "drivers": [
      { "inf_name": "oem12.inf", "original_name": "iigd_dch.inf", "provider": "Intel", "class_name": "Display" },
      { "inf_name": "oem3.inf", "original_name": "realtekext.inf", "provider": "Realtek", "class_name": "Extension" }
    ]
  }
}"#;

/// Test context with an isolated winup home whose tools do not exist.
struct TestContext {
    temp_dir: TempDir,
    snapshot: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        Self::with_snapshot(SNAPSHOT)
    }

    fn with_snapshot(contents: &str) -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let home = temp_dir.path().join(".winup");
        std::fs::create_dir_all(&home).expect("failed to create winup home");

        let missing = temp_dir.path().join("missing");
        let config = format!(
            "standalone_timeout_secs = 5\n\n[tools]\ndism = {:?}\nwusa = {:?}\npnputil = {:?}\npowershell = {:?}\n",
            missing.join("dism.exe"),
            missing.join("wusa.exe"),
            missing.join("pnputil.exe"),
            missing.join("powershell.exe"),
        );
        std::fs::write(home.join("config.toml"), config).expect("failed to write config");

        let snapshot = temp_dir.path().join("snapshot.json");
        std::fs::write(&snapshot, contents).expect("failed to write snapshot");

        Self { temp_dir, snapshot }
    }

    fn winup_cmd(&self) -> Command {
        let bin_path = env!("CARGO_BIN_EXE_winup");
        let mut cmd = Command::new(bin_path);
        cmd.env("HOME", self.temp_dir.path());
        cmd.env("WINUP_HOME", self.temp_dir.path().join(".winup"));
        cmd.env_remove("WINUP_SNAPSHOT");
        cmd.env_remove("RUST_LOG");
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.winup_cmd()
            .arg("--snapshot")
            .arg(&self.snapshot)
            .args(args)
            .output()
            .expect("failed to run winup")
    }
}

#[test]
fn test_help_command() {
    let ctx = TestContext::new();
    let output = ctx
        .winup_cmd()
        .arg("--help")
        .output()
        .expect("failed to run winup");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"));
}

#[test]
fn test_version_command() {
    let ctx = TestContext::new();
    let output = ctx
        .winup_cmd()
        .arg("--version")
        .output()
        .expect("failed to run winup");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("winup"));
}

#[test]
fn test_list_json_resolves_methods() {
    let ctx = TestContext::new();
    let output = ctx.run(&["list", "--json"]);
    assert!(output.status.success(), "{output:?}");

    let records: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("list --json prints JSON");
    let records = records.as_array().expect("array of records");
    // The failed install never becomes a record
    assert_eq!(records.len(), 2);

    let find = |kb: &str| {
        records
            .iter()
            .find(|r| r["kb"] == kb)
            .unwrap_or_else(|| panic!("{kb} missing"))
    };
    let rollup = find("KB5034441");
    assert_eq!(rollup["resolution"]["method"], "package_manager");
    assert_eq!(
        rollup["resolution"]["target"],
        "Package_for_KB5034441~31bf3856ad364e35~amd64~~22621.3007.1.1"
    );

    let dotnet = find("KB5033920");
    assert_eq!(dotnet["resolution"]["method"], "standalone_installer");
    assert_eq!(dotnet["resolution"]["target"], "KB5033920");
}

#[test]
fn test_list_json_search_and_order() {
    let ctx = TestContext::new();
    let output = ctx.run(&["list", "--json"]);
    let records: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    // Newest install first
    assert_eq!(records[0]["kb"], "KB5033920");
    assert_eq!(records[1]["kb"], "KB5034441");

    let output = ctx.run(&["list", "--json", "--search", ".net framework"]);
    assert!(output.status.success(), "{output:?}");
    let records: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["kb"], "KB5033920");
}

#[test]
fn test_remove_dry_run_prints_plan() {
    let ctx = TestContext::new();
    let output = ctx.run(&["remove", "KB5034441", "5033920", "--dry-run"]);
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("/Remove-Package"));
    assert!(stdout.contains("/kb:5033920"));
}

#[test]
fn test_remove_unknown_kb_is_a_no_op() {
    let ctx = TestContext::new();
    let output = ctx.run(&["remove", "KB9999999", "-y"]);
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("no installed update matches KB9999999"));
    assert!(stdout.contains("Nothing to remove"));
}

#[test]
fn test_remove_single_driver_by_inf_name() {
    let ctx = TestContext::with_snapshot(DRIVER_SNAPSHOT);
    let output = ctx.run(&["remove", "oem12.inf", "--dry-run"]);
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("/delete-driver oem12.inf"), "{stdout}");
    assert!(!stdout.contains("oem3.inf"), "{stdout}");
}

#[test]
fn test_remove_single_driver_by_title() {
    let ctx = TestContext::with_snapshot(DRIVER_SNAPSHOT);
    let output = ctx.run(&["remove", "Realtek - Extension - 10.0.22000.1", "--dry-run"]);
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("/delete-driver oem3.inf"), "{stdout}");
    assert!(!stdout.contains("oem12.inf"), "{stdout}");
}

#[test]
fn test_remove_with_missing_tool_fails_per_item() {
    let ctx = TestContext::new();
    let output = ctx.run(&["remove", "KB5034441", "-y"]);
    assert!(!output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("could not start"), "{stdout}");
    assert!(stdout.contains("RESULT"));
    assert!(stdout.contains("\"failed\":1"));
}

#[test]
fn test_scan_dump_writes_snapshot() {
    let ctx = TestContext::new();
    let dump = ctx.temp_dir.path().join("dump.json");
    let output = ctx.run(&["scan", "--dump", dump.to_str().unwrap()]);
    assert!(output.status.success(), "{output:?}");

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&dump).unwrap()).unwrap();
    assert_eq!(written["history"].as_array().unwrap().len(), 3);
    assert_eq!(written["inventory"]["packages"].as_array().unwrap().len(), 1);
}

#[test]
fn test_export_csv() {
    let ctx = TestContext::new();
    let path = ctx.temp_dir.path().join("updates.csv");
    let output = ctx.run(&["export", path.to_str().unwrap()]);
    assert!(output.status.success(), "{output:?}");

    let csv = std::fs::read_to_string(&path).unwrap();
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.contains("KB5034441"));
    assert!(csv.contains("DISM"));
}

#[test]
fn test_export_text() {
    let ctx = TestContext::new();
    let path = ctx.temp_dir.path().join("updates.txt");
    let output = ctx.run(&["export", path.to_str().unwrap(), "--format", "text"]);
    assert!(output.status.success(), "{output:?}");

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("-- quality (2) --"));
    assert!(text.contains("KB:        KB5034441"));
    assert!(text.contains("Total: 2 update(s)"));
}
