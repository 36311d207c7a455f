//! Removal orchestration: dispatch, exit-code classification and fallback.
//!
//! The orchestrator picks the executor for a record's mechanism, turns the
//! tool's exit code into a [`Verdict`], and applies exactly one fallback: when
//! the standalone installer rejects an update's format, the build version is
//! used to look up a substitute package that the package manager can remove.

use crate::exec::{ExecOutput, Executors, Invocation, RemovalExecutor};
use crate::sources::SecondaryIndex;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use winup_schema::{BuildVersion, KbId, UninstallMethod, UpdateRecord, find_containing};

/// Exit codes the orchestrator understands.
pub mod codes {
    pub const SUCCESS: i32 = 0;
    /// `ERROR_SUCCESS_REBOOT_REQUIRED`
    pub const REBOOT_REQUIRED: i32 = 3010;
    /// `ERROR_INVALID_PARAMETER`; wusa cannot handle this update format.
    pub const UNSUPPORTED_FORMAT: i32 = 87;
    /// `CBS_E_NOT_FOUND`
    pub const PACKAGE_NOT_FOUND: u32 = 0x800F_0825;
    /// `ERROR_FILE_NOT_FOUND` as an HRESULT.
    pub const UPDATE_NOT_FOUND: u32 = 0x8007_0002;
    /// `E_ACCESSDENIED`
    pub const ACCESS_DENIED: u32 = 0x8007_0005;
    /// `WU_E_NOT_APPLICABLE`
    pub const NOT_APPLICABLE: u32 = 0x8024_0017;
    /// `WU_E_TOOMANYUPDATES`, reported for updates that are gone or do not apply.
    pub const ALREADY_REMOVED: u32 = 0x8024_0006;
}

/// Final outcome of one removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub success: bool,
    pub message: String,
    /// A restart is needed before the removal takes full effect.
    pub reboot_required: bool,
}

impl Verdict {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            reboot_required: false,
        }
    }

    pub fn reboot(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            reboot_required: true,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            reboot_required: false,
        }
    }

    fn prefixed(mut self, prefix: &str) -> Self {
        self.message = format!("{prefix} {}", self.message);
        self
    }
}

enum StandaloneOutcome {
    Done(Verdict),
    UnsupportedFormat,
}

fn hex(code: i32) -> String {
    format!("0x{:08X}", code as u32)
}

fn with_output(message: String, output: &str) -> String {
    let output = output.trim();
    if output.is_empty() {
        message
    } else {
        format!("{message}\n{output}")
    }
}

fn unexpected(tool: &str, out: &ExecOutput) -> Verdict {
    Verdict::failure(with_output(
        format!(
            "{tool} failed with exit code {} ({})",
            out.exit_code,
            hex(out.exit_code)
        ),
        &out.output,
    ))
}

/// Package manager: success, reboot pending, package not found, anything else.
pub fn classify_package_manager(tool: &str, out: &ExecOutput) -> Verdict {
    match out.exit_code {
        codes::SUCCESS => Verdict::success("package removed"),
        codes::REBOOT_REQUIRED => Verdict::reboot("package removed; restart required to finish"),
        code if code as u32 == codes::PACKAGE_NOT_FOUND => {
            Verdict::failure(format!("package not found ({})", hex(code)))
        }
        _ => unexpected(tool, out),
    }
}

/// Driver tool: the exit code alone decides.
pub fn classify_driver_tool(tool: &str, out: &ExecOutput) -> Verdict {
    match out.exit_code {
        codes::SUCCESS => Verdict::success("driver package deleted"),
        codes::REBOOT_REQUIRED => {
            Verdict::reboot("driver package deleted; restart required to finish")
        }
        _ => unexpected(tool, out),
    }
}

fn classify_standalone(tool: &str, out: &ExecOutput) -> StandaloneOutcome {
    let verdict = match out.exit_code {
        codes::SUCCESS => Verdict::success("update uninstalled"),
        codes::REBOOT_REQUIRED => Verdict::reboot("update uninstalled; restart required to finish"),
        codes::UNSUPPORTED_FORMAT => return StandaloneOutcome::UnsupportedFormat,
        code => match code as u32 {
            codes::UPDATE_NOT_FOUND | codes::PACKAGE_NOT_FOUND => {
                Verdict::failure(format!("update not found ({})", hex(code)))
            }
            codes::NOT_APPLICABLE => Verdict::failure(format!(
                "update is not applicable to this system ({})",
                hex(code)
            )),
            codes::ALREADY_REMOVED => Verdict::failure(format!(
                "update is not applicable or already removed ({})",
                hex(code)
            )),
            codes::ACCESS_DENIED => Verdict::failure(format!(
                "access denied ({}); run as administrator",
                hex(code)
            )),
            _ => unexpected(tool, out),
        },
    };
    StandaloneOutcome::Done(verdict)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Runs removals for resolved records.
pub struct Orchestrator {
    executors: Executors,
    secondary: Arc<dyn SecondaryIndex>,
    standalone_timeout: Duration,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("executors", &self.executors)
            .field("standalone_timeout", &self.standalone_timeout)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    pub fn new(executors: Executors, secondary: Arc<dyn SecondaryIndex>) -> Self {
        Self {
            executors,
            secondary,
            standalone_timeout: crate::DEFAULT_STANDALONE_TIMEOUT,
        }
    }

    pub fn with_standalone_timeout(mut self, timeout: Duration) -> Self {
        self.standalone_timeout = timeout;
        self
    }

    /// Remove one record with its resolved mechanism.
    ///
    /// Never panics and never returns an error: executor failures, timeouts and
    /// panics all end up as a failed [`Verdict`]. A successful fallback updates
    /// the record's target to the substitute package.
    pub fn remove(&self, record: &mut UpdateRecord) -> Verdict {
        let Some(resolution) = record.resolution().cloned() else {
            return Verdict::failure("no removal method resolved");
        };
        info!(
            "removing {} via {} ({})",
            record.label(),
            resolution.method(),
            resolution.target()
        );

        let verdict = match resolution.method() {
            UninstallMethod::DriverTool => self.remove_driver(resolution.target()),
            UninstallMethod::PackageManager => self.remove_package(resolution.target()),
            UninstallMethod::StandaloneInstaller => self.remove_standalone(record),
            UninstallMethod::Combined => self.remove_combined(record, resolution.target()),
            UninstallMethod::None => Verdict::failure("unsupported removal method"),
        };

        if !verdict.success {
            warn!("{}: {}", record.label(), verdict.message);
        }
        verdict
    }

    fn run(
        &self,
        executor: &dyn RemovalExecutor,
        invocation: &Invocation,
    ) -> Result<ExecOutput, Verdict> {
        match catch_unwind(AssertUnwindSafe(|| executor.execute(invocation))) {
            Ok(Ok(out)) => Ok(out),
            Ok(Err(e)) => Err(Verdict::failure(e.to_string())),
            Err(payload) => Err(Verdict::failure(format!(
                "{} crashed: {}",
                executor.tool(),
                panic_message(payload.as_ref())
            ))),
        }
    }

    fn remove_driver(&self, inf_name: &str) -> Verdict {
        let executor = self.executors.driver_tool.as_ref();
        match self.run(executor, &Invocation::new(inf_name)) {
            Ok(out) => classify_driver_tool(executor.tool(), &out),
            Err(verdict) => verdict,
        }
    }

    fn remove_package(&self, identity: &str) -> Verdict {
        let executor = self.executors.package_manager.as_ref();
        match self.run(executor, &Invocation::new(identity)) {
            Ok(out) => classify_package_manager(executor.tool(), &out),
            Err(verdict) => verdict,
        }
    }

    fn remove_standalone(&self, record: &mut UpdateRecord) -> Verdict {
        let kb = record
            .kb
            .clone()
            .or_else(|| record.target().and_then(|t| KbId::parse(t).ok()));
        let Some(kb) = kb else {
            return Verdict::failure("no KB identifier for the standalone installer");
        };

        let executor = self.executors.standalone.as_ref();
        let invocation = Invocation::new(kb.as_str()).with_timeout(self.standalone_timeout);
        let out = match self.run(executor, &invocation) {
            Ok(out) => out,
            Err(verdict) => return verdict,
        };

        match classify_standalone(executor.tool(), &out) {
            StandaloneOutcome::Done(verdict) => verdict,
            StandaloneOutcome::UnsupportedFormat => self.substitute_package(record),
        }
    }

    /// Retry through the package manager against a secondary package that
    /// carries the record's build fragment.
    fn substitute_package(&self, record: &mut UpdateRecord) -> Verdict {
        const REJECTED: &str = "the standalone installer does not support this update format";

        let Some(fragment) = record
            .build_version
            .as_ref()
            .and_then(BuildVersion::minor_fragment)
        else {
            return Verdict::failure(format!(
                "{REJECTED}, and without a build version no substitute package can be found"
            ));
        };

        let names = self.secondary.secondary_names().unwrap_or_else(|e| {
            warn!("secondary package index unavailable: {e}");
            Vec::new()
        });
        let Some(name) = find_containing(&names, &fragment).map(str::to_string) else {
            return Verdict::failure(format!(
                "{REJECTED}, and no substitute package contains {fragment}"
            ));
        };

        info!("{}: retrying through the package manager as {name}", record.label());
        let verdict = self.remove_package(&name);
        if verdict.success {
            record.retarget(&name);
        }
        Verdict {
            message: format!("{REJECTED}; substitute {name}: {}", verdict.message),
            ..verdict
        }
    }

    fn remove_combined(&self, record: &mut UpdateRecord, target: &str) -> Verdict {
        // A KB target means no package identity was resolved.
        if KbId::parse(target).is_err() {
            let verdict = self.remove_package(target);
            if verdict.success {
                return verdict.prefixed("(package manager)");
            }
            info!(
                "{}: package manager failed, trying the standalone installer",
                record.label()
            );
        }
        self.remove_standalone(record)
            .prefixed("(standalone installer)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::ExecError;
    use crate::test_support::{ScriptedExecutor, Step};
    use chrono::Utc;
    use winup_schema::{InventorySnapshot, Resolution, UpdateCategory};

    const ROLLUP: &str = "Package_for_RollupFix~31bf3856ad364e35~amd64~~26100.7623.1.20";

    struct Harness {
        dism: Arc<ScriptedExecutor>,
        pnputil: Arc<ScriptedExecutor>,
        wusa: Arc<ScriptedExecutor>,
        orchestrator: Orchestrator,
    }

    fn harness(
        dism: ScriptedExecutor,
        pnputil: ScriptedExecutor,
        wusa: ScriptedExecutor,
        secondary: &[&str],
    ) -> Harness {
        let dism = Arc::new(dism);
        let pnputil = Arc::new(pnputil);
        let wusa = Arc::new(wusa);
        let index = InventorySnapshot {
            secondary_names: secondary.iter().map(|s| (*s).to_string()).collect(),
            ..Default::default()
        };
        let orchestrator = Orchestrator::new(
            Executors {
                package_manager: dism.clone(),
                driver_tool: pnputil.clone(),
                standalone: wusa.clone(),
            },
            Arc::new(index),
        )
        .with_standalone_timeout(Duration::from_secs(42));
        Harness {
            dism,
            pnputil,
            wusa,
            orchestrator,
        }
    }

    fn default_harness(secondary: &[&str]) -> Harness {
        harness(
            ScriptedExecutor::new("DISM"),
            ScriptedExecutor::new("PnPUtil"),
            ScriptedExecutor::new("WUSA"),
            secondary,
        )
    }

    fn record(method: UninstallMethod, target: &str, build: Option<&str>) -> UpdateRecord {
        let mut record = UpdateRecord::new("Cumulative Update", Utc::now(), UpdateCategory::Quality)
            .with_kb(KbId::parse("KB5074109").unwrap());
        record.build_version = build.map(BuildVersion::new);
        record.resolve_to(Resolution::new(method, target).unwrap());
        record
    }

    #[test]
    fn test_package_manager_codes() {
        let h = harness(
            ScriptedExecutor::new("DISM")
                .on("reboot", Step::Exit(3010, ""))
                .on("missing", Step::Exit(0x800F_0825_u32 as i32, ""))
                .on("broken", Step::Exit(5, " Error: 5\r\n Access is denied. \r\n")),
            ScriptedExecutor::new("PnPUtil"),
            ScriptedExecutor::new("WUSA"),
            &[],
        );

        let ok = h
            .orchestrator
            .remove(&mut record(UninstallMethod::PackageManager, "fine", None));
        assert!(ok.success && !ok.reboot_required);

        let reboot = h
            .orchestrator
            .remove(&mut record(UninstallMethod::PackageManager, "reboot", None));
        assert!(reboot.success && reboot.reboot_required);

        let missing = h
            .orchestrator
            .remove(&mut record(UninstallMethod::PackageManager, "missing", None));
        assert!(!missing.success);
        assert_eq!(missing.message, "package not found (0x800F0825)");

        let broken = h
            .orchestrator
            .remove(&mut record(UninstallMethod::PackageManager, "broken", None));
        assert!(!broken.success);
        assert_eq!(
            broken.message,
            "DISM failed with exit code 5 (0x00000005)\nError: 5\r\n Access is denied."
        );

        assert!(h.wusa.calls().is_empty());
    }

    #[test]
    fn test_driver_tool_uses_single_executor() {
        let h = default_harness(&[]);
        let verdict = h
            .orchestrator
            .remove(&mut record(UninstallMethod::DriverTool, "oem12.inf", None));

        assert!(verdict.success);
        assert_eq!(h.pnputil.targets(), vec!["oem12.inf"]);
        assert!(h.dism.calls().is_empty());
        assert!(h.wusa.calls().is_empty());
    }

    #[test]
    fn test_standalone_passes_kb_and_timeout() {
        let h = default_harness(&[]);
        let verdict = h.orchestrator.remove(&mut record(
            UninstallMethod::StandaloneInstaller,
            "KB5074109",
            None,
        ));

        assert!(verdict.success);
        let calls = h.wusa.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].target, "KB5074109");
        assert_eq!(calls[0].timeout, Some(Duration::from_secs(42)));
    }

    #[test]
    fn test_standalone_specific_codes() {
        for (code, expected) in [
            (0x8024_0017_u32, "not applicable to this system"),
            (0x8024_0006, "already removed"),
            (0x8007_0005, "access denied"),
            (0x8007_0002, "update not found"),
        ] {
            let h = harness(
                ScriptedExecutor::new("DISM"),
                ScriptedExecutor::new("PnPUtil"),
                ScriptedExecutor::new("WUSA").otherwise(Step::Exit(code as i32, "")),
                &[ROLLUP],
            );
            let verdict = h.orchestrator.remove(&mut record(
                UninstallMethod::StandaloneInstaller,
                "KB5074109",
                Some("26200.7623"),
            ));
            assert!(!verdict.success);
            assert!(verdict.message.contains(expected), "{}", verdict.message);
            assert!(h.dism.calls().is_empty());
        }
    }

    #[test]
    fn test_standalone_timeout_is_a_failure() {
        let h = harness(
            ScriptedExecutor::new("DISM"),
            ScriptedExecutor::new("PnPUtil"),
            ScriptedExecutor::new("WUSA")
                .otherwise(Step::Fail(ExecError::Timeout(Duration::from_secs(42)))),
            &[ROLLUP],
        );
        let verdict = h.orchestrator.remove(&mut record(
            UninstallMethod::StandaloneInstaller,
            "KB5074109",
            Some("26200.7623"),
        ));

        assert!(!verdict.success);
        assert!(verdict.message.contains("timed out after 42s"));
        assert!(h.dism.calls().is_empty());
    }

    #[test]
    fn test_unsupported_format_falls_back_and_retargets() {
        let h = harness(
            ScriptedExecutor::new("DISM"),
            ScriptedExecutor::new("PnPUtil"),
            ScriptedExecutor::new("WUSA").otherwise(Step::Exit(87, "")),
            &["Package_for_RollupFix~~26100.1000.1.1", ROLLUP],
        );
        let mut rec = record(
            UninstallMethod::StandaloneInstaller,
            "KB5074109",
            Some("26200.7623"),
        );

        let verdict = h.orchestrator.remove(&mut rec);

        assert!(verdict.success);
        assert_eq!(h.wusa.calls().len(), 1);
        assert_eq!(h.dism.targets(), vec![ROLLUP]);
        assert_eq!(rec.target(), Some(ROLLUP));
        assert_eq!(rec.method(), UninstallMethod::StandaloneInstaller);
    }

    #[test]
    fn test_fallback_verdict_is_the_package_manager_verdict() {
        let h = harness(
            ScriptedExecutor::new("DISM").otherwise(Step::Exit(0x800F_0825_u32 as i32, "")),
            ScriptedExecutor::new("PnPUtil"),
            ScriptedExecutor::new("WUSA").otherwise(Step::Exit(87, "")),
            &[ROLLUP],
        );
        let mut rec = record(
            UninstallMethod::StandaloneInstaller,
            "KB5074109",
            Some("26200.7623"),
        );

        let verdict = h.orchestrator.remove(&mut rec);

        assert!(!verdict.success);
        assert!(verdict.message.contains("package not found"));
        assert_eq!(rec.target(), Some("KB5074109"));
    }

    #[test]
    fn test_unsupported_format_without_substitute() {
        let h = harness(
            ScriptedExecutor::new("DISM"),
            ScriptedExecutor::new("PnPUtil"),
            ScriptedExecutor::new("WUSA").otherwise(Step::Exit(87, "")),
            &["Package_for_RollupFix~~26100.1000.1.1"],
        );

        let mut no_match = record(
            UninstallMethod::StandaloneInstaller,
            "KB5074109",
            Some("26200.7623"),
        );
        let verdict = h.orchestrator.remove(&mut no_match);
        assert!(!verdict.success);
        assert!(verdict.message.contains("does not support this update format"));
        assert!(verdict.message.contains(".7623."));

        let mut no_build = record(UninstallMethod::StandaloneInstaller, "KB5074109", None);
        let verdict = h.orchestrator.remove(&mut no_build);
        assert!(!verdict.success);
        assert!(verdict.message.contains("without a build version"));

        assert!(h.dism.calls().is_empty());
    }

    #[test]
    fn test_combined_package_manager_success_skips_standalone() {
        let h = default_harness(&[]);
        let verdict = h
            .orchestrator
            .remove(&mut record(UninstallMethod::Combined, "Package_for_KB5074109~x", None));

        assert!(verdict.success);
        assert!(verdict.message.starts_with("(package manager)"));
        assert!(h.wusa.calls().is_empty());
    }

    #[test]
    fn test_combined_falls_through_to_standalone() {
        let h = harness(
            ScriptedExecutor::new("DISM").otherwise(Step::Exit(1, "")),
            ScriptedExecutor::new("PnPUtil"),
            ScriptedExecutor::new("WUSA"),
            &[],
        );
        let verdict = h
            .orchestrator
            .remove(&mut record(UninstallMethod::Combined, "Package_for_KB5074109~x", None));

        assert!(verdict.success);
        assert!(verdict.message.starts_with("(standalone installer)"));
        assert_eq!(h.dism.calls().len(), 1);
        assert_eq!(h.wusa.targets(), vec!["KB5074109"]);
    }

    #[test]
    fn test_combined_without_package_identity_goes_straight_to_standalone() {
        let h = default_harness(&[]);
        let verdict = h
            .orchestrator
            .remove(&mut record(UninstallMethod::Combined, "KB5074109", None));

        assert!(verdict.message.starts_with("(standalone installer)"));
        assert!(h.dism.calls().is_empty());
    }

    #[test]
    fn test_executor_errors_and_panics_become_failures() {
        let h = harness(
            ScriptedExecutor::new("DISM").otherwise(Step::Panic("boom")),
            ScriptedExecutor::new("PnPUtil").otherwise(Step::Fail(ExecError::Spawn {
                tool: "pnputil".into(),
                reason: "not found".into(),
            })),
            ScriptedExecutor::new("WUSA"),
            &[],
        );

        let crashed = h
            .orchestrator
            .remove(&mut record(UninstallMethod::PackageManager, "pkg", None));
        assert!(!crashed.success);
        assert_eq!(crashed.message, "DISM crashed: boom");

        let unstarted = h
            .orchestrator
            .remove(&mut record(UninstallMethod::DriverTool, "oem1.inf", None));
        assert!(!unstarted.success);
        assert_eq!(unstarted.message, "could not start pnputil: not found");
    }

    #[test]
    fn test_unresolved_record_is_rejected() {
        let h = default_harness(&[]);
        let mut rec = UpdateRecord::new("x", Utc::now(), UpdateCategory::Other);
        assert!(!h.orchestrator.remove(&mut rec).success);
    }
}
