//! Remove command

use super::Context;
use crate::system::RemovalTools;
use anyhow::{Context as _, Result, bail};
use crossterm::style::Stylize;
use std::sync::Arc;
use winup_core::{BatchTally, Orchestrator, Reporter, run_batch};
use winup_schema::{KbId, UninstallMethod, UpdateCategory, UpdateRecord};

/// Which updates the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Explicit selectors, in the order given. See [`find_record`].
    Items(Vec<String>),
    /// Every removable update, optionally of one category.
    AllRemovable(Option<UpdateCategory>),
}

/// Index of the record a selector names.
///
/// A selector is a KB identifier (`KB5034441`, `5034441`), a removal target
/// such as a driver inf name (`oem12.inf`) or package identity, or a full
/// update title. Targets and titles compare case-insensitively.
pub fn find_record(records: &[UpdateRecord], selector: &str) -> Option<usize> {
    let selector = selector.trim();
    KbId::parse(selector)
        .ok()
        .and_then(|kb| records.iter().position(|r| r.kb.as_ref() == Some(&kb)))
        .or_else(|| {
            records.iter().position(|r| {
                r.target()
                    .is_some_and(|t| t.eq_ignore_ascii_case(selector))
            })
        })
        .or_else(|| {
            let title = selector.to_lowercase();
            records.iter().position(|r| r.title.to_lowercase() == title)
        })
}

/// Pick the records to remove.
///
/// Unknown, duplicate and non-removable selectors are reported through
/// `output` and left out.
pub fn select(
    records: &[UpdateRecord],
    selection: &Selection,
    output: &dyn Reporter,
) -> Vec<UpdateRecord> {
    match selection {
        Selection::AllRemovable(category) => records
            .iter()
            .filter(|r| r.is_removable())
            .filter(|r| category.is_none_or(|c| r.category == c))
            .cloned()
            .collect(),
        Selection::Items(raw) => {
            let mut picked: Vec<usize> = Vec::new();
            for arg in raw {
                let Some(index) = find_record(records, arg) else {
                    output.warning(&format!("no installed update matches {arg}"));
                    continue;
                };
                let record = &records[index];
                if !record.is_removable() {
                    output.warning(&format!(
                        "{} cannot be removed on this system",
                        record.label()
                    ));
                } else if !picked.contains(&index) {
                    picked.push(index);
                }
            }
            picked.into_iter().map(|i| records[i].clone()).collect()
        }
    }
}

/// The command(s) a removal would run, for dry runs.
pub fn plan_line(tools: &RemovalTools, record: &UpdateRecord) -> String {
    let target = record.target().unwrap_or_default();
    match record.method() {
        UninstallMethod::None => "not removable".to_string(),
        UninstallMethod::PackageManager => tools.dism.command_line(target),
        UninstallMethod::DriverTool => tools.pnputil.command_line(target),
        UninstallMethod::StandaloneInstaller => {
            let kb = record.kb.as_ref().map_or(target, KbId::as_str);
            tools.wusa.command_line(kb)
        }
        UninstallMethod::Combined => {
            let standalone = record
                .kb
                .as_ref()
                .map(|kb| tools.wusa.command_line(kb.as_str()));
            match (KbId::parse(target).is_ok(), standalone) {
                (true, Some(wusa)) => wusa,
                (false, Some(wusa)) => {
                    format!("{}, then if needed {wusa}", tools.dism.command_line(target))
                }
                (_, None) => tools.dism.command_line(target),
            }
        }
    }
}

fn confirm(selected: &[UpdateRecord]) -> Result<bool> {
    use std::io::Write;

    println!();
    for record in selected {
        println!("  {} {}", "-".dark_grey(), record.title);
    }
    if selected.iter().any(|r| r.is_latest_security) {
        println!();
        println!(
            "  {} This includes the most recent security update.",
            "WARNING:".bold().red()
        );
    }
    println!();
    print!("  Remove {} update(s)? (y/N) ", selected.len());
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

/// Remove the selected updates
pub async fn remove(ctx: &Context, selection: &Selection, yes: bool) -> Result<()> {
    let (sources, scan) = ctx.refresh(true).await?;
    let selected = select(&scan.records, selection, &ctx.output);

    if selected.is_empty() {
        ctx.output.info("Nothing to remove.");
        ctx.output.wait_async().await;
        return Ok(());
    }

    let tools = RemovalTools::new(&ctx.config);

    if ctx.dry_run {
        ctx.output.section("Removal plan (dry run)");
        for record in &selected {
            ctx.output
                .info(&format!("{}: {}", record.label(), plan_line(&tools, record)));
        }
        ctx.output.wait_async().await;
        return Ok(());
    }

    ctx.output.wait_async().await;
    if !yes && !confirm(&selected)? {
        ctx.output.error("Operation cancelled");
        ctx.output.wait_async().await;
        return Ok(());
    }

    let orchestrator = Orchestrator::new(tools.into_executors(), Arc::clone(&sources.secondary))
        .with_standalone_timeout(ctx.config.standalone_timeout());
    let reporter = ctx.output.clone();
    let mut batch = selected;

    ctx.output.section("Removing updates");
    let tally: BatchTally = tokio::task::spawn_blocking(move || {
        run_batch(&orchestrator, &reporter, &mut batch)
    })
    .await
    .context("removal batch aborted")?;

    if tally.succeeded > 0 {
        ctx.output
            .warning("Restart the computer to complete the removal.");
    }
    ctx.output.wait_async().await;

    if tally.failed > 0 {
        bail!("{} of {} update(s) could not be removed", tally.failed, tally.total());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use chrono::Utc;
    use winup_core::NullReporter;
    use winup_schema::Resolution;

    fn record(kb: &str, method: UninstallMethod, target: &str) -> UpdateRecord {
        let mut rec = UpdateRecord::new(
            format!("Update for Windows ({kb})"),
            Utc::now(),
            UpdateCategory::Quality,
        )
        .with_kb(KbId::parse(kb).unwrap());
        if method != UninstallMethod::None {
            rec.resolve_to(Resolution::new(method, target).unwrap());
        }
        rec
    }

    fn records() -> Vec<UpdateRecord> {
        vec![
            record("KB5000001", UninstallMethod::PackageManager, "Package_for_KB5000001~x"),
            record("KB5000002", UninstallMethod::None, ""),
            record("KB5000003", UninstallMethod::StandaloneInstaller, "KB5000003"),
        ]
    }

    #[test]
    fn test_select_by_kb_skips_unknown_and_unremovable() {
        let picked = select(
            &records(),
            &Selection::Items(vec![
                "5000003".into(),
                "KB5000002".into(),
                "KB9999999".into(),
                "garbage".into(),
                "kb5000003".into(),
                "KB5000001".into(),
            ]),
            &NullReporter,
        );
        let kbs: Vec<_> = picked.iter().map(|r| r.kb.clone().unwrap()).collect();
        assert_eq!(kbs, vec!["KB5000003", "KB5000001"]);
    }

    fn driver(title: &str, inf: &str) -> UpdateRecord {
        let mut rec = UpdateRecord::new(title, Utc::now(), UpdateCategory::Driver);
        rec.resolve_to(Resolution::new(UninstallMethod::DriverTool, inf).unwrap());
        rec
    }

    #[test]
    fn test_select_single_driver_by_target_or_title() {
        let mut all = records();
        all.push(driver("Intel - Display - 31.0.101.4502", "oem12.inf"));
        all.push(driver("Realtek - Extension - 10.0.1", "oem3.inf"));

        let picked = select(&all, &Selection::Items(vec!["OEM12.INF".into()]), &NullReporter);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].target(), Some("oem12.inf"));

        let picked = select(
            &all,
            &Selection::Items(vec!["realtek - extension - 10.0.1".into(), "oem3.inf".into()]),
            &NullReporter,
        );
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].target(), Some("oem3.inf"));
    }

    #[test]
    fn test_find_record_prefers_kb() {
        let all = records();
        assert_eq!(find_record(&all, "kb5000003"), Some(2));
        assert_eq!(find_record(&all, "package_for_kb5000001~x"), Some(0));
        assert_eq!(find_record(&all, "oem99.inf"), None);
    }

    #[test]
    fn test_select_all_removable_by_category() {
        let mut all = records();
        all.push({
            let mut drv = UpdateRecord::new("Intel - Display", Utc::now(), UpdateCategory::Driver);
            drv.resolve_to(Resolution::new(UninstallMethod::DriverTool, "oem3.inf").unwrap());
            drv
        });

        assert_eq!(select(&all, &Selection::AllRemovable(None), &NullReporter).len(), 3);
        let drivers = select(
            &all,
            &Selection::AllRemovable(Some(UpdateCategory::Driver)),
            &NullReporter,
        );
        assert_eq!(drivers.len(), 1);
        assert_eq!(drivers[0].target(), Some("oem3.inf"));
    }

    #[test]
    fn test_plan_lines() {
        let tools = RemovalTools::new(&Config::default());
        let all = records();

        let dism = plan_line(&tools, &all[0]);
        assert!(dism.contains("/Remove-Package"));
        assert!(dism.contains("/PackageName:Package_for_KB5000001~x"));

        let wusa = plan_line(&tools, &all[2]);
        assert!(wusa.contains("/kb:5000003"));

        let combined = record("KB5000004", UninstallMethod::Combined, "Package_for_KB5000004~x");
        let line = plan_line(&tools, &combined);
        assert!(line.contains("/PackageName:Package_for_KB5000004~x"));
        assert!(line.contains("then if needed"));
        assert!(line.contains("/kb:5000004"));
    }
}
