//! Export command

use super::Context;
use crate::ExportFormat;
use anyhow::{Context as _, Result};
use std::fmt::Write as _;
use std::path::Path;
use winup_schema::{UpdateCategory, UpdateRecord};

/// Byte-order mark so spreadsheet tools detect UTF-8.
const UTF8_BOM: &str = "\u{feff}";

fn escape_csv(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render records as CSV, one row per update.
pub fn to_csv(records: &[UpdateRecord]) -> String {
    let mut out = String::from(UTF8_BOM);
    out.push_str("KB,Title,Category,Installed,Method,Target,Build,Description\n");

    for r in records {
        let fields = [
            r.kb.as_ref().map_or_else(String::new, ToString::to_string),
            r.title.clone(),
            r.category.label().to_string(),
            r.installed_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            r.method().label().to_string(),
            r.target().unwrap_or_default().to_string(),
            r.build_version
                .as_ref()
                .map_or_else(String::new, ToString::to_string),
            r.description.clone(),
        ];
        let row: Vec<String> = fields.iter().map(|f| escape_csv(f)).collect();
        let _ = writeln!(out, "{}", row.join(","));
    }
    out
}

/// Render a plain-text report: one block per category, newest first.
pub fn to_text(records: &[UpdateRecord], exported_at: &str) -> String {
    const RULE: &str = "================================================================";

    let mut out = String::new();
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "  Installed Windows updates");
    let _ = writeln!(out, "  Exported: {exported_at}");
    let _ = writeln!(out, "{RULE}");

    for category in [
        UpdateCategory::Quality,
        UpdateCategory::Driver,
        UpdateCategory::Definition,
        UpdateCategory::Other,
    ] {
        let mut group: Vec<&UpdateRecord> =
            records.iter().filter(|r| r.category == category).collect();
        if group.is_empty() {
            continue;
        }
        group.sort_by(|a, b| b.installed_at.cmp(&a.installed_at));

        let _ = writeln!(out, "\n-- {} ({}) --\n", category.label(), group.len());
        for (i, r) in group.iter().enumerate() {
            let _ = writeln!(out, "  [{:03}] {}", i + 1, r.title);
            if let Some(kb) = &r.kb {
                let _ = writeln!(out, "        KB:        {kb}");
            }
            let _ = writeln!(out, "        Installed: {}", r.installed_at.format("%Y-%m-%d %H:%M"));
            let _ = writeln!(out, "        Method:    {}", r.method().label());
            if let Some(version) = &r.build_version {
                let _ = writeln!(out, "        Build:     {version}");
            }
            out.push('\n');
        }
    }

    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "  Total: {} update(s)", records.len());
    out
}

/// Export the current update list
pub async fn export(ctx: &Context, path: &Path, format: ExportFormat) -> Result<()> {
    let (_, scan) = ctx.refresh(true).await?;

    let body = match format {
        ExportFormat::Csv => to_csv(&scan.records),
        ExportFormat::Json => serde_json::to_string_pretty(&scan.records)?,
        ExportFormat::Text => to_text(
            &scan.records,
            &chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        ),
    };
    std::fs::write(path, body).with_context(|| format!("Failed to write {}", path.display()))?;

    ctx.output.success(&format!(
        "Exported {} update(s) to {}",
        scan.records.len(),
        path.display()
    ));
    ctx.output.wait_async().await;
    Ok(())
}
