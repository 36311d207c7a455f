//! List command

use super::Context;
use crate::ui::Theme;
use crate::ui::table::update_table;
use anyhow::Result;
use winup_schema::{UpdateCategory, UpdateRecord};

/// Case-insensitive keyword match over title, KB and description.
pub fn matches_search(record: &UpdateRecord, needle: &str) -> bool {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    record.title.to_lowercase().contains(&needle)
        || record
            .kb
            .as_ref()
            .is_some_and(|kb| kb.to_lowercase().contains(&needle))
        || record.description.to_lowercase().contains(&needle)
}

/// Keep the records passing every filter, newest install first.
pub fn filter_records(
    records: Vec<UpdateRecord>,
    category: Option<UpdateCategory>,
    removable_only: bool,
    search: Option<&str>,
) -> Vec<UpdateRecord> {
    let mut kept: Vec<UpdateRecord> = records
        .into_iter()
        .filter(|r| category.is_none_or(|c| r.category == c))
        .filter(|r| !removable_only || r.is_removable())
        .filter(|r| search.is_none_or(|s| matches_search(r, s)))
        .collect();
    kept.sort_by(|a, b| b.installed_at.cmp(&a.installed_at));
    kept
}

/// List installed updates
pub async fn list(
    ctx: &Context,
    category: Option<UpdateCategory>,
    removable_only: bool,
    search: Option<&str>,
    json: bool,
) -> Result<()> {
    let (_, scan) = ctx.refresh(!json).await?;
    let records = filter_records(scan.records, category, removable_only, search);

    if json {
        ctx.output.wait_async().await;
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        ctx.output.info("No installed updates match.");
        ctx.output.wait_async().await;
        return Ok(());
    }

    // Drain pending status lines before printing the table
    ctx.output.wait_async().await;
    println!();
    println!("{}", update_table(&records, &Theme::default()));
    println!();
    Ok(())
}
