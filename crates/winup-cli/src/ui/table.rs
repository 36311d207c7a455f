//! Static update listing rendered with comfy-table.

use super::theme::{Theme, truncate};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use winup_schema::{UninstallMethod, UpdateRecord};

/// Build the listing table for `records`, one row each, in the order given.
pub fn update_table(records: &[UpdateRecord], theme: &Theme) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "", "KB", "Title", "Category", "Installed", "Method", "Target",
        ]);

    for record in records {
        let latest = if record.is_latest_security {
            Cell::new(theme.icons.latest).fg(Color::Yellow)
        } else {
            Cell::new("")
        };
        let kb = record.kb.as_ref().map_or("-", |kb| kb.as_str());
        let method = record.method();
        let method_cell = match method {
            UninstallMethod::None => Cell::new(method.label()).fg(Color::DarkGrey),
            _ => Cell::new(method.label()).fg(Color::Green),
        };

        table.add_row(vec![
            latest,
            Cell::new(kb),
            Cell::new(truncate(&record.title, theme.layout.title_width)),
            Cell::new(record.category.label()),
            Cell::new(record.installed_at.format("%Y-%m-%d").to_string()),
            method_cell,
            Cell::new(record.target().unwrap_or("-")),
        ]);
    }

    table
}
