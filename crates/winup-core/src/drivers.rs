//! Pairs driver-category updates with driver-store packages.
//!
//! Matching is a substring heuristic over the update title: the first
//! inventory entry whose provider appears in the title, and whose class also
//! appears or which carries an original inf name, wins. Entries sharing a
//! provider can therefore shadow each other; inventory order decides.

use tracing::debug;
use winup_schema::{
    DriverDetails, DriverInventoryEntry, Resolution, UninstallMethod, UpdateCategory,
    UpdateRecord,
};

fn matches(title: &str, entry: &DriverInventoryEntry) -> bool {
    let provider = entry.provider.to_lowercase();
    let class = entry.class_name.to_lowercase();

    if provider.is_empty() || !title.contains(&provider) {
        return false;
    }
    (!class.is_empty() && title.contains(&class)) || !entry.original_name.is_empty()
}

/// Resolve driver-category records to their driver-store inf name.
///
/// Returns how many records were matched. Unmatched driver records are left
/// unresolved; other categories are not touched.
pub fn resolve_drivers(records: &mut [UpdateRecord], drivers: &[DriverInventoryEntry]) -> usize {
    let mut matched = 0;

    for record in records
        .iter_mut()
        .filter(|r| r.category == UpdateCategory::Driver)
    {
        record.clear_resolution();
        let title = record.title.to_lowercase();

        let Some(entry) = drivers.iter().find(|d| matches(&title, d)) else {
            debug!("{} -> no driver package", record.title);
            continue;
        };
        let Ok(resolution) = Resolution::new(UninstallMethod::DriverTool, entry.inf_name.as_str())
        else {
            continue;
        };

        debug!("{} -> {}", record.title, entry.inf_name);
        record.resolve_to(resolution);
        record.driver = Some(DriverDetails {
            provider: entry.provider.clone(),
            class_name: entry.class_name.clone(),
            version: entry.version_and_date.clone(),
        });
        matched += 1;
    }

    matched
}
