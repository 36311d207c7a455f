//! Turns raw update-history entries into fresh [`UpdateRecord`]s.
//!
//! Only successful installations are kept. Each surviving entry is classified
//! into a category, and its KB identifier and build version are pulled out of
//! the title.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use winup_schema::{BuildVersion, KbId, UpdateCategory, UpdateRecord};

/// Category id the update service uses for definition updates.
pub const DEFINITION_CATEGORY_ID: &str = "E0789628-CE08-4437-BE74-2495B842F43B";

/// History operation code for an installation.
pub const OPERATION_INSTALLATION: i32 = 1;
/// Result code for a successful operation.
pub const RESULT_SUCCEEDED: i32 = 2;
/// Result code for an operation that succeeded with errors.
pub const RESULT_SUCCEEDED_WITH_ERRORS: i32 = 3;

static KB_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)KB(\d{6,7})").expect("KB pattern is valid"));
static BUILD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((\d{5}\.\d+)\)").expect("build pattern is valid"));

const DRIVER_VENDOR_KEYWORDS: &[&str] = &[
    "nvidia",
    "intel",
    "amd",
    "realtek",
    "usb",
    "bluetooth",
    "wi-fi",
    "audio",
];

const QUALITY_KEYWORDS: &[&str] = &[
    "cumulative update",
    "security update",
    "安全更新",
    "累积更新",
    "quality",
    "servicing stack",
    ".net framework",
];

/// A category tag attached to a history entry by the update service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryHint {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub id: String,
}

/// One row of the installed-update history, as reported by the history source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawHistoryEntry {
    pub title: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub support_url: String,
    #[serde(default)]
    pub update_id: String,
    #[serde(default = "default_operation")]
    pub operation: i32,
    #[serde(default = "default_result")]
    pub result_code: i32,
    #[serde(default)]
    pub categories: Vec<CategoryHint>,
}

fn default_operation() -> i32 {
    OPERATION_INSTALLATION
}

fn default_result() -> i32 {
    RESULT_SUCCEEDED
}

impl RawHistoryEntry {
    /// A successful installation entry with no category hints.
    pub fn installed(title: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            date,
            description: String::new(),
            support_url: String::new(),
            update_id: String::new(),
            operation: OPERATION_INSTALLATION,
            result_code: RESULT_SUCCEEDED,
            categories: Vec::new(),
        }
    }

    /// Whether this entry records an installation that went through.
    pub fn is_successful_install(&self) -> bool {
        self.operation == OPERATION_INSTALLATION
            && matches!(
                self.result_code,
                RESULT_SUCCEEDED | RESULT_SUCCEEDED_WITH_ERRORS
            )
    }
}

/// First `KB` followed by six or seven digits in the title.
pub fn extract_kb(title: &str) -> Option<KbId> {
    let caps = KB_PATTERN.captures(title)?;
    KbId::parse(caps.get(1)?.as_str()).ok()
}

/// First parenthesized `<5 digits>.<digits>` token in the title.
pub fn extract_build_version(title: &str) -> Option<BuildVersion> {
    let caps = BUILD_PATTERN.captures(title)?;
    Some(BuildVersion::new(caps.get(1)?.as_str()))
}

/// Classify an entry: category hints first, then title keywords, then `Other`.
pub fn categorize(title: &str, hints: &[CategoryHint]) -> UpdateCategory {
    for hint in hints {
        let name = hint.name.to_lowercase();
        if name.contains("definition")
            || name.contains("定义")
            || hint.id.eq_ignore_ascii_case(DEFINITION_CATEGORY_ID)
        {
            return UpdateCategory::Definition;
        }
        if name.contains("driver") || name.contains("驱动") {
            return UpdateCategory::Driver;
        }
    }

    let title = title.to_lowercase();

    if title.contains("definition update")
        || title.contains("security intelligence")
        || title.contains("antimalware")
        || (title.contains("defender") && (title.contains("definition") || title.contains("定义")))
    {
        return UpdateCategory::Definition;
    }

    if title.contains("driver")
        || title.contains("firmware")
        || (title.contains(" - ") && DRIVER_VENDOR_KEYWORDS.iter().any(|k| title.contains(k)))
    {
        return UpdateCategory::Driver;
    }

    if QUALITY_KEYWORDS.iter().any(|k| title.contains(k)) {
        return UpdateCategory::Quality;
    }

    UpdateCategory::Other
}

/// Build fresh, unresolved records from history entries.
///
/// Entries that are not successful installations are dropped.
pub fn build_records(entries: &[RawHistoryEntry]) -> Vec<UpdateRecord> {
    entries
        .iter()
        .filter(|e| e.is_successful_install())
        .map(|entry| {
            let mut record = UpdateRecord::new(
                entry.title.clone(),
                entry.date,
                categorize(&entry.title, &entry.categories),
            )
            .with_description(entry.description.clone());
            record.kb = extract_kb(&entry.title);
            record.build_version = extract_build_version(&entry.title);
            record.support_url.clone_from(&entry.support_url);
            record.update_id.clone_from(&entry.update_id);
            record
        })
        .collect()
}

/// Flag the most recently installed Quality record; clears every other flag.
///
/// Ties keep the earliest record in list order.
pub fn mark_latest_security(records: &mut [UpdateRecord]) {
    let mut latest: Option<(usize, DateTime<Utc>)> = None;
    for (i, record) in records.iter_mut().enumerate() {
        record.is_latest_security = false;
        if record.category != UpdateCategory::Quality {
            continue;
        }
        if latest.is_none_or(|(_, at)| record.installed_at > at) {
            latest = Some((i, record.installed_at));
        }
    }
    if let Some((i, _)) = latest {
        records[i].is_latest_security = true;
    }
}
