//! Update records and the enums describing how they are removed.

use crate::SchemaError;
use crate::kb::{BuildVersion, KbId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Broad classification of an installed update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateCategory {
    /// Cumulative, security, servicing-stack and framework updates.
    Quality,
    /// Third-party driver and firmware updates.
    Driver,
    /// Antimalware definition / security intelligence updates.
    Definition,
    /// Anything that fits none of the above.
    Other,
}

impl UpdateCategory {
    /// Human-readable name used in tables and exports.
    pub fn label(self) -> &'static str {
        match self {
            Self::Quality => "quality",
            Self::Driver => "driver",
            Self::Definition => "definition",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for UpdateCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Native mechanism able to uninstall an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UninstallMethod {
    /// Not removable.
    #[default]
    None,
    /// Servicing package removal (DISM).
    PackageManager,
    /// Driver package deletion (pnputil).
    DriverTool,
    /// Standalone update installer (wusa).
    StandaloneInstaller,
    /// Package manager first, standalone installer as fallback.
    Combined,
}

impl UninstallMethod {
    /// Short tool name shown next to an update.
    pub fn label(self) -> &'static str {
        match self {
            Self::None => "-",
            Self::PackageManager => "DISM",
            Self::DriverTool => "PnPUtil",
            Self::StandaloneInstaller => "WUSA",
            Self::Combined => "DISM/WUSA",
        }
    }
}

impl std::fmt::Display for UninstallMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-item state during a removal run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    /// Not yet attempted.
    #[default]
    Pending,
    /// Removal dispatched, waiting on the executor.
    InProgress,
    /// Removed (possibly pending a reboot).
    Success,
    /// The removal ran and did not succeed.
    Failed,
    /// The item was never dispatched.
    Skipped,
}

impl OperationStatus {
    /// Returns `true` once an item can no longer change state within a run.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Skipped)
    }
}

/// A removal mechanism together with the identity it must be given.
///
/// Both halves are set at once: a `Resolution` can only be built with a real
/// method and a non-empty target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    method: UninstallMethod,
    target: String,
}

impl Resolution {
    /// Pair a method with its target identity.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MissingMethod`] for [`UninstallMethod::None`] and
    /// [`SchemaError::EmptyTarget`] for a blank target.
    pub fn new(method: UninstallMethod, target: impl Into<String>) -> Result<Self, SchemaError> {
        let target = target.into();
        if method == UninstallMethod::None {
            return Err(SchemaError::MissingMethod);
        }
        if target.trim().is_empty() {
            return Err(SchemaError::EmptyTarget);
        }
        Ok(Self { method, target })
    }

    /// The assigned mechanism.
    pub fn method(&self) -> UninstallMethod {
        self.method
    }

    /// Package identity, inf name or KB identifier, depending on the method.
    pub fn target(&self) -> &str {
        &self.target
    }
}

/// Driver metadata copied from the matched inventory entry for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverDetails {
    /// Driver provider, e.g. `Intel`.
    pub provider: String,
    /// Device class, e.g. `Display`.
    pub class_name: String,
    /// Version and date string as reported by the driver store.
    pub version: String,
}

/// One installed update taken from the update history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRecord {
    /// Update title as reported by the history source.
    pub title: String,
    /// Knowledge-base article, when the title carries one.
    pub kb: Option<KbId>,
    /// When the update was installed.
    pub installed_at: DateTime<Utc>,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Broad classification.
    pub category: UpdateCategory,
    /// Build version embedded in the title, e.g. `26100.7623`.
    pub build_version: Option<BuildVersion>,
    /// Support link from the history source.
    #[serde(default)]
    pub support_url: String,
    /// Opaque update identifier from the history source.
    #[serde(default)]
    pub update_id: String,
    /// Most recently installed quality update of this refresh.
    #[serde(default)]
    pub is_latest_security: bool,
    /// Driver details, only for matched driver updates.
    #[serde(default)]
    pub driver: Option<DriverDetails>,
    #[serde(default)]
    resolution: Option<Resolution>,
    #[serde(default)]
    status: OperationStatus,
    #[serde(default)]
    status_message: String,
}

impl UpdateRecord {
    /// Create an unresolved record in the `Pending` state.
    pub fn new(
        title: impl Into<String>,
        installed_at: DateTime<Utc>,
        category: UpdateCategory,
    ) -> Self {
        Self {
            title: title.into(),
            kb: None,
            installed_at,
            description: String::new(),
            category,
            build_version: None,
            support_url: String::new(),
            update_id: String::new(),
            is_latest_security: false,
            driver: None,
            resolution: None,
            status: OperationStatus::Pending,
            status_message: String::new(),
        }
    }

    /// Attach a KB identifier.
    pub fn with_kb(mut self, kb: KbId) -> Self {
        self.kb = Some(kb);
        self
    }

    /// Attach a build version.
    pub fn with_build_version(mut self, version: BuildVersion) -> Self {
        self.build_version = Some(version);
        self
    }

    /// Attach a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Whether a removal mechanism has been resolved.
    pub fn is_removable(&self) -> bool {
        self.resolution.is_some()
    }

    /// The resolved mechanism, or [`UninstallMethod::None`].
    pub fn method(&self) -> UninstallMethod {
        self.resolution
            .as_ref()
            .map_or(UninstallMethod::None, Resolution::method)
    }

    /// The resolved target identity, if any.
    pub fn target(&self) -> Option<&str> {
        self.resolution.as_ref().map(Resolution::target)
    }

    /// The full resolution, if any.
    pub fn resolution(&self) -> Option<&Resolution> {
        self.resolution.as_ref()
    }

    /// Assign a mechanism and target in one step.
    pub fn resolve_to(&mut self, resolution: Resolution) {
        self.resolution = Some(resolution);
    }

    /// Mark the record as not removable, dropping any driver details.
    pub fn clear_resolution(&mut self) {
        self.resolution = None;
        self.driver = None;
    }

    /// Replace the target identity while keeping the mechanism.
    ///
    /// Used when a fallback removal succeeds against a substitute package.
    /// Does nothing for an unresolved record or a blank target.
    pub fn retarget(&mut self, target: &str) {
        let Some(method) = self.resolution.as_ref().map(Resolution::method) else {
            return;
        };
        if let Ok(next) = Resolution::new(method, target) {
            self.resolution = Some(next);
        }
    }

    /// Current run status.
    pub fn status(&self) -> OperationStatus {
        self.status
    }

    /// Message attached to the last status change.
    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    /// Update the run status and its message together.
    pub fn set_status(&mut self, status: OperationStatus, message: impl Into<String>) {
        self.status = status;
        self.status_message = message.into();
    }

    /// Short label for logs: `KB5034441 (22631.3007)` or the title.
    pub fn label(&self) -> String {
        match (&self.kb, &self.build_version) {
            (Some(kb), Some(v)) => format!("{kb} ({v})"),
            (Some(kb), None) => kb.to_string(),
            (None, Some(v)) => format!("{} ({v})", self.title),
            (None, None) => self.title.clone(),
        }
    }
}
