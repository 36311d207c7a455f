//! Identity matching: which removal mechanism can uninstall an update.
//!
//! Rules run in a fixed order and the first rule that reaches a decision wins.
//! A decision either resolves the record to a mechanism and target, or
//! declares it not removable, which also stops the chain.

use tracing::debug;
use winup_schema::{
    PackageInventoryEntry, Resolution, UninstallMethod, UpdateCategory, UpdateRecord,
    find_containing,
};

/// Inventory view the rules evaluate against.
#[derive(Debug, Clone, Copy)]
pub struct MatchContext<'a> {
    pub packages: &'a [PackageInventoryEntry],
    pub secondary_names: &'a [String],
}

/// Outcome of a rule that applies to a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleDecision {
    Resolve(Resolution),
    NotRemovable(String),
}

/// One step of the matching chain.
pub trait MatchRule: Send + Sync {
    /// Short name used in the resolution trace.
    fn name(&self) -> &'static str;

    /// `None` passes the record on to the next rule.
    fn evaluate(&self, record: &UpdateRecord, ctx: &MatchContext<'_>) -> Option<RuleDecision>;
}

/// KB number found inside a primary package identity.
#[derive(Debug, Default)]
pub struct KbNumberRule;

impl MatchRule for KbNumberRule {
    fn name(&self) -> &'static str {
        "kb-number"
    }

    fn evaluate(&self, record: &UpdateRecord, ctx: &MatchContext<'_>) -> Option<RuleDecision> {
        let number = record.kb.as_ref()?.number();
        let package = ctx
            .packages
            .iter()
            .find(|p| p.identity.to_lowercase().contains(number))?;
        Resolution::new(UninstallMethod::PackageManager, package.identity.as_str())
            .ok()
            .map(RuleDecision::Resolve)
    }
}

/// Build-version fragment found inside a secondary package name.
///
/// A record with a usable build version never falls through: without a
/// secondary match it is presumed superseded and left not removable.
#[derive(Debug, Default)]
pub struct VersionFragmentRule;

impl MatchRule for VersionFragmentRule {
    fn name(&self) -> &'static str {
        "version-fragment"
    }

    fn evaluate(&self, record: &UpdateRecord, ctx: &MatchContext<'_>) -> Option<RuleDecision> {
        let fragment = record.build_version.as_ref()?.minor_fragment()?;
        match find_containing(ctx.secondary_names, &fragment) {
            Some(name) => Resolution::new(UninstallMethod::PackageManager, name)
                .ok()
                .map(RuleDecision::Resolve),
            None => Some(RuleDecision::NotRemovable(format!(
                "no secondary package contains {fragment}; presumed superseded"
            ))),
        }
    }
}

/// Standalone installer by KB, for records without a usable build version.
#[derive(Debug, Default)]
pub struct StandaloneFallbackRule;

impl MatchRule for StandaloneFallbackRule {
    fn name(&self) -> &'static str {
        "standalone"
    }

    fn evaluate(&self, record: &UpdateRecord, _ctx: &MatchContext<'_>) -> Option<RuleDecision> {
        let has_fragment = record
            .build_version
            .as_ref()
            .and_then(winup_schema::BuildVersion::minor_fragment)
            .is_some();
        if has_fragment {
            return None;
        }
        let kb = record.kb.as_ref()?;
        Resolution::new(UninstallMethod::StandaloneInstaller, kb.as_str())
            .ok()
            .map(RuleDecision::Resolve)
    }
}

/// What happened to one record during matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchDecision {
    Resolved {
        rule: &'static str,
        method: UninstallMethod,
        target: String,
    },
    NotRemovable {
        rule: &'static str,
        reason: String,
    },
    Unresolved,
}

/// One line of the resolution trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchLog {
    pub label: String,
    pub decision: MatchDecision,
}

impl std::fmt::Display for MatchLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.decision {
            MatchDecision::Resolved {
                rule,
                method,
                target,
            } => write!(f, "{} -> {method} ({rule}): {target}", self.label),
            MatchDecision::NotRemovable { rule, reason } => {
                write!(f, "{} -> not removable ({rule}): {reason}", self.label)
            }
            MatchDecision::Unresolved => write!(f, "{} -> no removal method", self.label),
        }
    }
}

/// Ordered rule chain applied to every non-driver record.
pub struct IdentityMatcher {
    rules: Vec<Box<dyn MatchRule>>,
}

impl std::fmt::Debug for IdentityMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.rules.iter().map(|r| r.name()).collect();
        f.debug_struct("IdentityMatcher")
            .field("rules", &names)
            .finish()
    }
}

impl Default for IdentityMatcher {
    fn default() -> Self {
        Self::new(vec![
            Box::new(KbNumberRule),
            Box::new(VersionFragmentRule),
            Box::new(StandaloneFallbackRule),
        ])
    }
}

impl IdentityMatcher {
    pub fn new(rules: Vec<Box<dyn MatchRule>>) -> Self {
        Self { rules }
    }

    /// Decide one record. Any previous resolution is discarded first, so the
    /// outcome depends only on the record and the inventory.
    pub fn resolve_one(&self, record: &mut UpdateRecord, ctx: &MatchContext<'_>) -> MatchLog {
        record.clear_resolution();

        let decision = self
            .rules
            .iter()
            .find_map(|rule| rule.evaluate(record, ctx).map(|d| (rule.name(), d)));

        let decision = match decision {
            Some((rule, RuleDecision::Resolve(resolution))) => {
                let logged = MatchDecision::Resolved {
                    rule,
                    method: resolution.method(),
                    target: resolution.target().to_string(),
                };
                record.resolve_to(resolution);
                logged
            }
            Some((rule, RuleDecision::NotRemovable(reason))) => {
                MatchDecision::NotRemovable { rule, reason }
            }
            None => MatchDecision::Unresolved,
        };

        let log = MatchLog {
            label: record.label(),
            decision,
        };
        debug!("{log}");
        log
    }

    /// Resolve every non-driver record against the snapshot.
    pub fn resolve(&self, records: &mut [UpdateRecord], ctx: &MatchContext<'_>) -> Vec<MatchLog> {
        records
            .iter_mut()
            .filter(|r| r.category != UpdateCategory::Driver)
            .map(|r| self.resolve_one(r, ctx))
            .collect()
    }
}

/// Resolve non-driver records with the default rule chain.
pub fn resolve(
    records: &mut [UpdateRecord],
    packages: &[PackageInventoryEntry],
    secondary_names: &[String],
) -> Vec<MatchLog> {
    let ctx = MatchContext {
        packages,
        secondary_names,
    };
    IdentityMatcher::default().resolve(records, &ctx)
}
