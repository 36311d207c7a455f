//! Knowledge-base article identifiers and build versions.

use crate::SchemaError;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

/// A normalized knowledge-base article identifier (`KB<digits>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KbId(String);

impl KbId {
    /// Parse `KB5034441`, `kb5034441` or a bare `5034441` into `KB5034441`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidKb`] if no digits remain after the
    /// optional prefix or any non-digit character is present.
    pub fn parse(raw: &str) -> Result<Self, SchemaError> {
        let trimmed = raw.trim();
        let digits = match trimmed.get(..2) {
            Some(prefix) if prefix.eq_ignore_ascii_case("kb") => &trimmed[2..],
            _ => trimmed,
        };

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SchemaError::InvalidKb(raw.to_string()));
        }

        Ok(Self(format!("KB{digits}")))
    }

    /// The bare article number without the `KB` prefix.
    pub fn number(&self) -> &str {
        &self.0[2..]
    }

    /// Return the normalized identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for KbId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Deref for KbId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for KbId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for KbId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<&str> for KbId {
    fn eq(&self, other: &&str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl TryFrom<String> for KbId {
    type Error = SchemaError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl TryFrom<&str> for KbId {
    type Error = SchemaError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<KbId> for String {
    fn from(kb: KbId) -> Self {
        kb.0
    }
}

/// Dotted build version embedded in an update title, e.g. `26100.7623`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildVersion(String);

impl BuildVersion {
    /// Create a build version from the given string (stored trimmed).
    pub fn new(v: &str) -> Self {
        Self(v.trim().to_string())
    }

    /// Search pattern used against secondary package names: `.<minor>.`.
    ///
    /// `26200.7623` yields `.7623.`, which matches a servicing package such as
    /// `Package_for_RollupFix~31bf3856ad364e35~amd64~~26100.7623.1.20`.
    /// Returns `None` when the version has no non-empty second component.
    pub fn minor_fragment(&self) -> Option<String> {
        let minor = self.0.split('.').nth(1)?;
        if minor.is_empty() {
            return None;
        }
        Some(format!(".{minor}."))
    }

    /// Return the version string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BuildVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BuildVersion {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
