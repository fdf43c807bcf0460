//! Kind identifiers and kind families.
//!
//! A [`GroupVersionKind`] names one schema version of a resource. Every
//! identifier sharing `(group, kind)` belongs to the same [`KindFamily`].
//!
//! ## Version Priority
//!
//! Versions inside a family sort the way the Kubernetes API server sorts them:
//!
//! ```text
//! v10 > v2 > v1 > v11beta2 > v10beta3 > v3beta1 > v12alpha1 > v11alpha2 > foo1 > foo10
//! ```
//!
//! GA versions come first, then beta, then alpha, each by descending major and
//! minor number. Anything that does not look like a Kubernetes version sorts
//! last, lexically.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

use crate::error::SchemeError;

/// A `group/version` pair, as carried by `apiVersion`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupVersion {
    /// API group. Empty for the core group.
    pub group: String,
    /// Version within the group.
    pub version: String,
}

impl GroupVersion {
    /// Create a group version.
    pub fn new(group: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
        }
    }

    /// Parse an `apiVersion` string (`"group/version"` or `"version"`).
    pub fn parse(api_version: &str) -> Result<Self, SchemeError> {
        let invalid = |reason: &str| SchemeError::InvalidApiVersion {
            api_version: api_version.to_string(),
            reason: reason.to_string(),
        };

        if api_version.is_empty() {
            return Err(invalid("empty apiVersion"));
        }

        match api_version.split_once('/') {
            None => Ok(Self::new("", api_version)),
            Some((group, version)) => {
                if version.contains('/') {
                    return Err(invalid("more than one '/'"));
                }
                if group.is_empty() || version.is_empty() {
                    return Err(invalid("empty group or version segment"));
                }
                Ok(Self::new(group, version))
            }
        }
    }

    /// Render back to `apiVersion` form.
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    /// Attach a kind to this group version.
    pub fn with_kind(&self, kind: impl Into<String>) -> GroupVersionKind {
        GroupVersionKind::new(self.group.clone(), self.version.clone(), kind)
    }
}

impl fmt::Display for GroupVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.api_version())
    }
}

/// Kind identifier: one schema version of a logical resource.
///
/// Equality is exact, case-sensitive comparison of all three components.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupVersionKind {
    /// API group. Empty for the core group.
    pub group: String,
    /// Schema version.
    pub version: String,
    /// Resource kind (e.g. `ExternalJob`).
    pub kind: String,
}

impl GroupVersionKind {
    /// Create a kind identifier.
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// Build an identifier from an `apiVersion` and a `kind`.
    pub fn from_api_version_and_kind(api_version: &str, kind: &str) -> Result<Self, SchemeError> {
        if kind.is_empty() {
            return Err(SchemeError::InvalidKind {
                gvk: Self::new("", api_version, kind),
                reason: "empty kind".to_string(),
            });
        }
        Ok(GroupVersion::parse(api_version)?.with_kind(kind))
    }

    /// The group version part.
    pub fn group_version(&self) -> GroupVersion {
        GroupVersion::new(self.group.clone(), self.version.clone())
    }

    /// The `apiVersion` string for this identifier.
    pub fn api_version(&self) -> String {
        self.group_version().api_version()
    }

    /// The family this identifier belongs to.
    pub fn family(&self) -> KindFamily {
        KindFamily::new(self.group.clone(), self.kind.clone())
    }

    /// Whether both identifiers belong to the same family.
    pub fn same_family(&self, other: &GroupVersionKind) -> bool {
        self.group == other.group && self.kind == other.kind
    }
}

impl fmt::Display for GroupVersionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, Kind={}", self.api_version(), self.kind)
    }
}

/// Orders identifiers by family, then by version priority (highest first).
impl Ord for GroupVersionKind {
    fn cmp(&self, other: &Self) -> Ordering {
        self.group
            .cmp(&other.group)
            .then_with(|| self.kind.cmp(&other.kind))
            .then_with(|| compare_version_priority(&self.version, &other.version))
    }
}

impl PartialOrd for GroupVersionKind {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// All versions of one logical resource share a family.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct KindFamily {
    /// API group.
    pub group: String,
    /// Resource kind.
    pub kind: String,
}

impl KindFamily {
    /// Create a kind family.
    pub fn new(group: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            kind: kind.into(),
        }
    }

    /// Whether the identifier is a member of this family.
    pub fn contains(&self, gvk: &GroupVersionKind) -> bool {
        self.group == gvk.group && self.kind == gvk.kind
    }
}

impl fmt::Display for KindFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            f.write_str(&self.kind)
        } else {
            write!(f, "{}/{}", self.group, self.kind)
        }
    }
}

/// Maturity level parsed from a Kubernetes-style version string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Maturity {
    Alpha,
    Beta,
    Ga,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ParsedVersion {
    major: u64,
    maturity: Maturity,
    minor: u64,
}

fn version_regex() -> &'static regex_lite::Regex {
    static RE: OnceLock<regex_lite::Regex> = OnceLock::new();
    RE.get_or_init(|| {
        regex_lite::Regex::new(r"^v([1-9][0-9]*)(?:(alpha|beta)([1-9][0-9]*))?$")
            .expect("version pattern is a valid regex")
    })
}

fn parse_version(version: &str) -> Option<ParsedVersion> {
    let caps = version_regex().captures(version)?;
    let major = caps.get(1)?.as_str().parse().ok()?;
    let (maturity, minor) = match (caps.get(2), caps.get(3)) {
        (Some(level), Some(minor)) => {
            let maturity = if level.as_str() == "alpha" {
                Maturity::Alpha
            } else {
                Maturity::Beta
            };
            (maturity, minor.as_str().parse().ok()?)
        }
        _ => (Maturity::Ga, 0),
    };
    Some(ParsedVersion { major, maturity, minor })
}

/// Compare two versions by Kubernetes priority.
///
/// Returns `Ordering::Less` when `a` has *higher* priority, so a sorted
/// slice lists the preferred version first.
pub fn compare_version_priority(a: &str, b: &str) -> Ordering {
    match (parse_version(a), parse_version(b)) {
        (Some(pa), Some(pb)) => pb
            .maturity
            .cmp(&pa.maturity)
            .then_with(|| pb.major.cmp(&pa.major))
            .then_with(|| pb.minor.cmp(&pa.minor)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}
