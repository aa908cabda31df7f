// SPDX-License-Identifier: PMPL-1.0-or-later

//! Core type definitions for covenant
//!
//! The finding records produced by the constraint processor and the
//! dependency collection enum shared by every layer of the tool.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three dependency collections a package manifest may declare.
///
/// The variant order is the canonical enumeration order used by
/// `dependency_type/1` and the fact compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DependencyType {
    Dependencies,
    DevDependencies,
    PeerDependencies,
}

impl DependencyType {
    pub const ALL: [DependencyType; 3] = [
        DependencyType::Dependencies,
        DependencyType::DevDependencies,
        DependencyType::PeerDependencies,
    ];

    /// The manifest key for this collection, which doubles as its logic atom.
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyType::Dependencies => "dependencies",
            DependencyType::DevDependencies => "devDependencies",
            DependencyType::PeerDependencies => "peerDependencies",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "dependencies" => Some(DependencyType::Dependencies),
            "devDependencies" => Some(DependencyType::DevDependencies),
            "peerDependencies" => Some(DependencyType::PeerDependencies),
            _ => None,
        }
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dependency range a rule wants enforced on a package.
///
/// A `dependency_range` of `None` means the dependency must be absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnforcedDependencyRange {
    pub package_name: String,
    pub dependency_name: String,
    pub dependency_range: Option<String>,
    pub dependency_type: DependencyType,
}

/// A dependency a rule declares invalid outright, with an optional reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidDependency {
    pub package_name: String,
    pub dependency_name: String,
    pub dependency_type: DependencyType,
    pub reason: Option<String>,
}

/// Everything the two constraint queries produced, in reporting order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub enforced_ranges: Vec<EnforcedDependencyRange>,
    pub invalid_dependencies: Vec<InvalidDependency>,
}

impl CheckReport {
    pub fn is_empty(&self) -> bool {
        self.enforced_ranges.is_empty() && self.invalid_dependencies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_type_round_trip() {
        for ty in DependencyType::ALL {
            assert_eq!(DependencyType::parse(ty.as_str()), Some(ty));
        }
        assert_eq!(DependencyType::parse("bundledDependencies"), None);
    }

    #[test]
    fn test_dependency_type_serializes_as_manifest_key() {
        let json = serde_json::to_string(&DependencyType::PeerDependencies)
            .expect("serializing a dependency type should succeed");
        assert_eq!(json, "\"peerDependencies\"");
    }
}
