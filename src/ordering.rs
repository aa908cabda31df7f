// SPDX-License-Identifier: PMPL-1.0-or-later

//! Deterministic finding order

use crate::types::{EnforcedDependencyRange, InvalidDependency};

/// Stable sort that computes each element's key exactly once. Equal keys
/// keep their discovery order.
pub fn sort_map<T, K, F>(items: &mut Vec<T>, key: F)
where
    F: Fn(&T) -> K,
    K: Ord,
{
    let mut keyed: Vec<(K, T)> = items.drain(..).map(|item| (key(&item), item)).collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    items.extend(keyed.into_iter().map(|(_, item)| item));
}

/// Package first so each package's findings stay contiguous, concrete
/// ranges before must-not-depend entries, dependency name last.
pub fn sort_enforced(findings: &mut Vec<EnforcedDependencyRange>) {
    sort_map(findings, |finding| {
        (
            finding.package_name.clone(),
            finding.dependency_range.is_none(),
            finding.dependency_name.clone(),
        )
    });
}

pub fn sort_invalid(findings: &mut Vec<InvalidDependency>) {
    sort_map(findings, |finding| {
        (finding.package_name.clone(), finding.dependency_name.clone())
    });
}
