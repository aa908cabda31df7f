// SPDX-License-Identifier: PMPL-1.0-or-later

//! Native predicate bridge
//!
//! Host predicates take part in resolution by returning replacement goals
//! instead of touching the search state directly. The outer vector holds the
//! alternatives, tried in order as choice points; each inner vector is the
//! goal sequence that replaces the call. An empty outer vector fails the
//! call, an empty inner vector is a plain success. Wrong argument kinds
//! raise instantiation errors, while lookups that merely miss fail the goal
//! so enumeration can continue.

pub mod version;
pub mod workspace;

use crate::engine::{EngineError, Session};
use crate::term::{Substitution, Term};
use crate::workspace::WorkspaceInfo;
use std::collections::HashMap;
use std::sync::Arc;

/// Replacement-goal alternatives returned by a native predicate.
pub type Alternatives = Vec<Vec<Term>>;

/// A host predicate: raw arguments and the current substitution in, goal
/// alternatives or a typed error out. Predicates walk their own arguments.
pub type NativeFn = Box<dyn Fn(&[Term], &Substitution) -> Result<Alternatives, EngineError>>;

/// Host predicates keyed by name and arity.
#[derive(Default)]
pub struct NativeRegistry {
    entries: HashMap<(String, usize), NativeFn>,
}

impl NativeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: &str, arity: usize, predicate: F)
    where
        F: Fn(&[Term], &Substitution) -> Result<Alternatives, EngineError> + 'static,
    {
        self.entries
            .insert((name.to_string(), arity), Box::new(predicate));
    }

    pub fn get(&self, name: &str, arity: usize) -> Option<&NativeFn> {
        self.entries.get(&(name.to_string(), arity))
    }

    pub fn indicators(&self) -> impl Iterator<Item = &(String, usize)> {
        self.entries.keys()
    }
}

/// Rules layered over the natives so user programs get the convenient
/// surface. Installed reserved, like the natives they delegate to.
pub const DERIVED_RULES: &str = "\
package_version(PackageName, PackageVersion) :-
  package_field(PackageName, version, PackageVersion).

package_has_dependency(PackageName, DependencyName, DependencyRange, DependencyType) :-
  package(PackageName),
  dependency_type(DependencyType),
  internal_package_has_dependency(PackageName, DependencyName, DependencyRange, DependencyType).
";

/// The registry every constraint session uses: workspace lookups plus the
/// semver helpers.
pub fn standard_registry(workspace: Arc<WorkspaceInfo>) -> NativeRegistry {
    let mut registry = NativeRegistry::new();
    workspace::register(&mut registry, workspace);
    version::register(&mut registry);
    registry
}

/// A ready-to-consult session over a workspace: natives registered, derived
/// rules installed and reserved.
pub fn session_for(workspace: Arc<WorkspaceInfo>) -> Result<Session, EngineError> {
    let mut session = Session::new(standard_registry(workspace));
    session.install_reserved(DERIVED_RULES)?;
    Ok(session)
}

/// Shorthand for the `'='(lhs, rhs)` goals natives answer with.
pub(crate) fn eq(lhs: Term, rhs: Term) -> Term {
    Term::Compound("=".to_string(), vec![lhs, rhs])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup_is_keyed_by_name_and_arity() {
        let mut registry = NativeRegistry::new();
        registry.register("probe", 2, |_, _| Ok(vec![vec![]]));

        assert!(registry.get("probe", 2).is_some());
        assert!(registry.get("probe", 1).is_none());
        assert!(registry.get("other", 2).is_none());
    }

    #[test]
    fn test_derived_rules_parse() {
        let clauses =
            crate::parser::parse_program(DERIVED_RULES).expect("derived rules should parse");
        assert_eq!(clauses.len(), 2);
        assert_eq!(
            clauses[0].head.indicator(),
            Some(("package_version", 2)),
            "first derived rule should declare package_version/2"
        );
        assert_eq!(
            clauses[1].head.indicator(),
            Some(("package_has_dependency", 4)),
            "second derived rule should declare package_has_dependency/4"
        );
    }
}
