// SPDX-License-Identifier: PMPL-1.0-or-later

//! Semver predicates
//!
//! `version_matches/2` tests a version against a range, `version_minimum/2`
//! binds the smallest version a range admits. Unparseable ranges or versions
//! fail the goal instead of erroring, so rules can probe loosely formatted
//! manifest data without aborting the whole run.

use crate::engine::EngineError;
use crate::natives::{eq, Alternatives, NativeRegistry};
use crate::term::{Substitution, Term};
use semver::{Comparator, Op, Version, VersionReq};

pub fn register(registry: &mut NativeRegistry) {
    registry.register("version_matches", 2, version_matches);
    registry.register("version_minimum", 2, version_minimum);
}

fn version_matches(args: &[Term], subst: &Substitution) -> Result<Alternatives, EngineError> {
    let [range_arg, version_arg] = args else {
        return Err(EngineError::instantiation("version_matches/2"));
    };
    let range = subst.walk(range_arg);
    let version = subst.walk(version_arg);
    let (Term::Atom(range), Term::Atom(version)) = (&range, &version) else {
        return Err(EngineError::instantiation("version_matches/2"));
    };
    let (Ok(requirement), Ok(version)) = (VersionReq::parse(range), Version::parse(version)) else {
        return Ok(vec![]);
    };
    Ok(if requirement.matches(&version) {
        vec![vec![]]
    } else {
        vec![]
    })
}

fn version_minimum(args: &[Term], subst: &Substitution) -> Result<Alternatives, EngineError> {
    let [range_arg, version_arg] = args else {
        return Err(EngineError::instantiation("version_minimum/2"));
    };
    let range = subst.walk(range_arg);
    let Term::Atom(range) = &range else {
        return Err(EngineError::instantiation("version_minimum/2"));
    };
    let Ok(requirement) = VersionReq::parse(range) else {
        return Ok(vec![]);
    };
    let Some(minimum) = minimum_version(&requirement) else {
        return Ok(vec![]);
    };
    Ok(vec![vec![eq(
        version_arg.clone(),
        Term::atom(&minimum.to_string()),
    )]])
}

/// The smallest version the requirement admits: the largest of the
/// per-comparator lower bounds, checked against the requirement as a whole
/// so contradictory ranges yield nothing.
fn minimum_version(requirement: &VersionReq) -> Option<Version> {
    let mut minimum = Version::new(0, 0, 0);
    for comparator in &requirement.comparators {
        if let Some(bound) = lower_bound(comparator) {
            if bound > minimum {
                minimum = bound;
            }
        }
    }
    if requirement.matches(&minimum) {
        Some(minimum)
    } else {
        None
    }
}

fn lower_bound(comparator: &Comparator) -> Option<Version> {
    let minor = comparator.minor.unwrap_or(0);
    let patch = comparator.patch.unwrap_or(0);
    match comparator.op {
        Op::Exact | Op::GreaterEq | Op::Tilde | Op::Caret | Op::Wildcard => {
            let mut bound = Version::new(comparator.major, minor, patch);
            bound.pre = comparator.pre.clone();
            Some(bound)
        }
        // A strict bound excludes itself, so step to the next version at
        // the comparator's precision.
        Op::Greater => Some(match (comparator.minor, comparator.patch) {
            (Some(_), Some(_)) => Version::new(comparator.major, minor, patch + 1),
            (Some(_), None) => Version::new(comparator.major, minor + 1, 0),
            (None, _) => Version::new(comparator.major + 1, 0, 0),
        }),
        Op::Less | Op::LessEq => None,
        _ => None,
    }
}
