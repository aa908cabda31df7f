// SPDX-License-Identifier: PMPL-1.0-or-later

//! Constraint processing
//!
//! Runs the two fixed queries over a session wired to the workspace,
//! shapes every answer into a finding, and diffs the findings against the
//! declared manifests. Identifier variables must come back as concrete
//! atoms; a rule that leaves them unbound or null is broken and aborts the
//! run rather than producing findings about packages that don't exist.

use crate::constraints::Constraints;
use crate::engine::{Answer, EngineError, Session};
use crate::facts;
use crate::natives;
use crate::ordering;
use crate::report::Formatter;
use crate::term::Term;
use crate::types::{CheckReport, DependencyType, EnforcedDependencyRange, InvalidDependency};
use crate::workspace::WorkspaceInfo;
use anyhow::{anyhow, Result};
use thiserror::Error;

pub const ENFORCED_RANGE_QUERY: &str = "package(PackageName), dependency_type(DependencyType), \
     gen_enforced_dependency_range(PackageName, DependencyName, DependencyRange, DependencyType).";

pub const INVALID_DEPENDENCY_QUERY: &str = "package(PackageName), dependency_type(DependencyType), \
     gen_invalid_dependency(PackageName, DependencyName, DependencyType, Reason).";

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("invalid rule: {predicate} must bind {variable} to a concrete atom")]
    InvalidRule {
        predicate: &'static str,
        variable: &'static str,
    },
}

/// Assembles the evaluation session: natives and derived rules first, then
/// the user program, then the fallback declarations.
pub fn session(constraints: &Constraints) -> Result<Session, EngineError> {
    let mut session = natives::session_for(constraints.workspace_arc())?;
    session.consult(constraints.source())?;
    session.consult(&facts::default_declarations())?;
    Ok(session)
}

/// Runs both queries and returns every finding in reporting order.
pub fn process(constraints: &Constraints) -> Result<CheckReport, ProcessError> {
    let session = session(constraints)?;

    let mut enforced_ranges = Vec::new();
    for answer in session.query(ENFORCED_RANGE_QUERY) {
        enforced_ranges.push(enforced_range(&answer?)?);
    }

    let mut invalid_dependencies = Vec::new();
    for answer in session.query(INVALID_DEPENDENCY_QUERY) {
        invalid_dependencies.push(invalid_dependency(&answer?)?);
    }

    ordering::sort_enforced(&mut enforced_ranges);
    ordering::sort_invalid(&mut invalid_dependencies);
    Ok(CheckReport {
        enforced_ranges,
        invalid_dependencies,
    })
}

fn enforced_range(answer: &Answer) -> Result<EnforcedDependencyRange, ProcessError> {
    const PREDICATE: &str = "gen_enforced_dependency_range";
    Ok(EnforcedDependencyRange {
        package_name: concrete_atom(answer, PREDICATE, "PackageName")?,
        dependency_name: concrete_atom(answer, PREDICATE, "DependencyName")?,
        dependency_range: optional_text(answer, "DependencyRange"),
        dependency_type: dependency_type(answer, PREDICATE)?,
    })
}

fn invalid_dependency(answer: &Answer) -> Result<InvalidDependency, ProcessError> {
    const PREDICATE: &str = "gen_invalid_dependency";
    Ok(InvalidDependency {
        package_name: concrete_atom(answer, PREDICATE, "PackageName")?,
        dependency_name: concrete_atom(answer, PREDICATE, "DependencyName")?,
        dependency_type: dependency_type(answer, PREDICATE)?,
        reason: optional_text(answer, "Reason"),
    })
}

fn concrete_atom(
    answer: &Answer,
    predicate: &'static str,
    variable: &'static str,
) -> Result<String, ProcessError> {
    match answer.get(variable) {
        Some(Term::Atom(text)) if text != "null" => Ok(text.clone()),
        _ => Err(ProcessError::InvalidRule {
            predicate,
            variable,
        }),
    }
}

/// Unbound and `null` both mean "nothing"; every other term keeps its text.
fn optional_text(answer: &Answer, variable: &str) -> Option<String> {
    match answer.get(variable)? {
        Term::Var(_) => None,
        Term::Atom(text) if text == "null" => None,
        Term::Atom(text) => Some(text.clone()),
        Term::Str(text) => Some(text.clone()),
        Term::Int(value) => Some(value.to_string()),
        other => Some(other.to_string()),
    }
}

fn dependency_type(
    answer: &Answer,
    predicate: &'static str,
) -> Result<DependencyType, ProcessError> {
    let variable = "DependencyType";
    let atom = concrete_atom(answer, predicate, variable)?;
    DependencyType::parse(&atom).ok_or(ProcessError::InvalidRule {
        predicate,
        variable,
    })
}

/// Feeds an ordered report through the diff and into the sink: enforced
/// ranges first, then invalid declarations. Invalid findings only fire for
/// dependencies the package actually declares.
pub fn report_findings(
    workspace: &WorkspaceInfo,
    report: &CheckReport,
    formatter: &mut dyn Formatter,
) -> Result<()> {
    for finding in &report.enforced_ranges {
        let declared = workspace
            .package(&finding.package_name)
            .ok_or_else(|| {
                anyhow!(
                    "finding references unknown package {}",
                    finding.package_name
                )
            })?
            .dependencies(finding.dependency_type)
            .get(&finding.dependency_name)
            .map(String::as_str);
        match (finding.dependency_range.as_deref(), declared) {
            (Some(required), None) => formatter.missing_dependency(
                &finding.package_name,
                finding.dependency_type,
                &finding.dependency_name,
                required,
            )?,
            (Some(required), Some(actual)) if actual != required => formatter
                .invalid_dependency_version(
                    &finding.package_name,
                    finding.dependency_type,
                    &finding.dependency_name,
                    required,
                    actual,
                )?,
            (Some(required), Some(_)) => formatter.valid_dependency(
                &finding.package_name,
                finding.dependency_type,
                &finding.dependency_name,
                Some(required),
            )?,
            (None, Some(actual)) => formatter.extraneous_dependency(
                &finding.package_name,
                finding.dependency_type,
                &finding.dependency_name,
                actual,
            )?,
            (None, None) => formatter.valid_dependency(
                &finding.package_name,
                finding.dependency_type,
                &finding.dependency_name,
                None,
            )?,
        }
    }

    for finding in &report.invalid_dependencies {
        let declared = workspace.package(&finding.package_name).is_some_and(|record| {
            record
                .dependencies(finding.dependency_type)
                .contains_key(&finding.dependency_name)
        });
        if declared {
            formatter.invalid_dependency(
                &finding.package_name,
                finding.dependency_type,
                &finding.dependency_name,
                finding.reason.as_deref(),
            )?;
        }
    }
    Ok(())
}
