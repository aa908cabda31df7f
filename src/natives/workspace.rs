// SPDX-License-Identifier: PMPL-1.0-or-later

//! Workspace lookup predicates
//!
//! Each predicate answers from the loaded workspace model. Bound arguments
//! act as checks, unbound ones enumerate, and enumeration order follows the
//! model's sorted maps so repeated runs see identical answer streams.

use crate::engine::EngineError;
use crate::natives::{eq, Alternatives, NativeRegistry};
use crate::term::{Substitution, Term};
use crate::types::DependencyType;
use crate::workspace::WorkspaceInfo;
use std::sync::Arc;

pub fn register(registry: &mut NativeRegistry, workspace: Arc<WorkspaceInfo>) {
    registry.register("dependency_type", 1, dependency_type);

    let info = workspace.clone();
    registry.register("package", 1, move |args, subst| package(&info, args, subst));

    let info = workspace.clone();
    registry.register("package_field", 3, move |args, subst| {
        package_field(&info, args, subst)
    });

    let info = workspace.clone();
    registry.register("package_location", 2, move |args, subst| {
        package_location(&info, args, subst)
    });

    let info = workspace.clone();
    registry.register("internal_package_has_dependency", 4, move |args, subst| {
        has_dependency(&info, args, subst)
    });

    let info = workspace;
    registry.register("root_package", 1, move |args, subst| {
        root_package(&info, args, subst)
    });
}

fn dependency_type(args: &[Term], subst: &Substitution) -> Result<Alternatives, EngineError> {
    let [type_arg] = args else {
        return Err(EngineError::instantiation("dependency_type/1"));
    };
    let walked = subst.walk(type_arg);
    match &walked {
        Term::Atom(name) => Ok(if DependencyType::parse(name).is_some() {
            vec![vec![]]
        } else {
            vec![]
        }),
        Term::Var(_) => Ok(DependencyType::ALL
            .iter()
            .map(|ty| vec![eq(walked.clone(), Term::atom(ty.as_str()))])
            .collect()),
        _ => Err(EngineError::instantiation("dependency_type/1")),
    }
}

fn package(
    info: &WorkspaceInfo,
    args: &[Term],
    subst: &Substitution,
) -> Result<Alternatives, EngineError> {
    let [name_arg] = args else {
        return Err(EngineError::instantiation("package/1"));
    };
    let walked = subst.walk(name_arg);
    match &walked {
        Term::Atom(name) => Ok(if info.package(name).is_some() {
            vec![vec![]]
        } else {
            vec![]
        }),
        Term::Var(_) => Ok(info
            .packages()
            .map(|record| vec![eq(walked.clone(), Term::atom(&record.name))])
            .collect()),
        _ => Err(EngineError::instantiation("package/1")),
    }
}

fn package_field(
    info: &WorkspaceInfo,
    args: &[Term],
    subst: &Substitution,
) -> Result<Alternatives, EngineError> {
    let [name_arg, field_arg, value_arg] = args else {
        return Err(EngineError::instantiation("package_field/3"));
    };
    let name = subst.walk(name_arg);
    let field = subst.walk(field_arg);
    let (Term::Atom(name), Term::Atom(field)) = (&name, &field) else {
        return Err(EngineError::instantiation("package_field/3"));
    };
    let Some(record) = info.package(name) else {
        return Ok(vec![]);
    };
    let Some(value) = record.manifest.get(field) else {
        return Ok(vec![]);
    };
    Ok(vec![vec![eq(
        value_arg.clone(),
        Term::Atom(field_text(value)),
    )]])
}

/// String fields unify as their bare text, everything else as its JSON
/// rendering.
fn field_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn package_location(
    info: &WorkspaceInfo,
    args: &[Term],
    subst: &Substitution,
) -> Result<Alternatives, EngineError> {
    let [name_arg, location_arg] = args else {
        return Err(EngineError::instantiation("package_location/2"));
    };
    let name = subst.walk(name_arg);
    let location = subst.walk(location_arg);
    match (&name, &location) {
        (Term::Atom(name), Term::Atom(_) | Term::Var(_)) => {
            let Some(record) = info.package(name) else {
                return Ok(vec![]);
            };
            Ok(vec![vec![eq(
                location.clone(),
                Term::atom(&record.location),
            )]])
        }
        (Term::Var(_), Term::Atom(target)) => {
            match info.packages().find(|record| record.location == *target) {
                Some(record) => Ok(vec![vec![eq(name.clone(), Term::atom(&record.name))]]),
                None => Ok(vec![]),
            }
        }
        _ => Err(EngineError::instantiation("package_location/2")),
    }
}

fn has_dependency(
    info: &WorkspaceInfo,
    args: &[Term],
    subst: &Substitution,
) -> Result<Alternatives, EngineError> {
    let [name_arg, dependency_arg, range_arg, type_arg] = args else {
        return Err(EngineError::instantiation(
            "internal_package_has_dependency/4",
        ));
    };
    let name = subst.walk(name_arg);
    let ty = subst.walk(type_arg);
    let (Term::Atom(name), Term::Atom(ty)) = (&name, &ty) else {
        return Err(EngineError::instantiation(
            "internal_package_has_dependency/4",
        ));
    };
    let Some(ty) = DependencyType::parse(ty) else {
        return Ok(vec![]);
    };
    let Some(record) = info.package(name) else {
        return Ok(vec![]);
    };
    let dependencies = record.dependencies(ty);
    let dependency = subst.walk(dependency_arg);
    match &dependency {
        Term::Atom(dependency_name) => match dependencies.get(dependency_name) {
            Some(range) => Ok(vec![vec![eq(range_arg.clone(), Term::atom(range))]]),
            None => Ok(vec![]),
        },
        Term::Var(_) => Ok(dependencies
            .iter()
            .map(|(dependency_name, range)| {
                vec![
                    eq(dependency.clone(), Term::atom(dependency_name)),
                    eq(range_arg.clone(), Term::atom(range)),
                ]
            })
            .collect()),
        _ => Err(EngineError::instantiation(
            "internal_package_has_dependency/4",
        )),
    }
}

fn root_package(
    info: &WorkspaceInfo,
    args: &[Term],
    subst: &Substitution,
) -> Result<Alternatives, EngineError> {
    let [name_arg] = args else {
        return Err(EngineError::instantiation("root_package/1"));
    };
    let walked = subst.walk(name_arg);
    Ok(vec![vec![eq(
        walked,
        Term::atom(&info.root_package_name),
    )]])
}
