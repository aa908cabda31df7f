// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fact projection: the workspace model rendered as program text
//!
//! Only the `generate` path consults this output directly; the check path
//! answers the same predicates through the native bridge. Both must agree,
//! which the tests pin down by parsing the projection back.

use crate::types::DependencyType;
use crate::workspace::WorkspaceInfo;

/// Quotes text as an atom, escaping backslashes and embedded quotes.
pub fn escape_atom(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('\'');
    for c in text.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '\'' => quoted.push_str("\\'"),
            c => quoted.push(c),
        }
    }
    quoted.push('\'');
    quoted
}

/// An absent value renders as the empty list, the conventional null marker
/// in fact position.
pub fn escape_optional(value: Option<&str>) -> String {
    match value {
        Some(text) => escape_atom(text),
        None => "[]".to_string(),
    }
}

/// Every package as facts, packages in name order and dependency
/// collections in declaration-kind order.
pub fn project_database(workspace: &WorkspaceInfo) -> String {
    let mut source = String::new();
    for record in workspace.packages() {
        let name = escape_atom(&record.name);
        source.push_str(&format!("package({name}).\n"));
        source.push_str(&format!(
            "package_location({name}, {}).\n",
            escape_atom(&record.location)
        ));
        source.push_str(&format!(
            "package_version({name}, {}).\n",
            escape_optional(record.version.as_deref())
        ));
        for ty in DependencyType::ALL {
            for (dependency, range) in record.dependencies(ty) {
                source.push_str(&format!(
                    "package_has_dependency({name}, {}, {}, {ty}).\n",
                    escape_atom(dependency),
                    escape_atom(range)
                ));
            }
        }
    }
    source
}

pub fn dependency_type_facts() -> String {
    DependencyType::ALL
        .iter()
        .map(|ty| format!("dependency_type({ty}).\n"))
        .collect()
}

/// Fallback clauses so both generator predicates always exist, even when
/// the user program declares neither.
pub fn default_declarations() -> String {
    "gen_enforced_dependency_range(_, _, _, _) :- false.\n\
     gen_invalid_dependency(_, _, _, _) :- false.\n"
        .to_string()
}

/// The complete standalone program: workspace facts, dependency type facts,
/// the user source, then the fallback declarations.
pub fn full_source(workspace: &WorkspaceInfo, user_source: &str) -> String {
    let mut source = String::new();
    source.push_str(&project_database(workspace));
    source.push('\n');
    source.push_str(&dependency_type_facts());
    source.push('\n');
    source.push_str(user_source);
    if !user_source.ends_with('\n') {
        source.push('\n');
    }
    source.push('\n');
    source.push_str(&default_declarations());
    source
}
