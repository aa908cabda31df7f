// SPDX-License-Identifier: PMPL-1.0-or-later

//! Session: clause database, native registry, and query entry point

use crate::engine::solve::Answers;
use crate::engine::EngineError;
use crate::natives::{NativeFn, NativeRegistry};
use crate::parser::{self, Clause};
use std::collections::{HashMap, HashSet};

/// The default resolution step budget for a single query.
pub const DEFAULT_STEP_LIMIT: u64 = 1_000_000;

const BUILTINS: [(&str, usize); 8] = [
    ("true", 0),
    ("fail", 0),
    ("false", 0),
    (",", 2),
    (";", 2),
    ("=", 2),
    ("\\=", 2),
    ("\\+", 1),
];

/// An engine session: consulted clauses plus the native predicates the
/// session was constructed with. Queries borrow the session immutably, so
/// a session can serve any number of sequential queries.
pub struct Session {
    database: HashMap<(String, usize), Vec<Clause>>,
    natives: NativeRegistry,
    reserved: HashSet<(String, usize)>,
    step_limit: u64,
}

impl Session {
    pub fn new(natives: NativeRegistry) -> Self {
        let mut reserved: HashSet<(String, usize)> = BUILTINS
            .iter()
            .map(|(name, arity)| (name.to_string(), *arity))
            .collect();
        for indicator in natives.indicators() {
            reserved.insert(indicator.clone());
        }
        Self {
            database: HashMap::new(),
            natives,
            reserved,
            step_limit: DEFAULT_STEP_LIMIT,
        }
    }

    pub fn step_limit(&self) -> u64 {
        self.step_limit
    }

    pub fn set_step_limit(&mut self, limit: u64) {
        self.step_limit = limit;
    }

    /// Parses and appends clauses. Redefining a builtin, a native, or a
    /// reserved predicate is a consult-time error.
    pub fn consult(&mut self, source: &str) -> Result<(), EngineError> {
        let clauses = parser::parse_program(source)?;
        for clause in clauses {
            let indicator = self.indicator_of(&clause)?;
            if self.reserved.contains(&indicator) {
                return Err(EngineError::ReservedPredicate {
                    indicator: format!("{}/{}", indicator.0, indicator.1),
                });
            }
            self.database.entry(indicator).or_default().push(clause);
        }
        Ok(())
    }

    /// Installs rules and marks their predicates reserved, shielding them
    /// from later redefinition through [`Session::consult`].
    pub fn install_reserved(&mut self, source: &str) -> Result<(), EngineError> {
        let clauses = parser::parse_program(source)?;
        for clause in clauses {
            let indicator = self.indicator_of(&clause)?;
            self.database
                .entry(indicator.clone())
                .or_default()
                .push(clause);
            self.reserved.insert(indicator);
        }
        Ok(())
    }

    /// Starts a lazy answer stream for a query. Parse failures surface as
    /// the stream's first and only item.
    pub fn query<'s>(&'s self, text: &str) -> Answers<'s> {
        match parser::parse_query(text) {
            Ok(query) => Answers::start(self, query),
            Err(err) => Answers::failed(self, err.into()),
        }
    }

    pub(crate) fn clauses(&self, name: &str, arity: usize) -> Option<&[Clause]> {
        self.database
            .get(&(name.to_string(), arity))
            .map(Vec::as_slice)
    }

    pub(crate) fn native(&self, name: &str, arity: usize) -> Option<&NativeFn> {
        self.natives.get(name, arity)
    }

    /// True when the indicator is known to the session in any capacity.
    pub fn defines(&self, name: &str, arity: usize) -> bool {
        let key = (name.to_string(), arity);
        self.database.contains_key(&key) || self.reserved.contains(&key)
    }

    fn indicator_of(&self, clause: &Clause) -> Result<(String, usize), EngineError> {
        match clause.head.indicator() {
            Some((name, arity)) => Ok((name.to_string(), arity)),
            // The parser rejects non-callable heads already.
            None => Err(EngineError::NotCallable {
                goal: clause.head.to_string(),
            }),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(NativeRegistry::new())
    }
}
