// SPDX-License-Identifier: PMPL-1.0-or-later

//! Depth-first SLD resolution over goal stacks
//!
//! Each state is a stack of pending goals plus the substitution built so
//! far. Choice points are whole states pushed onto a LIFO frontier, so the
//! leftmost alternative of the most recent choice is always explored next.
//! Answers are produced one at a time: the frontier survives between pulls.

use crate::engine::session::Session;
use crate::engine::EngineError;
use crate::parser::{Clause, Query};
use crate::term::{Substitution, Term};
use std::collections::BTreeMap;

/// One branch of the search. The current goal is the last element of
/// `goals`; an empty stack means the branch is a solution.
#[derive(Debug, Clone)]
struct State {
    goals: Vec<Term>,
    subst: Substitution,
}

/// One solution: the query's variables resolved against the winning
/// substitution. Unbound variables stay as [`Term::Var`], and a bound
/// `null` atom stays the `null` atom, so callers can tell the two apart.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    bindings: BTreeMap<String, Term>,
}

impl Answer {
    fn project(subst: &Substitution, variables: &[String]) -> Self {
        let bindings = variables
            .iter()
            .map(|name| (name.clone(), subst.resolve(&Term::Var(name.clone()))))
            .collect();
        Self { bindings }
    }

    pub fn get(&self, variable: &str) -> Option<&Term> {
        self.bindings.get(variable)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Term)> {
        self.bindings.iter().map(|(name, term)| (name.as_str(), term))
    }
}

struct Machine<'s> {
    session: &'s Session,
    steps: u64,
    rename_counter: u64,
}

impl<'s> Machine<'s> {
    fn tick(&mut self) -> Result<(), EngineError> {
        self.steps += 1;
        let limit = self.session.step_limit();
        if self.steps > limit {
            Err(EngineError::StepLimit { limit })
        } else {
            Ok(())
        }
    }

    /// Reduces one goal, pushing the surviving branches onto `frontier`.
    fn step(
        &mut self,
        frontier: &mut Vec<State>,
        goal: Term,
        mut state: State,
    ) -> Result<(), EngineError> {
        self.tick()?;
        let goal = state.subst.walk(&goal);
        let (name, args) = match goal {
            Term::Var(_) => {
                return Err(EngineError::instantiation("call/1"));
            }
            Term::Atom(name) => (name, Vec::new()),
            Term::Compound(name, args) => (name, args),
            other => {
                return Err(EngineError::NotCallable {
                    goal: other.to_string(),
                })
            }
        };

        match (name.as_str(), args.as_slice()) {
            ("true", []) => frontier.push(state),
            ("fail", []) | ("false", []) => {}
            (",", [first, second]) => {
                state.goals.push(second.clone());
                state.goals.push(first.clone());
                frontier.push(state);
            }
            (";", [left, right]) => {
                let mut right_state = state.clone();
                right_state.goals.push(right.clone());
                state.goals.push(left.clone());
                // Right branch below the left one: left explored first.
                frontier.push(right_state);
                frontier.push(state);
            }
            ("=", [left, right]) => {
                if let Some(unified) = state.subst.unify(left, right) {
                    state.subst = unified;
                    frontier.push(state);
                }
            }
            ("\\=", [left, right]) => {
                if state.subst.unify(left, right).is_none() {
                    frontier.push(state);
                }
            }
            ("\\+", [negated]) => {
                if !self.prove_once(negated, &state.subst)? {
                    frontier.push(state);
                }
            }
            _ => self.dispatch(frontier, name, args, state)?,
        }
        Ok(())
    }

    /// Natives first, then consulted clauses, otherwise an existence error.
    fn dispatch(
        &mut self,
        frontier: &mut Vec<State>,
        name: String,
        args: Vec<Term>,
        state: State,
    ) -> Result<(), EngineError> {
        if let Some(native) = self.session.native(&name, args.len()) {
            let alternatives = native(&args, &state.subst)?;
            for goals in alternatives.into_iter().rev() {
                let mut next = state.clone();
                for goal in goals.into_iter().rev() {
                    next.goals.push(goal);
                }
                frontier.push(next);
            }
            return Ok(());
        }

        if let Some(clauses) = self.session.clauses(&name, args.len()) {
            let callable = if args.is_empty() {
                Term::Atom(name)
            } else {
                Term::Compound(name, args)
            };
            for clause in clauses.iter().rev() {
                let renamed = self.rename_clause(clause);
                if let Some(unified) = state.subst.unify(&callable, &renamed.head) {
                    let mut next = state.clone();
                    next.subst = unified;
                    if let Some(body) = renamed.body {
                        next.goals.push(body);
                    }
                    frontier.push(next);
                }
            }
            return Ok(());
        }

        Err(EngineError::UnknownPredicate {
            indicator: format!("{}/{}", name, args.len()),
        })
    }

    /// Bounded sub-proof for negation as failure. Shares the step budget
    /// with the enclosing search.
    fn prove_once(&mut self, goal: &Term, subst: &Substitution) -> Result<bool, EngineError> {
        let mut frontier = vec![State {
            goals: vec![goal.clone()],
            subst: subst.clone(),
        }];
        while let Some(mut state) = frontier.pop() {
            let Some(goal) = state.goals.pop() else {
                return Ok(true);
            };
            self.step(&mut frontier, goal, state)?;
        }
        Ok(false)
    }

    fn rename_clause(&mut self, clause: &Clause) -> Clause {
        let suffix = self.rename_counter;
        self.rename_counter += 1;
        Clause {
            head: rename_term(&clause.head, suffix),
            body: clause.body.as_ref().map(|body| rename_term(body, suffix)),
        }
    }
}

// The '~' separator cannot appear in a source-level variable name, so a
// renamed variable can never capture a query variable.
fn rename_term(term: &Term, suffix: u64) -> Term {
    match term {
        Term::Var(name) => Term::Var(format!("{name}~{suffix}")),
        Term::Compound(functor, args) => Term::Compound(
            functor.clone(),
            args.iter().map(|arg| rename_term(arg, suffix)).collect(),
        ),
        other => other.clone(),
    }
}

/// Lazy pull-based answer stream. The stream ends after exhaustion, after
/// the first error, or after [`Answers::stop`] is observed.
pub struct Answers<'s> {
    machine: Machine<'s>,
    variables: Vec<String>,
    frontier: Vec<State>,
    pending_error: Option<EngineError>,
    stopped: bool,
    done: bool,
}

impl<'s> Answers<'s> {
    pub(crate) fn start(session: &'s Session, query: Query) -> Self {
        let state = State {
            goals: vec![query.goal],
            subst: Substitution::new(),
        };
        Self {
            machine: Machine {
                session,
                steps: 0,
                rename_counter: 0,
            },
            variables: query.variables,
            frontier: vec![state],
            pending_error: None,
            stopped: false,
            done: false,
        }
    }

    pub(crate) fn failed(session: &'s Session, error: EngineError) -> Self {
        Self {
            machine: Machine {
                session,
                steps: 0,
                rename_counter: 0,
            },
            variables: Vec::new(),
            frontier: Vec::new(),
            pending_error: Some(error),
            stopped: false,
            done: false,
        }
    }

    /// Requests cooperative cancellation. Checked before the next
    /// resolution step; no answer is delivered afterwards.
    pub fn stop(&mut self) {
        self.stopped = true;
    }
}

impl Iterator for Answers<'_> {
    type Item = Result<Answer, EngineError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Some(error) = self.pending_error.take() {
            self.done = true;
            return Some(Err(error));
        }
        loop {
            if self.stopped {
                self.done = true;
                return None;
            }
            let Some(mut state) = self.frontier.pop() else {
                break;
            };
            let Some(goal) = state.goals.pop() else {
                return Some(Ok(Answer::project(&state.subst, &self.variables)));
            };
            if let Err(error) = self.machine.step(&mut self.frontier, goal, state) {
                self.done = true;
                return Some(Err(error));
            }
        }
        self.done = true;
        None
    }
}
