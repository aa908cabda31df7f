// SPDX-License-Identifier: PMPL-1.0-or-later

//! Term algebra for the resolution engine
//!
//! Substitution-based unification in the classic first-order style. The
//! occurs check is deliberately omitted: constraint rules unify package
//! atoms and version strings, never cyclic structures, and omitting it
//! keeps unification linear.

use std::collections::HashMap;
use std::fmt;

/// A logic term.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// Logic variable (unbound until a substitution says otherwise)
    Var(String),
    /// Atom such as `dependencies` or a quoted package name
    Atom(String),
    /// Integer value
    Int(i64),
    /// Double-quoted string literal
    Str(String),
    /// Compound term: functor(args...)
    Compound(String, Vec<Term>),
}

impl Term {
    pub fn atom(s: &str) -> Self {
        Term::Atom(s.to_string())
    }

    pub fn var(s: &str) -> Self {
        Term::Var(s.to_string())
    }

    pub fn compound(name: &str, args: Vec<Term>) -> Self {
        Term::Compound(name.to_string(), args)
    }

    /// The empty list atom `[]`.
    pub fn nil() -> Self {
        Term::Atom("[]".to_string())
    }

    /// A cons cell `'.'(head, tail)`.
    pub fn cons(head: Term, tail: Term) -> Self {
        Term::Compound(".".to_string(), vec![head, tail])
    }

    /// A proper list built from `items`.
    pub fn list(items: Vec<Term>) -> Self {
        items
            .into_iter()
            .rev()
            .fold(Term::nil(), |tail, head| Term::cons(head, tail))
    }

    pub fn is_var(&self) -> bool {
        matches!(self, Term::Var(_))
    }

    /// The `functor/arity` pair of a callable term.
    pub fn indicator(&self) -> Option<(&str, usize)> {
        match self {
            Term::Atom(name) => Some((name, 0)),
            Term::Compound(name, args) => Some((name, args.len())),
            _ => None,
        }
    }

    /// Atom text, when this term is an atom.
    pub fn atom_text(&self) -> Option<&str> {
        match self {
            Term::Atom(text) => Some(text),
            _ => None,
        }
    }
}

fn is_bare_atom(text: &str) -> bool {
    if text == "[]" {
        return true;
    }
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, quote: char, text: &str) -> fmt::Result {
    write!(f, "{quote}")?;
    for c in text.chars() {
        match c {
            '\\' => write!(f, "\\\\")?,
            c if c == quote => write!(f, "\\{quote}")?,
            '\n' => write!(f, "\\n")?,
            '\t' => write!(f, "\\t")?,
            c => write!(f, "{c}")?,
        }
    }
    write!(f, "{quote}")
}

fn write_atom(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    if is_bare_atom(text) {
        f.write_str(text)
    } else {
        write_quoted(f, '\'', text)
    }
}

/// Renders the term as valid program text, re-sugaring lists and quoting
/// atoms that are not bare.
impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Var(name) => f.write_str(name),
            Term::Atom(text) => write_atom(f, text),
            Term::Int(value) => write!(f, "{value}"),
            Term::Str(text) => write_quoted(f, '"', text),
            Term::Compound(functor, args) if functor == "." && args.len() == 2 => {
                write!(f, "[{}", args[0])?;
                let mut tail = &args[1];
                loop {
                    match tail {
                        Term::Compound(functor, args) if functor == "." && args.len() == 2 => {
                            write!(f, ", {}", args[0])?;
                            tail = &args[1];
                        }
                        Term::Atom(text) if text == "[]" => break,
                        other => {
                            write!(f, "|{other}")?;
                            break;
                        }
                    }
                }
                write!(f, "]")
            }
            Term::Compound(functor, args) => {
                write_atom(f, functor)?;
                write!(f, "(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Substitution: mapping from variable names to terms
#[derive(Debug, Clone, Default)]
pub struct Substitution {
    bindings: HashMap<String, Term>,
}

impl Substitution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk a term through the substitution, resolving variable chains.
    pub fn walk(&self, term: &Term) -> Term {
        match term {
            Term::Var(name) => {
                if let Some(bound) = self.bindings.get(name) {
                    self.walk(bound)
                } else {
                    term.clone()
                }
            }
            _ => term.clone(),
        }
    }

    /// Unify two terms, extending the substitution if successful.
    pub fn unify(&self, t1: &Term, t2: &Term) -> Option<Substitution> {
        let t1 = self.walk(t1);
        let t2 = self.walk(t2);

        match (&t1, &t2) {
            // Same term
            (a, b) if a == b => Some(self.clone()),

            // Variable binding
            (Term::Var(name), _) => {
                let mut extended = self.clone();
                extended.bindings.insert(name.clone(), t2);
                Some(extended)
            }
            (_, Term::Var(name)) => {
                let mut extended = self.clone();
                extended.bindings.insert(name.clone(), t1);
                Some(extended)
            }

            // Compound term unification
            (Term::Compound(f1, args1), Term::Compound(f2, args2)) => {
                if f1 != f2 || args1.len() != args2.len() {
                    return None;
                }
                let mut subst = self.clone();
                for (a1, a2) in args1.iter().zip(args2.iter()) {
                    subst = subst.unify(a1, a2)?;
                }
                Some(subst)
            }

            // No unification possible
            _ => None,
        }
    }

    /// Apply the substitution all the way down a term.
    pub fn resolve(&self, term: &Term) -> Term {
        match self.walk(term) {
            Term::Compound(functor, args) => {
                Term::Compound(functor, args.iter().map(|arg| self.resolve(arg)).collect())
            }
            other => other,
        }
    }

    /// True when no variable remains in the term after resolution.
    pub fn is_ground(&self, term: &Term) -> bool {
        match self.walk(term) {
            Term::Var(_) => false,
            Term::Compound(_, args) => args.iter().all(|arg| self.is_ground(arg)),
            _ => true,
        }
    }
}
