// SPDX-License-Identifier: PMPL-1.0-or-later

//! Resolution engine
//!
//! A small SLD resolution engine with depth-first search, LIFO choice
//! points, and lazily pulled answers. Host-side native predicates hook
//! into the search through the registry in [`crate::natives`].

pub mod session;
pub mod solve;

pub use session::Session;
pub use solve::{Answer, Answers};

use crate::parser::ParseError;
use thiserror::Error;

/// Typed failures surfaced by consult or by an answer stream.
///
/// A stream error is terminal: the stream yields it once and then ends.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("parse error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("arguments are not sufficiently instantiated in {indicator}")]
    Instantiation { indicator: String },

    #[error("unknown predicate {indicator}")]
    UnknownPredicate { indicator: String },

    #[error("cannot redefine reserved predicate {indicator}")]
    ReservedPredicate { indicator: String },

    #[error("goal is not callable: {goal}")]
    NotCallable { goal: String },

    #[error("resolution step limit of {limit} exceeded")]
    StepLimit { limit: u64 },
}

impl From<ParseError> for EngineError {
    fn from(err: ParseError) -> Self {
        EngineError::Parse {
            line: err.line,
            column: err.column,
            message: err.message,
        }
    }
}

impl EngineError {
    /// Convenience constructor for natives rejecting under-instantiated calls.
    pub fn instantiation(indicator: &str) -> Self {
        EngineError::Instantiation {
            indicator: indicator.to_string(),
        }
    }
}
