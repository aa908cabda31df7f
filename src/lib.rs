// SPDX-License-Identifier: PMPL-1.0-or-later

//! Covenant: dependency constraint enforcement for multi-package
//! JavaScript workspaces.
//!
//! A workspace declares rules in a small logic language; covenant loads
//! the workspace model, evaluates the rules against it, and reports where
//! the manifests disagree with what the rules demand.
//!
//! PIPELINE:
//! 1. **Workspace**: discover the root and build the package model.
//! 2. **Engine**: resolution over consulted clauses, with host predicates
//!    bridging into the workspace model.
//! 3. **Processor**: run the two constraint queries, order the findings,
//!    and diff them against the declared manifests.
//! 4. **Report**: render findings to console, TAP, JSON, or YAML sinks.

pub mod check;
pub mod constraints;
pub mod engine;
pub mod facts;
pub mod natives;
pub mod ordering;
pub mod parser;
pub mod processor;
pub mod report;
pub mod term;
pub mod types;
pub mod workspace;
