// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test Anything Protocol output
//!
//! One test point per finding, valid findings included, with the plan line
//! emitted last. Byte-identical across runs for identical findings.

use crate::report::{CheckSummary, Formatter};
use crate::types::DependencyType;
use anyhow::Result;
use std::io::Write;

pub struct TapFormatter {
    sink: Box<dyn Write>,
    summary: CheckSummary,
}

impl TapFormatter {
    pub fn new(sink: Box<dyn Write>) -> Self {
        Self {
            sink,
            summary: CheckSummary::default(),
        }
    }

    fn log_error(&mut self, message: String) -> Result<()> {
        self.summary.record_error();
        writeln!(self.sink, "not ok {} - {message}", self.summary.total)?;
        Ok(())
    }
}

impl Formatter for TapFormatter {
    fn invalid_dependency_version(
        &mut self,
        package_name: &str,
        dependency_type: DependencyType,
        dependency_name: &str,
        required_range: &str,
        actual_range: &str,
    ) -> Result<()> {
        self.log_error(format!(
            "{package_name} must depend on {dependency_name} version {required_range} via {dependency_type}, but depends on version {actual_range} instead"
        ))
    }

    fn missing_dependency(
        &mut self,
        package_name: &str,
        dependency_type: DependencyType,
        dependency_name: &str,
        required_range: &str,
    ) -> Result<()> {
        self.log_error(format!(
            "{package_name} must depend on {dependency_name} version {required_range} via {dependency_type}, but doesn't"
        ))
    }

    fn extraneous_dependency(
        &mut self,
        package_name: &str,
        dependency_type: DependencyType,
        dependency_name: &str,
        actual_range: &str,
    ) -> Result<()> {
        self.log_error(format!(
            "{package_name} has an extraneous dependency on {dependency_name} version {actual_range} via {dependency_type}"
        ))
    }

    fn invalid_dependency(
        &mut self,
        package_name: &str,
        dependency_type: DependencyType,
        dependency_name: &str,
        reason: Option<&str>,
    ) -> Result<()> {
        self.log_error(format!(
            "{package_name} has an invalid dependency on {dependency_name} via {dependency_type} (invalid because {})",
            reason.unwrap_or("null")
        ))
    }

    fn valid_dependency(
        &mut self,
        package_name: &str,
        dependency_type: DependencyType,
        dependency_name: &str,
        required_range: Option<&str>,
    ) -> Result<()> {
        self.summary.record_valid();
        writeln!(
            self.sink,
            "ok {} - {package_name} has a valid dependency on {dependency_name} version {} via {dependency_type}",
            self.summary.total,
            required_range.unwrap_or("null")
        )?;
        Ok(())
    }

    fn complete(&mut self) -> Result<CheckSummary> {
        writeln!(self.sink, "1..{}", self.summary.total)?;
        self.sink.flush()?;
        Ok(self.summary)
    }
}
