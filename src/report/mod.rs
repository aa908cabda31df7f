// SPDX-License-Identifier: PMPL-1.0-or-later

//! Report sinks
//!
//! A `Formatter` receives diffed findings one at a time and renders them;
//! `complete` flushes the sink and returns the aggregate outcome. Sinks
//! that have no use for valid findings inherit the default no-op.

pub mod console;
pub mod output;
pub mod tap;

pub use console::ConsoleFormatter;
pub use output::{FindingKind, FindingRecord, MachineFormatter, OutputFormat, OutputTarget};
pub use tap::TapFormatter;

use crate::types::DependencyType;
use anyhow::Result;
use serde::Serialize;

/// Aggregate outcome of a run as seen by one sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CheckSummary {
    pub errors: usize,
    pub total: usize,
}

impl CheckSummary {
    pub fn is_clean(&self) -> bool {
        self.errors == 0
    }

    fn record_error(&mut self) {
        self.errors += 1;
        self.total += 1;
    }

    fn record_valid(&mut self) {
        self.total += 1;
    }
}

pub trait Formatter {
    fn invalid_dependency_version(
        &mut self,
        package_name: &str,
        dependency_type: DependencyType,
        dependency_name: &str,
        required_range: &str,
        actual_range: &str,
    ) -> Result<()>;

    fn missing_dependency(
        &mut self,
        package_name: &str,
        dependency_type: DependencyType,
        dependency_name: &str,
        required_range: &str,
    ) -> Result<()>;

    fn extraneous_dependency(
        &mut self,
        package_name: &str,
        dependency_type: DependencyType,
        dependency_name: &str,
        actual_range: &str,
    ) -> Result<()>;

    fn invalid_dependency(
        &mut self,
        package_name: &str,
        dependency_type: DependencyType,
        dependency_name: &str,
        reason: Option<&str>,
    ) -> Result<()>;

    /// Valid findings are noise for most sinks, so the default drops them.
    fn valid_dependency(
        &mut self,
        package_name: &str,
        dependency_type: DependencyType,
        dependency_name: &str,
        required_range: Option<&str>,
    ) -> Result<()> {
        let _ = (package_name, dependency_type, dependency_name, required_range);
        Ok(())
    }

    fn complete(&mut self) -> Result<CheckSummary>;
}

/// Fans findings out to several sinks. The returned summary is counted
/// locally, so it never depends on any child sink's bookkeeping.
pub struct CombineFormatter {
    sinks: Vec<Box<dyn Formatter>>,
    summary: CheckSummary,
}

impl CombineFormatter {
    pub fn new(sinks: Vec<Box<dyn Formatter>>) -> Self {
        Self {
            sinks,
            summary: CheckSummary::default(),
        }
    }
}

impl Formatter for CombineFormatter {
    fn invalid_dependency_version(
        &mut self,
        package_name: &str,
        dependency_type: DependencyType,
        dependency_name: &str,
        required_range: &str,
        actual_range: &str,
    ) -> Result<()> {
        self.summary.record_error();
        for sink in &mut self.sinks {
            sink.invalid_dependency_version(
                package_name,
                dependency_type,
                dependency_name,
                required_range,
                actual_range,
            )?;
        }
        Ok(())
    }

    fn missing_dependency(
        &mut self,
        package_name: &str,
        dependency_type: DependencyType,
        dependency_name: &str,
        required_range: &str,
    ) -> Result<()> {
        self.summary.record_error();
        for sink in &mut self.sinks {
            sink.missing_dependency(package_name, dependency_type, dependency_name, required_range)?;
        }
        Ok(())
    }

    fn extraneous_dependency(
        &mut self,
        package_name: &str,
        dependency_type: DependencyType,
        dependency_name: &str,
        actual_range: &str,
    ) -> Result<()> {
        self.summary.record_error();
        for sink in &mut self.sinks {
            sink.extraneous_dependency(package_name, dependency_type, dependency_name, actual_range)?;
        }
        Ok(())
    }

    fn invalid_dependency(
        &mut self,
        package_name: &str,
        dependency_type: DependencyType,
        dependency_name: &str,
        reason: Option<&str>,
    ) -> Result<()> {
        self.summary.record_error();
        for sink in &mut self.sinks {
            sink.invalid_dependency(package_name, dependency_type, dependency_name, reason)?;
        }
        Ok(())
    }

    fn valid_dependency(
        &mut self,
        package_name: &str,
        dependency_type: DependencyType,
        dependency_name: &str,
        required_range: Option<&str>,
    ) -> Result<()> {
        self.summary.record_valid();
        for sink in &mut self.sinks {
            sink.valid_dependency(package_name, dependency_type, dependency_name, required_range)?;
        }
        Ok(())
    }

    fn complete(&mut self) -> Result<CheckSummary> {
        for sink in &mut self.sinks {
            sink.complete()?;
        }
        Ok(self.summary)
    }
}
