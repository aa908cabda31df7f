// SPDX-License-Identifier: PMPL-1.0-or-later

//! Human-readable console output

use crate::report::{CheckSummary, Formatter};
use crate::types::DependencyType;
use anyhow::Result;
use colored::Colorize;
use regex::Regex;
use std::io::Write;

/// Renders findings as prose, one line each, followed by an error count.
/// The styled constructor leaves tty detection to the terminal layer, so
/// redirected output comes out clean.
pub struct ConsoleFormatter {
    sink: Box<dyn Write>,
    colorize: bool,
    scoped: Regex,
    summary: CheckSummary,
}

impl ConsoleFormatter {
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()), true)
    }

    /// Unstyled output for file sinks.
    pub fn plain(sink: Box<dyn Write>) -> Self {
        Self::new(sink, false)
    }

    fn new(sink: Box<dyn Write>, colorize: bool) -> Self {
        Self {
            sink,
            colorize,
            scoped: Regex::new(r"^(@[^/]+)/(.*)$").unwrap(),
            summary: CheckSummary::default(),
        }
    }

    fn package_name(&self, ident: &str) -> String {
        if !self.colorize {
            return ident.to_string();
        }
        match self.scoped.captures(ident) {
            Some(captures) => format!(
                "{}{}",
                format!("{}/", &captures[1]).truecolor(255, 167, 38),
                captures[2].truecolor(238, 113, 5)
            ),
            None => ident.truecolor(238, 113, 5).to_string(),
        }
    }

    fn version(&self, version: &str) -> String {
        if self.colorize {
            version.truecolor(0, 153, 133).bold().to_string()
        } else {
            version.to_string()
        }
    }

    fn dependency_type(&self, ty: DependencyType) -> String {
        if self.colorize {
            ty.as_str().truecolor(0, 153, 133).to_string()
        } else {
            ty.as_str().to_string()
        }
    }

    fn reason(&self, reason: &str) -> String {
        if self.colorize {
            reason.bold().to_string()
        } else {
            reason.to_string()
        }
    }

    fn log_error(&mut self, line: String) -> Result<()> {
        self.summary.record_error();
        writeln!(self.sink, "{line}")?;
        Ok(())
    }
}

impl Formatter for ConsoleFormatter {
    fn invalid_dependency_version(
        &mut self,
        package_name: &str,
        dependency_type: DependencyType,
        dependency_name: &str,
        required_range: &str,
        actual_range: &str,
    ) -> Result<()> {
        let line = format!(
            "{} must depend on {} version {} via {}, but depends on version {} instead",
            self.package_name(package_name),
            self.package_name(dependency_name),
            self.version(required_range),
            self.dependency_type(dependency_type),
            self.version(actual_range),
        );
        self.log_error(line)
    }

    fn missing_dependency(
        &mut self,
        package_name: &str,
        dependency_type: DependencyType,
        dependency_name: &str,
        required_range: &str,
    ) -> Result<()> {
        let line = format!(
            "{} must depend on {} version {} via {}, but doesn't",
            self.package_name(package_name),
            self.package_name(dependency_name),
            self.version(required_range),
            self.dependency_type(dependency_type),
        );
        self.log_error(line)
    }

    fn extraneous_dependency(
        &mut self,
        package_name: &str,
        dependency_type: DependencyType,
        dependency_name: &str,
        actual_range: &str,
    ) -> Result<()> {
        let line = format!(
            "{} has an extraneous dependency on {} version {} via {}",
            self.package_name(package_name),
            self.package_name(dependency_name),
            self.version(actual_range),
            self.dependency_type(dependency_type),
        );
        self.log_error(line)
    }

    fn invalid_dependency(
        &mut self,
        package_name: &str,
        dependency_type: DependencyType,
        dependency_name: &str,
        reason: Option<&str>,
    ) -> Result<()> {
        let line = format!(
            "{} has an invalid dependency on {} via {} (invalid because {})",
            self.package_name(package_name),
            self.package_name(dependency_name),
            self.dependency_type(dependency_type),
            self.reason(reason.unwrap_or("null")),
        );
        self.log_error(line)
    }

    fn complete(&mut self) -> Result<CheckSummary> {
        if self.summary.errors > 0 {
            let count = format!("{} errors", self.summary.errors);
            let styled = if self.colorize {
                count.truecolor(214, 64, 64).bold().to_string()
            } else {
                count
            };
            writeln!(self.sink, "Found {styled}")?;
        } else {
            writeln!(self.sink, "No errors found")?;
        }
        self.sink.flush()?;
        Ok(self.summary)
    }
}
