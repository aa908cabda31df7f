// SPDX-License-Identifier: PMPL-1.0-or-later

//! Output targets and machine-readable sinks
//!
//! A target is `FORMAT:PATH` or a bare path whose extension picks the
//! format. Unknown explicit formats are rejected up front, before any
//! query runs, so a typo cannot cost a full evaluation.

use crate::report::{CheckSummary, Formatter};
use crate::types::DependencyType;
use anyhow::{anyhow, Result};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Tap,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "text" | "txt" => Some(OutputFormat::Text),
            "tap" => Some(OutputFormat::Tap),
            "json" => Some(OutputFormat::Json),
            "yaml" | "yml" => Some(OutputFormat::Yaml),
            _ => None,
        }
    }

    /// Bare paths fall back to their extension, and to text when even that
    /// is missing or unknown.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|extension| extension.to_str())
            .and_then(Self::parse)
            .unwrap_or(OutputFormat::Text)
    }
}

/// A parsed `--output` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub format: OutputFormat,
    pub path: PathBuf,
}

impl OutputTarget {
    pub fn parse(value: &str) -> Result<Self> {
        if let Some((prefix, rest)) = value.split_once(':') {
            match OutputFormat::parse(prefix) {
                Some(format) => Ok(Self {
                    format,
                    path: PathBuf::from(rest),
                }),
                None => Err(anyhow!("unknown output format {prefix:?} in {value:?}")),
            }
        } else {
            let path = PathBuf::from(value);
            Ok(Self {
                format: OutputFormat::from_path(&path),
                path,
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FindingKind {
    InvalidDependencyVersion,
    MissingDependency,
    ExtraneousDependency,
    InvalidDependency,
    ValidDependency,
}

/// One finding as exported to JSON and YAML sinks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FindingRecord {
    pub kind: FindingKind,
    pub package_name: String,
    pub dependency_name: String,
    pub dependency_type: DependencyType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FindingsDocument<'a> {
    findings: &'a [FindingRecord],
    summary: CheckSummary,
}

/// Collects findings and serializes the lot on `complete`.
pub struct MachineFormatter {
    format: OutputFormat,
    sink: Box<dyn Write>,
    records: Vec<FindingRecord>,
    summary: CheckSummary,
}

impl MachineFormatter {
    pub fn new(format: OutputFormat, sink: Box<dyn Write>) -> Self {
        Self {
            format,
            sink,
            records: Vec::new(),
            summary: CheckSummary::default(),
        }
    }

    pub fn records(&self) -> &[FindingRecord] {
        &self.records
    }

    fn push_error(&mut self, record: FindingRecord) {
        self.summary.record_error();
        self.records.push(record);
    }
}

impl Formatter for MachineFormatter {
    fn invalid_dependency_version(
        &mut self,
        package_name: &str,
        dependency_type: DependencyType,
        dependency_name: &str,
        required_range: &str,
        actual_range: &str,
    ) -> Result<()> {
        self.push_error(FindingRecord {
            kind: FindingKind::InvalidDependencyVersion,
            package_name: package_name.to_string(),
            dependency_name: dependency_name.to_string(),
            dependency_type,
            required_range: Some(required_range.to_string()),
            actual_range: Some(actual_range.to_string()),
            reason: None,
        });
        Ok(())
    }

    fn missing_dependency(
        &mut self,
        package_name: &str,
        dependency_type: DependencyType,
        dependency_name: &str,
        required_range: &str,
    ) -> Result<()> {
        self.push_error(FindingRecord {
            kind: FindingKind::MissingDependency,
            package_name: package_name.to_string(),
            dependency_name: dependency_name.to_string(),
            dependency_type,
            required_range: Some(required_range.to_string()),
            actual_range: None,
            reason: None,
        });
        Ok(())
    }

    fn extraneous_dependency(
        &mut self,
        package_name: &str,
        dependency_type: DependencyType,
        dependency_name: &str,
        actual_range: &str,
    ) -> Result<()> {
        self.push_error(FindingRecord {
            kind: FindingKind::ExtraneousDependency,
            package_name: package_name.to_string(),
            dependency_name: dependency_name.to_string(),
            dependency_type,
            required_range: None,
            actual_range: Some(actual_range.to_string()),
            reason: None,
        });
        Ok(())
    }

    fn invalid_dependency(
        &mut self,
        package_name: &str,
        dependency_type: DependencyType,
        dependency_name: &str,
        reason: Option<&str>,
    ) -> Result<()> {
        self.push_error(FindingRecord {
            kind: FindingKind::InvalidDependency,
            package_name: package_name.to_string(),
            dependency_name: dependency_name.to_string(),
            dependency_type,
            required_range: None,
            actual_range: None,
            reason: reason.map(str::to_string),
        });
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
        self.records.push(FindingRecord {
            kind: FindingKind::ValidDependency,
            package_name: package_name.to_string(),
            dependency_name: dependency_name.to_string(),
            dependency_type,
            required_range: required_range.map(str::to_string),
            actual_range: None,
            reason: None,
        });
        Ok(())
    }

    fn complete(&mut self) -> Result<CheckSummary> {
        let document = FindingsDocument {
            findings: &self.records,
            summary: self.summary,
        };
        let rendered = match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&document)?,
            _ => serde_yaml::to_string(&document)?,
        };
        self.sink.write_all(rendered.as_bytes())?;
        if !rendered.ends_with('\n') {
            self.sink.write_all(b"\n")?;
        }
        self.sink.flush()?;
        Ok(self.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_explicit_format_prefix() {
        let target = OutputTarget::parse("tap:report.out").expect("target should parse");
        assert_eq!(target.format, OutputFormat::Tap);
        assert_eq!(target.path, PathBuf::from("report.out"));
    }

    #[test]
    fn test_parse_infers_format_from_extension() {
        let target = OutputTarget::parse("findings.json").expect("target should parse");
        assert_eq!(target.format, OutputFormat::Json);

        let target = OutputTarget::parse("findings.yml").expect("target should parse");
        assert_eq!(target.format, OutputFormat::Yaml);

        let target = OutputTarget::parse("findings.log").expect("target should parse");
        assert_eq!(target.format, OutputFormat::Text);

        let target = OutputTarget::parse("findings").expect("target should parse");
        assert_eq!(target.format, OutputFormat::Text);
    }

    #[test]
    fn test_parse_rejects_unknown_explicit_format() {
        let error = OutputTarget::parse("sarif:report.sarif")
            .expect_err("unknown format should be rejected");
        assert!(error.to_string().contains("sarif"));
    }

    #[test]
    fn test_format_prefix_keeps_colons_in_path() {
        let target = OutputTarget::parse("json:odd:name.txt").expect("target should parse");
        assert_eq!(target.format, OutputFormat::Json);
        assert_eq!(target.path, PathBuf::from("odd:name.txt"));
    }

    #[test]
    fn test_json_document_shape() {
        let mut formatter = MachineFormatter::new(OutputFormat::Json, Box::new(Vec::new()));
        formatter
            .missing_dependency("app", DependencyType::Dependencies, "lib", "^1.0.0")
            .expect("mark should succeed");
        formatter
            .valid_dependency("app", DependencyType::Dependencies, "ok", Some("1.0.0"))
            .expect("mark should succeed");

        let document = FindingsDocument {
            findings: formatter.records(),
            summary: CheckSummary { errors: 1, total: 2 },
        };
        let json = serde_json::to_value(&document).expect("document should serialize");
        assert_eq!(json["summary"]["errors"], 1);
        assert_eq!(json["findings"][0]["kind"], "missingDependency");
        assert_eq!(json["findings"][0]["dependencyType"], "dependencies");
        assert_eq!(json["findings"][0]["requiredRange"], "^1.0.0");
        assert!(
            json["findings"][0].get("reason").is_none(),
            "absent fields should be skipped"
        );
        assert_eq!(json["findings"][1]["kind"], "validDependency");
    }

    #[test]
    fn test_records_capture_call_order() {
        let mut formatter = MachineFormatter::new(OutputFormat::Yaml, Box::new(Vec::new()));
        formatter
            .extraneous_dependency("app", DependencyType::Dependencies, "left-pad", "1.3.0")
            .expect("mark should succeed");
        formatter
            .invalid_dependency("app", DependencyType::DevDependencies, "evil", Some("banned"))
            .expect("mark should succeed");

        let kinds: Vec<FindingKind> = formatter.records().iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            [FindingKind::ExtraneousDependency, FindingKind::InvalidDependency]
        );
        let summary = formatter.complete().expect("complete should succeed");
        assert_eq!(summary.errors, 2);
    }
}
