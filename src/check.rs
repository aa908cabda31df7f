// SPDX-License-Identifier: PMPL-1.0-or-later

//! The `check` command

use crate::constraints::Constraints;
use crate::processor;
use crate::report::{
    CombineFormatter, ConsoleFormatter, Formatter, MachineFormatter, OutputFormat, OutputTarget,
    TapFormatter,
};
use crate::workspace::WorkspaceInfo;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct CheckOptions {
    /// Directory to start workspace discovery from; defaults to the
    /// current directory.
    pub project_dir: Option<PathBuf>,
    /// Suppress the stdout report.
    pub quiet: bool,
    /// Extra sinks, each `FORMAT:PATH` or a bare path.
    pub outputs: Vec<String>,
    /// Always exit 0, findings notwithstanding.
    pub exit_zero: bool,
}

/// Runs the check and returns the process exit code. Output targets are
/// validated before anything is evaluated.
pub fn run(options: &CheckOptions) -> Result<i32> {
    let targets = options
        .outputs
        .iter()
        .map(|value| OutputTarget::parse(value))
        .collect::<Result<Vec<_>>>()?;

    let start_dir = match &options.project_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    let workspace = Arc::new(WorkspaceInfo::load(&start_dir)?);
    let constraints = Constraints::load(workspace.clone())?;
    let report = processor::process(&constraints)?;

    let mut sinks: Vec<Box<dyn Formatter>> = Vec::new();
    if !options.quiet {
        sinks.push(Box::new(ConsoleFormatter::stdout()));
    }
    for target in &targets {
        sinks.push(formatter_for_target(target)?);
    }

    let mut combined = CombineFormatter::new(sinks);
    processor::report_findings(&workspace, &report, &mut combined)?;
    let summary = combined.complete()?;

    if options.exit_zero || summary.is_clean() {
        Ok(0)
    } else {
        Ok(1)
    }
}

fn formatter_for_target(target: &OutputTarget) -> Result<Box<dyn Formatter>> {
    let file = File::create(&target.path)
        .with_context(|| format!("failed to create {}", target.path.display()))?;
    let sink: Box<dyn Write> = Box::new(BufWriter::new(file));
    Ok(match target.format {
        OutputFormat::Text => Box::new(ConsoleFormatter::plain(sink)),
        OutputFormat::Tap => Box::new(TapFormatter::new(sink)),
        OutputFormat::Json => Box::new(MachineFormatter::new(OutputFormat::Json, sink)),
        OutputFormat::Yaml => Box::new(MachineFormatter::new(OutputFormat::Yaml, sink)),
    })
}
