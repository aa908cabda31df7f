// SPDX-License-Identifier: PMPL-1.0-or-later

//! Constraints file loading

use crate::facts;
use crate::workspace::WorkspaceInfo;
use anyhow::{bail, Context, Result};
use std::fs;
use std::sync::Arc;

/// File names probed in the workspace root, in order.
pub const CONSTRAINTS_FILENAMES: [&str; 2] = ["constraints.pl", "constraints.pro"];

/// A loaded rule set bound to the workspace it constrains.
#[derive(Debug)]
pub struct Constraints {
    workspace: Arc<WorkspaceInfo>,
    source: String,
}

impl Constraints {
    /// Reads the constraints file from the workspace root.
    pub fn load(workspace: Arc<WorkspaceInfo>) -> Result<Self> {
        let directory = workspace.workspace_directory.clone();
        for filename in CONSTRAINTS_FILENAMES {
            let path = directory.join(filename);
            if path.exists() {
                let source = fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                return Ok(Self { workspace, source });
            }
        }
        bail!(
            "couldn't find constraints.pl or constraints.pro to load in {}",
            directory.display()
        );
    }

    /// Builds constraints directly from source text, for embedders and
    /// tests.
    pub fn from_source(workspace: Arc<WorkspaceInfo>, source: impl Into<String>) -> Self {
        Self {
            workspace,
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn workspace(&self) -> &WorkspaceInfo {
        &self.workspace
    }

    pub(crate) fn workspace_arc(&self) -> Arc<WorkspaceInfo> {
        self.workspace.clone()
    }

    /// The standalone program text equivalent to this rule set, workspace
    /// facts included.
    pub fn full_source(&self) -> String {
        facts::full_source(&self.workspace, &self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn workspace_at(directory: PathBuf) -> Arc<WorkspaceInfo> {
        Arc::new(WorkspaceInfo::from_records(directory, "root", vec![]))
    }

    #[test]
    fn test_load_prefers_constraints_pl() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        fs::write(dir.path().join("constraints.pl"), "% primary\n")
            .expect("constraints.pl should be written");
        fs::write(dir.path().join("constraints.pro"), "% secondary\n")
            .expect("constraints.pro should be written");

        let constraints = Constraints::load(workspace_at(dir.path().to_path_buf()))
            .expect("constraints should load");
        assert_eq!(constraints.source(), "% primary\n");
    }

    #[test]
    fn test_load_falls_back_to_constraints_pro() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        fs::write(dir.path().join("constraints.pro"), "% secondary\n")
            .expect("constraints.pro should be written");

        let constraints = Constraints::load(workspace_at(dir.path().to_path_buf()))
            .expect("constraints should load");
        assert_eq!(constraints.source(), "% secondary\n");
    }

    #[test]
    fn test_load_error_names_the_directory() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let error = Constraints::load(workspace_at(dir.path().to_path_buf()))
            .expect_err("load should fail without a constraints file");
        let message = error.to_string();
        assert!(
            message.contains("constraints.pl"),
            "error should name the expected file: {message}"
        );
        assert!(
            message.contains(&dir.path().display().to_string()),
            "error should name the searched directory: {message}"
        );
    }

    #[test]
    fn test_from_source_keeps_text_verbatim() {
        let constraints = Constraints::from_source(
            workspace_at(PathBuf::from("/nowhere")),
            "gen_enforced_dependency_range(P, D, R, T) :- fail.",
        );
        assert_eq!(
            constraints.source(),
            "gen_enforced_dependency_range(P, D, R, T) :- fail."
        );
    }
}
