// SPDX-License-Identifier: PMPL-1.0-or-later

//! Workspace discovery and the package model
//!
//! The root is found by walking up from the starting directory to the first
//! `package.json` carrying a `workspaces` key; member locations then come
//! from `yarn --silent workspaces info`. A directory whose manifests never
//! declare workspaces degrades to a single-package model rooted at the
//! nearest manifest, with no yarn involvement.
//!
//! All collections are ordered maps so that everything downstream, fact
//! projection and predicate enumeration alike, sees one deterministic order.

use crate::types::DependencyType;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

/// Fallback name for workspace roots whose manifest has no `name`.
pub const ROOT_NAME_FALLBACK: &str = "<workspace root>";

#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("no package.json found in {} or any parent directory", .start.display())]
    RootNotFound { start: PathBuf },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to launch yarn: {0}")]
    YarnLaunch(std::io::Error),

    #[error("yarn workspaces info failed with {status}: {stderr}")]
    YarnFailed {
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("unreadable yarn workspaces listing: {0}")]
    YarnListing(serde_json::Error),
}

/// One workspace package: identity, manifest, and its dependency maps split
/// out per collection for cheap lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRecord {
    pub name: String,
    pub version: Option<String>,
    /// Path of the package directory relative to the workspace root, with
    /// `.` for the root package itself.
    pub location: String,
    pub manifest: serde_json::Map<String, Value>,
    dependencies: BTreeMap<String, String>,
    dev_dependencies: BTreeMap<String, String>,
    peer_dependencies: BTreeMap<String, String>,
}

impl PackageRecord {
    pub fn from_manifest(
        name: String,
        location: String,
        manifest: serde_json::Map<String, Value>,
    ) -> Self {
        let version = manifest
            .get("version")
            .and_then(Value::as_str)
            .map(str::to_string);
        let dependencies = dependency_map(&manifest, DependencyType::Dependencies);
        let dev_dependencies = dependency_map(&manifest, DependencyType::DevDependencies);
        let peer_dependencies = dependency_map(&manifest, DependencyType::PeerDependencies);
        Self {
            name,
            version,
            location,
            manifest,
            dependencies,
            dev_dependencies,
            peer_dependencies,
        }
    }

    /// A minimal record for building in-memory workspaces.
    pub fn new(name: &str, version: &str, location: &str) -> Self {
        let mut manifest = serde_json::Map::new();
        manifest.insert("name".to_string(), Value::String(name.to_string()));
        manifest.insert("version".to_string(), Value::String(version.to_string()));
        Self::from_manifest(name.to_string(), location.to_string(), manifest)
    }

    /// Declares a dependency, keeping the manifest and the split maps in
    /// step with each other.
    pub fn add_dependency(&mut self, ty: DependencyType, name: &str, range: &str) {
        let collection = self
            .manifest
            .entry(ty.as_str().to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
        if let Value::Object(entries) = collection {
            entries.insert(name.to_string(), Value::String(range.to_string()));
        }
        let entries = match ty {
            DependencyType::Dependencies => &mut self.dependencies,
            DependencyType::DevDependencies => &mut self.dev_dependencies,
            DependencyType::PeerDependencies => &mut self.peer_dependencies,
        };
        entries.insert(name.to_string(), range.to_string());
    }

    pub fn dependencies(&self, ty: DependencyType) -> &BTreeMap<String, String> {
        match ty {
            DependencyType::Dependencies => &self.dependencies,
            DependencyType::DevDependencies => &self.dev_dependencies,
            DependencyType::PeerDependencies => &self.peer_dependencies,
        }
    }
}

/// The loaded workspace: packages keyed by name, sorted.
#[derive(Debug, Clone)]
pub struct WorkspaceInfo {
    pub root_package_name: String,
    pub workspace_directory: PathBuf,
    packages: BTreeMap<String, PackageRecord>,
}

impl WorkspaceInfo {
    /// Loads the workspace containing `start_dir`.
    pub fn load(start_dir: &Path) -> Result<Self, WorkspaceError> {
        let start = start_dir
            .canonicalize()
            .map_err(|source| WorkspaceError::Io {
                path: start_dir.to_path_buf(),
                source,
            })?;
        match find_root(&start)? {
            Root::Workspace(dir) => Self::load_workspace(&dir),
            Root::Single(dir) => Self::load_single(&dir),
        }
    }

    fn load_workspace(root: &Path) -> Result<Self, WorkspaceError> {
        let listing = yarn_workspaces_info(root)?;
        let mut records = Vec::new();
        for (name, entry) in &listing {
            let manifest_path = root.join(&entry.location).join("package.json");
            let manifest = read_manifest(&manifest_path)?;
            records.push(PackageRecord::from_manifest(
                name.clone(),
                entry.location.clone(),
                manifest,
            ));
        }
        let root_manifest = read_manifest(&root.join("package.json"))?;
        let root_package_name = manifest_name(&root_manifest);
        records.push(PackageRecord::from_manifest(
            root_package_name.clone(),
            ".".to_string(),
            root_manifest,
        ));
        Ok(Self::from_records(root, root_package_name, records))
    }

    fn load_single(dir: &Path) -> Result<Self, WorkspaceError> {
        let manifest = read_manifest(&dir.join("package.json"))?;
        let name = manifest_name(&manifest);
        let record = PackageRecord::from_manifest(name.clone(), ".".to_string(), manifest);
        Ok(Self::from_records(dir, name, vec![record]))
    }

    /// Assembles a workspace from prebuilt records, for embedders and tests.
    pub fn from_records(
        workspace_directory: impl Into<PathBuf>,
        root_package_name: impl Into<String>,
        records: Vec<PackageRecord>,
    ) -> Self {
        let packages = records
            .into_iter()
            .map(|record| (record.name.clone(), record))
            .collect();
        Self {
            root_package_name: root_package_name.into(),
            workspace_directory: workspace_directory.into(),
            packages,
        }
    }

    pub fn package(&self, name: &str) -> Option<&PackageRecord> {
        self.packages.get(name)
    }

    /// Packages in name order.
    pub fn packages(&self) -> impl Iterator<Item = &PackageRecord> {
        self.packages.values()
    }

    pub fn package_count(&self) -> usize {
        self.packages.len()
    }
}

enum Root {
    Workspace(PathBuf),
    Single(PathBuf),
}

fn find_root(start: &Path) -> Result<Root, WorkspaceError> {
    let mut nearest: Option<PathBuf> = None;
    for dir in start.ancestors() {
        let manifest_path = dir.join("package.json");
        if !manifest_path.exists() {
            continue;
        }
        if nearest.is_none() {
            nearest = Some(dir.to_path_buf());
        }
        let manifest = read_manifest(&manifest_path)?;
        if manifest.contains_key("workspaces") {
            return Ok(Root::Workspace(dir.to_path_buf()));
        }
    }
    match nearest {
        Some(dir) => Ok(Root::Single(dir)),
        None => Err(WorkspaceError::RootNotFound {
            start: start.to_path_buf(),
        }),
    }
}

fn read_manifest(path: &Path) -> Result<serde_json::Map<String, Value>, WorkspaceError> {
    let text = fs::read_to_string(path).map_err(|source| WorkspaceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| WorkspaceError::Manifest {
        path: path.to_path_buf(),
        source,
    })
}

fn manifest_name(manifest: &serde_json::Map<String, Value>) -> String {
    manifest
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or(ROOT_NAME_FALLBACK)
        .to_string()
}

#[derive(Debug, Deserialize)]
struct YarnPackageInfo {
    location: String,
}

fn yarn_workspaces_info(root: &Path) -> Result<BTreeMap<String, YarnPackageInfo>, WorkspaceError> {
    let output = Command::new("yarn")
        .args(["--silent", "workspaces", "info"])
        .current_dir(root)
        .output()
        .map_err(WorkspaceError::YarnLaunch)?;
    if !output.status.success() {
        return Err(WorkspaceError::YarnFailed {
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_yarn_listing(&stdout).map_err(WorkspaceError::YarnListing)
}

fn parse_yarn_listing(listing: &str) -> Result<BTreeMap<String, YarnPackageInfo>, serde_json::Error> {
    serde_json::from_str(listing)
}

fn dependency_map(
    manifest: &serde_json::Map<String, Value>,
    ty: DependencyType,
) -> BTreeMap<String, String> {
    manifest
        .get(ty.as_str())
        .and_then(Value::as_object)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|(name, range)| {
                    range.as_str().map(|range| (name.clone(), range.to_string()))
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn manifest(text: &str) -> serde_json::Map<String, Value> {
        serde_json::from_str(text).expect("test manifest should parse")
    }

    #[test]
    fn test_from_manifest_splits_dependency_collections() {
        let record = PackageRecord::from_manifest(
            "app".to_string(),
            "packages/app".to_string(),
            manifest(
                r#"{
                    "name": "app",
                    "version": "1.0.0",
                    "dependencies": {"lib": "^1.0.0", "left-pad": "1.3.0"},
                    "devDependencies": {"tool": "2.0.0"}
                }"#,
            ),
        );

        assert_eq!(record.version.as_deref(), Some("1.0.0"));
        assert_eq!(
            record.dependencies(DependencyType::Dependencies).len(),
            2,
            "both runtime dependencies should be captured"
        );
        assert_eq!(
            record
                .dependencies(DependencyType::DevDependencies)
                .get("tool")
                .map(String::as_str),
            Some("2.0.0")
        );
        assert!(record
            .dependencies(DependencyType::PeerDependencies)
            .is_empty());
    }

    #[test]
    fn test_non_string_ranges_are_skipped() {
        let record = PackageRecord::from_manifest(
            "odd".to_string(),
            ".".to_string(),
            manifest(r#"{"dependencies": {"good": "1.0.0", "bad": 42}}"#),
        );

        let dependencies = record.dependencies(DependencyType::Dependencies);
        assert!(dependencies.contains_key("good"));
        assert!(!dependencies.contains_key("bad"));
        assert!(record.version.is_none());
    }

    #[test]
    fn test_add_dependency_updates_manifest_and_map() {
        let mut record = PackageRecord::new("app", "1.0.0", ".");
        record.add_dependency(DependencyType::PeerDependencies, "react", "^18.0.0");

        assert_eq!(
            record
                .dependencies(DependencyType::PeerDependencies)
                .get("react")
                .map(String::as_str),
            Some("^18.0.0")
        );
        let declared = record
            .manifest
            .get("peerDependencies")
            .and_then(Value::as_object)
            .and_then(|entries| entries.get("react"))
            .and_then(Value::as_str);
        assert_eq!(declared, Some("^18.0.0"));
    }

    #[test]
    fn test_parse_yarn_listing() {
        let listing = parse_yarn_listing(
            r#"{
                "pkg-a": {"location": "packages/a", "workspaceDependencies": ["pkg-b"]},
                "pkg-b": {"location": "packages/b", "workspaceDependencies": []}
            }"#,
        )
        .expect("listing should parse");

        assert_eq!(listing.len(), 2);
        assert_eq!(listing["pkg-a"].location, "packages/a");
        assert_eq!(listing["pkg-b"].location, "packages/b");
    }

    #[test]
    fn test_find_root_prefers_workspace_manifest_over_nearest() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let root = dir.path();
        fs::write(
            root.join("package.json"),
            r#"{"name": "root", "workspaces": ["packages/*"]}"#,
        )
        .expect("root manifest should be written");
        let nested = root.join("packages").join("app");
        fs::create_dir_all(&nested).expect("nested dirs should be created");
        fs::write(nested.join("package.json"), r#"{"name": "app"}"#)
            .expect("nested manifest should be written");

        match find_root(&nested).expect("root should be found") {
            Root::Workspace(found) => assert_eq!(found, root),
            Root::Single(found) => panic!("expected workspace root, got single at {found:?}"),
        }
    }

    #[test]
    fn test_load_falls_back_to_single_package() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        fs::write(
            dir.path().join("package.json"),
            r#"{"name": "solo", "version": "3.1.4", "dependencies": {"lib": "^1.0.0"}}"#,
        )
        .expect("manifest should be written");

        let workspace = WorkspaceInfo::load(dir.path()).expect("single package should load");
        assert_eq!(workspace.root_package_name, "solo");
        assert_eq!(workspace.package_count(), 1);
        let record = workspace.package("solo").expect("solo should be present");
        assert_eq!(record.location, ".");
        assert_eq!(record.version.as_deref(), Some("3.1.4"));
    }

    #[test]
    fn test_load_errors_without_any_manifest() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let nested = dir.path().join("empty");
        fs::create_dir_all(&nested).expect("nested dir should be created");

        let error = WorkspaceInfo::load(&nested).expect_err("load should fail");
        assert!(
            matches!(error, WorkspaceError::RootNotFound { .. }),
            "expected RootNotFound, got {error:?}"
        );
    }

    #[test]
    fn test_root_name_fallback() {
        assert_eq!(manifest_name(&manifest("{}")), ROOT_NAME_FALLBACK);
        assert_eq!(manifest_name(&manifest(r#"{"name": "real"}"#)), "real");
    }
}
