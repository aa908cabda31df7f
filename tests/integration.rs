// SPDX-License-Identifier: PMPL-1.0-or-later

//! Integration tests for covenant v0.4

use covenant::check::{self, CheckOptions};
use covenant::constraints::Constraints;
use covenant::engine::Session;
use covenant::facts;
use covenant::processor::{process, report_findings};
use covenant::report::{
    CheckSummary, ConsoleFormatter, FindingKind, FindingRecord, Formatter, MachineFormatter,
    OutputFormat,
};
use covenant::term::Term;
use covenant::types::DependencyType;
use covenant::workspace::{PackageRecord, WorkspaceInfo};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// A four-package workspace: the client and server disagree on `shared`,
/// the client drags in `left-pad` and a bundler, the server declares a
/// runtime peer.
fn workspace() -> Arc<WorkspaceInfo> {
    let mut client = PackageRecord::new("client", "1.0.0", "packages/client");
    client.add_dependency(DependencyType::Dependencies, "shared", "^1.0.0");
    client.add_dependency(DependencyType::Dependencies, "left-pad", "1.3.0");
    client.add_dependency(DependencyType::DevDependencies, "bundler", "5.0.0");
    let mut server = PackageRecord::new("server", "1.0.0", "packages/server");
    server.add_dependency(DependencyType::Dependencies, "shared", "^2.0.0");
    server.add_dependency(DependencyType::PeerDependencies, "runtime", ">=18");
    let shared = PackageRecord::new("shared", "1.4.0", "packages/shared");
    let root = PackageRecord::new("monorepo", "0.0.0", ".");
    Arc::new(WorkspaceInfo::from_records(
        PathBuf::from("/repo"),
        "monorepo",
        vec![client, server, shared, root],
    ))
}

/// Consult, query, diff, record: the whole pipeline over the fixture.
fn run_pipeline(source: &str) -> (Vec<FindingRecord>, CheckSummary) {
    let workspace = workspace();
    let constraints = Constraints::from_source(workspace.clone(), source);
    let report = process(&constraints).expect("processing should succeed");
    let mut formatter = MachineFormatter::new(OutputFormat::Json, Box::new(std::io::sink()));
    report_findings(&workspace, &report, &mut formatter).expect("reporting should succeed");
    let summary = formatter.complete().expect("completion should succeed");
    (formatter.records().to_vec(), summary)
}

fn project(manifest: &str, constraints: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    fs::write(dir.path().join("package.json"), manifest).expect("manifest should be written");
    fs::write(dir.path().join("constraints.pl"), constraints)
        .expect("constraints should be written");
    dir
}

fn atom(term: Option<&Term>) -> String {
    match term {
        Some(Term::Atom(text)) => text.clone(),
        other => panic!("expected an atom binding, got {other:?}"),
    }
}

#[derive(Clone, Default)]
struct SharedSink(Arc<Mutex<Vec<u8>>>);

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl SharedSink {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).expect("output should be utf-8")
    }
}

#[test]
fn test_inconsistent_ranges_flagged_across_workspace() {
    let (records, summary) = run_pipeline(
        "gen_enforced_dependency_range(PackageName, 'shared', '^1.2.0', dependencies) :-
           package_has_dependency(PackageName, 'shared', _, dependencies).
        ",
    );

    assert_eq!(summary.errors, 2);
    assert_eq!(summary.total, 2);
    assert_eq!(records.len(), 2, "both declaring packages should be flagged");
    assert_eq!(records[0].kind, FindingKind::InvalidDependencyVersion);
    assert_eq!(records[0].package_name, "client");
    assert_eq!(records[0].required_range.as_deref(), Some("^1.2.0"));
    assert_eq!(records[0].actual_range.as_deref(), Some("^1.0.0"));
    assert_eq!(records[1].package_name, "server");
    assert_eq!(records[1].actual_range.as_deref(), Some("^2.0.0"));
}

#[test]
fn test_missing_peer_reported_next_to_a_satisfied_one() {
    let workspace = workspace();
    let constraints = Constraints::from_source(
        workspace.clone(),
        "gen_enforced_dependency_range('client', 'runtime', '>=18', peerDependencies).
         gen_enforced_dependency_range('server', 'runtime', '>=18', peerDependencies).
        ",
    );
    let report = process(&constraints).expect("processing should succeed");

    let sink = SharedSink::default();
    let mut formatter = ConsoleFormatter::plain(Box::new(sink.clone()));
    report_findings(&workspace, &report, &mut formatter).expect("reporting should succeed");
    let summary = formatter.complete().expect("completion should succeed");

    assert_eq!(summary.errors, 1, "the server's declaration satisfies its rule");
    assert_eq!(
        sink.text(),
        "client must depend on runtime version >=18 via peerDependencies, but doesn't\n\
         Found 1 errors\n"
    );
}

#[test]
fn test_banned_dependency_reported_only_where_declared() {
    let (records, summary) = run_pipeline(
        "gen_invalid_dependency(PackageName, 'left-pad', dependencies, 'use padStart instead') :-
           package(PackageName).
        ",
    );

    assert_eq!(summary.errors, 1);
    assert_eq!(records.len(), 1, "the rule fires for every package but only one declares it");
    assert_eq!(records[0].kind, FindingKind::InvalidDependency);
    assert_eq!(records[0].package_name, "client");
    assert_eq!(records[0].dependency_name, "left-pad");
    assert_eq!(records[0].reason.as_deref(), Some("use padStart instead"));
}

#[test]
fn test_must_not_depend_marks_declared_copy_extraneous() {
    let (records, summary) = run_pipeline(
        "gen_enforced_dependency_range(PackageName, 'bundler', null, devDependencies) :-
           package(PackageName).
        ",
    );

    assert_eq!(summary.errors, 1);
    assert_eq!(summary.total, 4);
    let kinds: Vec<FindingKind> = records.iter().map(|record| record.kind).collect();
    assert_eq!(
        kinds,
        vec![
            FindingKind::ExtraneousDependency,
            FindingKind::ValidDependency,
            FindingKind::ValidDependency,
            FindingKind::ValidDependency,
        ]
    );
    assert_eq!(records[0].package_name, "client");
    assert_eq!(records[0].actual_range.as_deref(), Some("5.0.0"));
    assert!(records[1].required_range.is_none());
}

#[test]
fn test_version_guard_rejects_stale_ranges() {
    let (records, summary) = run_pipeline(
        "gen_invalid_dependency(PackageName, 'shared', dependencies, 'does not admit shared 2.x') :-
           package_has_dependency(PackageName, 'shared', Range, dependencies),
           \\+ version_matches(Range, '2.0.0').
        ",
    );

    assert_eq!(summary.errors, 1);
    assert_eq!(records.len(), 1, "the server's ^2.0.0 admits 2.0.0 and passes the guard");
    assert_eq!(records[0].kind, FindingKind::InvalidDependency);
    assert_eq!(records[0].package_name, "client");
}

#[test]
fn test_version_minimum_backs_computed_floors() {
    let (records, summary) = run_pipeline(
        "gen_enforced_dependency_range('client', 'esbuild', Minimum, devDependencies) :-
           version_minimum('>=0.19.2, <0.20.0', Minimum).
        ",
    );

    assert_eq!(summary.errors, 1);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, FindingKind::MissingDependency);
    assert_eq!(records[0].dependency_name, "esbuild");
    assert_eq!(records[0].required_range.as_deref(), Some("0.19.2"));
}

#[test]
fn test_check_writes_machine_readable_report() {
    let dir = project(
        r#"{"name": "solo", "version": "1.0.0", "dependencies": {"lib": "^1.0.0"}}"#,
        "gen_enforced_dependency_range('solo', 'lib', '^2.0.0', dependencies).\n",
    );
    let out_path = dir.path().join("report.json");
    let code = check::run(&CheckOptions {
        project_dir: Some(dir.path().to_path_buf()),
        quiet: true,
        outputs: vec![format!("json:{}", out_path.display())],
        exit_zero: false,
    })
    .expect("check should run");

    assert_eq!(code, 1);
    let document: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out_path).expect("report should be written"))
            .expect("report should be valid json");
    assert_eq!(document["summary"]["errors"], 1);
    assert_eq!(document["summary"]["total"], 1);
    assert_eq!(document["findings"][0]["kind"], "invalidDependencyVersion");
    assert_eq!(document["findings"][0]["packageName"], "solo");
    assert_eq!(document["findings"][0]["requiredRange"], "^2.0.0");
    assert_eq!(document["findings"][0]["actualRange"], "^1.0.0");
}

#[test]
fn test_reports_are_byte_identical_across_runs() {
    let dir = project(
        r#"{"name": "solo", "version": "1.0.0", "dependencies": {"lib": "^1.0.0"}}"#,
        "gen_enforced_dependency_range('solo', 'lib', '^2.0.0', dependencies).
         gen_enforced_dependency_range('solo', 'node', '>=18.0.0', peerDependencies).
        ",
    );
    let first_path = dir.path().join("first.tap");
    let second_path = dir.path().join("second.tap");
    for path in [&first_path, &second_path] {
        check::run(&CheckOptions {
            project_dir: Some(dir.path().to_path_buf()),
            quiet: true,
            outputs: vec![format!("tap:{}", path.display())],
            exit_zero: false,
        })
        .expect("check should run");
    }

    let first = fs::read(&first_path).expect("first report should be written");
    let second = fs::read(&second_path).expect("second report should be written");
    assert_eq!(first, second, "repeated runs should produce identical reports");
    assert_eq!(
        String::from_utf8(first).expect("output should be utf-8"),
        "not ok 1 - solo must depend on lib version ^2.0.0 via dependencies, \
         but depends on version ^1.0.0 instead\n\
         not ok 2 - solo must depend on node version >=18.0.0 via peerDependencies, but doesn't\n\
         1..2\n"
    );
}

#[test]
fn test_generated_source_is_a_loadable_program() {
    let workspace = workspace();
    let generated = facts::full_source(
        &workspace,
        "gen_enforced_dependency_range('client', 'shared', '^1.2.0', dependencies).\n",
    );

    // A plain session with no native predicates can still answer project
    // queries from the emitted facts alone.
    let mut session = Session::default();
    session
        .consult(&generated)
        .expect("generated source should consult");

    let versions: Vec<String> = session
        .query("package_version('shared', Version).")
        .map(|answer| {
            let answer = answer.expect("query should succeed");
            atom(answer.get("Version"))
        })
        .collect();
    assert_eq!(versions, vec!["1.4.0".to_string()]);

    let declared: Vec<(String, String)> = session
        .query("package_has_dependency('client', Dependency, Range, dependencies).")
        .map(|answer| {
            let answer = answer.expect("query should succeed");
            (atom(answer.get("Dependency")), atom(answer.get("Range")))
        })
        .collect();
    assert_eq!(
        declared,
        vec![
            ("left-pad".to_string(), "1.3.0".to_string()),
            ("shared".to_string(), "^1.0.0".to_string()),
        ]
    );
}

#[test]
fn test_unbound_rule_variable_aborts_the_check() {
    let dir = project(
        r#"{"name": "solo", "version": "1.0.0"}"#,
        "gen_enforced_dependency_range(PackageName, DependencyName, '1.0.0', dependencies) :-
           package(PackageName).
        ",
    );
    let error = check::run(&CheckOptions {
        project_dir: Some(dir.path().to_path_buf()),
        quiet: true,
        ..CheckOptions::default()
    })
    .expect_err("an unbound rule variable should be fatal");
    assert!(
        error.to_string().contains("must bind DependencyName"),
        "unexpected error: {error}"
    );
}
