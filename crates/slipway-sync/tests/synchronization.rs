//! End-to-end synchronization scenarios against an in-process workspace and
//! a snapshot-backed tooling connector.

use std::path::Path;
use std::sync::Arc;

use pretty_assertions::assert_eq;

use slipway_core::{
    CancellationToken, CoreError, GRADLE_CLASSPATH_CONTAINER_ID, GRADLE_NATURE_ID, JAVA_NATURE_ID,
};
use slipway_model::{
    ExternalDependency, JavaSourceSettings, PersistentModelStore, ProjectModel, SourceDirectory,
};
use slipway_sync::{NewProjectHandler, SynchronizeBuildOperation};
use slipway_tooling::{
    write_snapshot, BuildConfiguration, ModelProvider, ModelSnapshotFile, SnapshotConnector,
    MODEL_SNAPSHOT_SCHEMA_VERSION,
};
use slipway_workspace::{LocalWorkspace, Workspace};

struct Fixture {
    _tmp: tempfile::TempDir,
    workspace: LocalWorkspace,
    store: PersistentModelStore,
    provider: ModelProvider,
    connector: Arc<SnapshotConnector>,
    build_root: std::path::PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let workspace_root = tmp.path().join("workspace");
        let build_root = workspace_root.join("checkout");
        std::fs::create_dir_all(&build_root).unwrap();

        let connector = Arc::new(SnapshotConnector::new(&build_root));
        let provider = ModelProvider::new(connector.clone());
        Self {
            workspace: LocalWorkspace::new(&workspace_root),
            store: PersistentModelStore::new(tmp.path().join("state")),
            provider,
            connector,
            build_root,
            _tmp: tmp,
        }
    }

    fn publish(&self, root: ProjectModel) {
        write_snapshot(
            &self.build_root,
            &ModelSnapshotFile {
                schema_version: MODEL_SNAPSHOT_SCHEMA_VERSION,
                root,
                included: Vec::new(),
            },
        )
        .unwrap();
    }

    fn operation(&self) -> SynchronizeBuildOperation<'_> {
        SynchronizeBuildOperation::new(
            &self.workspace,
            &self.store,
            &self.provider,
            BuildConfiguration::new(&self.build_root),
        )
    }

    fn sync(&self) -> Vec<slipway_core::SynchronizationProblem> {
        self.operation()
            .run(&CancellationToken::new())
            .unwrap()
            .problems
    }
}

fn java_project(name: &str, dir: &Path) -> ProjectModel {
    let mut model = ProjectModel::new(name, dir);
    model.java_settings = Some(JavaSourceSettings {
        source_level: "17".to_string(),
        target_level: "17".to_string(),
    });
    model.source_directories = vec![SourceDirectory {
        path: "src/main/java".to_string(),
        output: None,
        includes: Vec::new(),
        excludes: Vec::new(),
        attributes: Vec::new(),
    }];
    model.gradle_version = Some("8.5".to_string());
    model
}

#[test]
fn fresh_import_creates_an_open_java_project() {
    let fixture = Fixture::new();
    let mut root = java_project("app", &fixture.build_root);

    let jar = fixture.build_root.join("libs/guava.jar");
    std::fs::create_dir_all(jar.parent().unwrap()).unwrap();
    std::fs::write(&jar, b"jar").unwrap();
    root.classpath = vec![ExternalDependency {
        file: jar,
        source: None,
        exported: false,
        access_rules: Vec::new(),
        attributes: Vec::new(),
    }];
    fixture.publish(root);

    let problems = fixture.sync();
    assert!(problems.is_empty(), "unexpected problems: {problems:?}");

    let info = fixture.workspace.find_project("app").unwrap();
    assert!(info.open);
    let natures = fixture.workspace.natures("app").unwrap();
    assert!(natures.iter().any(|n| n == JAVA_NATURE_ID));
    assert!(natures.iter().any(|n| n == GRADLE_NATURE_ID));

    let container = fixture
        .workspace
        .classpath_container("app", GRADLE_CLASSPATH_CONTAINER_ID)
        .unwrap()
        .unwrap();
    assert_eq!(container.len(), 1);

    // The persistent model is the commit point.
    let persisted = fixture.store.load("app").unwrap();
    assert_eq!(persisted.gradle_version.as_str(), "8.5");
    assert_eq!(persisted.classpath, container);
}

#[test]
fn user_added_nature_survives_resynchronization() {
    let fixture = Fixture::new();
    fixture.publish(java_project("app", &fixture.build_root));
    fixture.sync();

    let mut natures = fixture.workspace.natures("app").unwrap();
    natures.push("custom.nature".to_string());
    fixture.workspace.set_natures("app", natures).unwrap();

    fixture.publish(java_project("app", &fixture.build_root));
    fixture.sync();

    assert!(fixture
        .workspace
        .natures("app")
        .unwrap()
        .iter()
        .any(|n| n == "custom.nature"));
}

#[test]
fn managed_nature_dropped_by_the_model_is_removed() {
    let fixture = Fixture::new();
    fixture.workspace.recognize_nature("vendor.groovy.nature");

    let mut root = java_project("lib", &fixture.build_root);
    root.natures = vec!["vendor.groovy.nature".to_string()];
    fixture.publish(root);
    fixture.sync();
    assert!(fixture
        .workspace
        .natures("lib")
        .unwrap()
        .iter()
        .any(|n| n == "vendor.groovy.nature"));

    fixture.publish(java_project("lib", &fixture.build_root));
    fixture.sync();
    assert!(!fixture
        .workspace
        .natures("lib")
        .unwrap()
        .iter()
        .any(|n| n == "vendor.groovy.nature"));
}

#[test]
fn name_conflict_with_open_project_due_for_rename_is_resolved() {
    let fixture = Fixture::new();

    // First pass: the subproject is called "core".
    let mut root = java_project("root", &fixture.build_root);
    root.children
        .push(java_project("core", &fixture.build_root.join("old-core")));
    fixture.publish(root);
    assert!(fixture.sync().is_empty());

    // Second pass: the old project is renamed away from "core" while a new
    // subproject claims the name.
    let mut root = java_project("root", &fixture.build_root);
    let mut renamed = java_project("core-api", &fixture.build_root.join("old-core"));
    renamed.path = ":core-api".to_string();
    let mut claimant = java_project("core", &fixture.build_root.join("new-core"));
    claimant.path = ":core".to_string();
    // The claimant is reported first, forcing the move-aside.
    root.children.push(claimant);
    root.children.push(renamed);
    fixture.publish(root);
    assert!(fixture.sync().is_empty());

    assert_eq!(
        fixture
            .workspace
            .find_project("core")
            .unwrap()
            .location
            .file_name()
            .unwrap()
            .to_string_lossy(),
        "new-core"
    );
    assert!(fixture.workspace.find_project("core-api").is_some());
}

#[test]
fn name_conflict_with_closed_project_aborts_the_run() {
    let fixture = Fixture::new();

    let mut root = java_project("root", &fixture.build_root);
    root.children
        .push(java_project("core", &fixture.build_root.join("old-core")));
    fixture.publish(root);
    fixture.sync();
    fixture.workspace.close_project("core").unwrap();

    let mut root = java_project("root", &fixture.build_root);
    root.children
        .push(java_project("core", &fixture.build_root.join("new-core")));
    fixture.publish(root);

    let err = fixture
        .operation()
        .run(&CancellationToken::new())
        .unwrap_err();
    assert!(matches!(err, CoreError::UnsupportedConfiguration(_)));
}

#[test]
fn removed_project_is_uncoupled() {
    let fixture = Fixture::new();

    let mut root = java_project("root", &fixture.build_root);
    root.children
        .push(java_project("sub", &fixture.build_root.join("sub")));
    fixture.publish(root);
    fixture.sync();
    assert!(fixture.store.load("sub").is_some());

    fixture.publish(java_project("root", &fixture.build_root));
    fixture.sync();

    let natures = fixture.workspace.natures("sub").unwrap();
    assert!(!natures.iter().any(|n| n == GRADLE_NATURE_ID));
    assert!(fixture.store.load("sub").is_none());
}

#[test]
fn failing_project_is_rolled_back_and_siblings_continue() {
    let fixture = Fixture::new();

    let mut root = java_project("root", &fixture.build_root);
    root.children
        .push(java_project("good", &fixture.build_root.join("good")));
    root.children
        .push(java_project("bad", &fixture.build_root.join("bad")));
    fixture.publish(root);

    // A plain file where the settings directory belongs makes writing the
    // build configuration of this one project fail.
    let bad_dir = fixture.build_root.join("bad");
    std::fs::create_dir_all(&bad_dir).unwrap();
    std::fs::write(bad_dir.join(".settings"), b"").unwrap();

    let problems = fixture.sync();
    assert_eq!(problems.len(), 1, "unexpected problems: {problems:?}");
    assert!(problems[0].is_error());

    // The failed project was rolled back wholesale, its creation included.
    assert!(fixture.workspace.find_project("bad").is_none());
    assert!(fixture.store.load("bad").is_none());

    // The sibling synchronized as usual.
    let info = fixture.workspace.find_project("good").unwrap();
    assert!(info.open);
    assert!(fixture
        .workspace
        .natures("good")
        .unwrap()
        .iter()
        .any(|n| n == GRADLE_NATURE_ID));
    assert!(fixture.store.load("good").is_some());
}

#[test]
fn rename_is_rolled_back_when_the_project_fails_to_synchronize() {
    let fixture = Fixture::new();

    let mut root = java_project("root", &fixture.build_root);
    root.children
        .push(java_project("oldname", &fixture.build_root.join("lib")));
    fixture.publish(root);
    assert!(fixture.sync().is_empty());

    // Block the settings directory of the project so its next pass fails
    // after the rename has happened.
    let settings = fixture.build_root.join("lib/.settings");
    std::fs::remove_dir_all(&settings).unwrap();
    std::fs::write(&settings, b"").unwrap();

    let mut root = java_project("root", &fixture.build_root);
    root.children
        .push(java_project("newname", &fixture.build_root.join("lib")));
    fixture.publish(root);

    let problems = fixture.sync();
    assert_eq!(problems.len(), 1, "unexpected problems: {problems:?}");
    assert!(problems[0].is_error());

    // The rename was part of the batch and rolled back with it.
    assert!(fixture.workspace.find_project("oldname").is_some());
    assert!(fixture.workspace.find_project("newname").is_none());
    assert!(fixture.store.load("oldname").is_some());
}

#[test]
fn duplicate_project_directories_abort_the_run() {
    let fixture = Fixture::new();

    let mut root = java_project("root", &fixture.build_root);
    root.children
        .push(java_project("a", &fixture.build_root.join("dup")));
    root.children
        .push(java_project("b", &fixture.build_root.join("dup")));
    fixture.publish(root);

    let err = fixture
        .operation()
        .run(&CancellationToken::new())
        .unwrap_err();
    assert!(matches!(err, CoreError::UnsupportedConfiguration(_)));
    assert!(fixture.workspace.find_project("a").is_none());
    assert!(fixture.workspace.find_project("b").is_none());
}

#[test]
fn build_at_the_workspace_root_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let workspace_root = tmp.path().join("workspace");
    std::fs::create_dir_all(&workspace_root).unwrap();

    let workspace = LocalWorkspace::new(&workspace_root);
    let store = PersistentModelStore::new(tmp.path().join("state"));
    let connector = Arc::new(SnapshotConnector::new(&workspace_root));
    let provider = ModelProvider::new(connector);

    let operation = SynchronizeBuildOperation::new(
        &workspace,
        &store,
        &provider,
        BuildConfiguration::new(&workspace_root),
    );
    let err = operation.run(&CancellationToken::new()).unwrap_err();
    assert!(matches!(err, CoreError::ImportRootProject(_)));
}

#[test]
fn no_op_handler_never_imports_new_projects() {
    let fixture = Fixture::new();
    fixture.publish(java_project("app", &fixture.build_root));

    let outcome = fixture
        .operation()
        .with_new_project_handler(NewProjectHandler::NoOp)
        .run(&CancellationToken::new())
        .unwrap();
    assert!(outcome.problems.is_empty());
    assert!(fixture.workspace.projects().is_empty());
}

#[test]
fn sync_tasks_run_before_the_model_is_applied() {
    let fixture = Fixture::new();
    let mut root = java_project("app", &fixture.build_root);
    root.sync_tasks = vec![":app:generateSources".to_string()];
    fixture.publish(root);

    fixture.sync();
    assert_eq!(
        fixture.connector.executed_tasks(),
        [":app:generateSources"]
    );
}

#[test]
fn cancelled_token_stops_the_run_immediately() {
    let fixture = Fixture::new();
    fixture.publish(java_project("app", &fixture.build_root));

    let token = CancellationToken::new();
    token.cancel();
    let err = fixture.operation().run(&token).unwrap_err();
    assert!(err.is_cancelled());
}
