//! Workspace-local model snapshot (`.slipway/model.json`).
//!
//! The snapshot is produced by a build-side plugin after Gradle runs and
//! read here instead of invoking Gradle again. It carries the complete
//! project tree of the root build plus the root trees of included builds.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use slipway_core::{check_cancelled, CancellationToken, CoreError};
use slipway_model::ProjectModel;

use crate::connection::{ToolingConnection, ToolingConnector};

/// Schema version for `.slipway/model.json`.
pub const MODEL_SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Relative path to the workspace-local model snapshot file.
pub const MODEL_SNAPSHOT_REL_PATH: &str = ".slipway/model.json";

/// On-disk shape of the model snapshot file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModelSnapshotFile {
    pub schema_version: u32,
    pub root: ProjectModel,
    /// Root projects of included builds, in composite order.
    #[serde(default)]
    pub included: Vec<ProjectModel>,
}

/// The model of one Gradle invocation: the root build and any included
/// builds of the composite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildModel {
    pub root: ProjectModel,
    pub included: Vec<ProjectModel>,
}

impl BuildModel {
    pub fn new(root: ProjectModel) -> Self {
        Self {
            root,
            included: Vec::new(),
        }
    }

    /// Root projects of every build in the composite, root build first.
    pub fn build_roots(&self) -> impl Iterator<Item = &ProjectModel> {
        std::iter::once(&self.root).chain(self.included.iter())
    }

    /// Every project of every build, each tree flattened parent first.
    pub fn all_projects(&self) -> Vec<&ProjectModel> {
        self.build_roots().flat_map(|root| root.all()).collect()
    }
}

/// Connector backed by the snapshot file of a build root directory.
pub struct SnapshotConnector {
    root_project_dir: PathBuf,
    executed_tasks: Arc<Mutex<Vec<String>>>,
}

impl SnapshotConnector {
    pub fn new(root_project_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_project_dir: root_project_dir.into(),
            executed_tasks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.root_project_dir.join(MODEL_SNAPSHOT_REL_PATH)
    }

    /// Task paths passed to `run_tasks` so far, in execution order.
    pub fn executed_tasks(&self) -> Vec<String> {
        self.executed_tasks.lock().clone()
    }
}

impl ToolingConnector for SnapshotConnector {
    fn connect(&self) -> Result<Box<dyn ToolingConnection>, CoreError> {
        Ok(Box::new(SnapshotConnection {
            path: self.snapshot_path(),
            executed_tasks: self.executed_tasks.clone(),
        }))
    }
}

struct SnapshotConnection {
    path: PathBuf,
    executed_tasks: Arc<Mutex<Vec<String>>>,
}

impl ToolingConnection for SnapshotConnection {
    fn fetch_build_model(&mut self, token: &CancellationToken) -> Result<BuildModel, CoreError> {
        check_cancelled(token)?;
        let snapshot = read_snapshot(&self.path)?;
        Ok(BuildModel {
            root: snapshot.root,
            included: snapshot.included,
        })
    }

    fn run_tasks(
        &mut self,
        tasks: &[String],
        token: &CancellationToken,
    ) -> Result<(), CoreError> {
        check_cancelled(token)?;
        tracing::debug!(target: "slipway.tooling", ?tasks, "recording task execution");
        self.executed_tasks.lock().extend(tasks.iter().cloned());
        Ok(())
    }

    fn close(&mut self) {}
}

fn read_snapshot(path: &Path) -> Result<ModelSnapshotFile, CoreError> {
    let text = fs::read_to_string(path).map_err(|err| {
        CoreError::ModelFetch(format!("cannot read {}: {err}", path.display()))
    })?;
    let snapshot: ModelSnapshotFile = serde_json::from_str(&text).map_err(|err| {
        CoreError::ModelFetch(format!("invalid snapshot {}: {err}", path.display()))
    })?;
    if snapshot.schema_version != MODEL_SNAPSHOT_SCHEMA_VERSION {
        return Err(CoreError::ModelFetch(format!(
            "unsupported snapshot schema version {} in {}",
            snapshot.schema_version,
            path.display()
        )));
    }
    Ok(snapshot)
}

/// Write a snapshot file for a build root; used by tests and the CLI's
/// import path.
pub fn write_snapshot(
    root_project_dir: &Path,
    snapshot: &ModelSnapshotFile,
) -> Result<(), CoreError> {
    let path = root_project_dir.join(MODEL_SNAPSHOT_REL_PATH);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let text = serde_json::to_string_pretty(snapshot)
        .map_err(|err| CoreError::Message(format!("cannot serialize snapshot: {err}")))?;
    fs::write(&path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn sample_snapshot() -> ModelSnapshotFile {
        let mut root = ProjectModel::new("root", "/checkout/root");
        root.children
            .push(ProjectModel::new("app", "/checkout/root/app"));
        ModelSnapshotFile {
            schema_version: MODEL_SNAPSHOT_SCHEMA_VERSION,
            root,
            included: vec![ProjectModel::new("tooling", "/checkout/tooling")],
        }
    }

    #[test]
    fn fetches_the_model_from_the_snapshot_file() {
        let dir = tempfile::tempdir().unwrap();
        write_snapshot(dir.path(), &sample_snapshot()).unwrap();

        let connector = SnapshotConnector::new(dir.path());
        let mut connection = connector.connect().unwrap();
        let model = connection
            .fetch_build_model(&CancellationToken::new())
            .unwrap();

        let names: Vec<_> = model.all_projects().iter().map(|p| p.name.clone()).collect();
        assert_eq!(names, ["root", "app", "tooling"]);
    }

    #[test]
    fn rejects_a_future_schema_version() {
        let dir = tempfile::tempdir().unwrap();
        let mut snapshot = sample_snapshot();
        snapshot.schema_version = MODEL_SNAPSHOT_SCHEMA_VERSION + 1;
        write_snapshot(dir.path(), &snapshot).unwrap();

        let connector = SnapshotConnector::new(dir.path());
        let mut connection = connector.connect().unwrap();
        assert!(connection
            .fetch_build_model(&CancellationToken::new())
            .is_err());
    }

    #[test]
    fn missing_snapshot_is_a_model_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let connector = SnapshotConnector::new(dir.path());
        let mut connection = connector.connect().unwrap();
        let err = connection
            .fetch_build_model(&CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, CoreError::ModelFetch(_)));
    }

    #[test]
    fn records_executed_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let connector = SnapshotConnector::new(dir.path());
        let mut connection = connector.connect().unwrap();
        connection
            .run_tasks(
                &[":app:generateSources".to_string()],
                &CancellationToken::new(),
            )
            .unwrap();
        drop(connection);
        assert_eq!(connector.executed_tasks(), [":app:generateSources"]);
    }
}
