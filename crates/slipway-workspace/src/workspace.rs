use std::path::{Path, PathBuf};

use thiserror::Error;

use slipway_model::{BuildCommand, ClasspathAttribute, ClasspathEntry, JavaSourceSettings};

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("project {0} does not exist in the workspace")]
    ProjectNotFound(String),
    #[error("project {0} already exists in the workspace")]
    ProjectAlreadyExists(String),
    #[error("project {0} is closed")]
    ProjectClosed(String),
    #[error("{0} is not a Java project")]
    NotAJavaProject(String),
    #[error("invalid project name {0:?}")]
    InvalidName(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Message(String),
}

/// Identity and state of one workspace project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectInfo {
    pub name: String,
    pub location: PathBuf,
    pub open: bool,
}

/// A folder inside a project that points at a location outside the project
/// directory. Links carrying `from_model` were created by synchronization
/// and are cleaned up when the model stops reporting them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedFolder {
    pub name: String,
    pub location: PathBuf,
    pub from_model: bool,
}

/// A source folder as applied to a Java project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedSourceFolder {
    /// Project-relative path.
    pub path: String,
    pub output: Option<String>,
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
    pub attributes: Vec<ClasspathAttribute>,
}

/// Host workspace surface used by the synchronization engine.
///
/// All mutating calls between `begin_batch` and `commit_batch` form one
/// atomic unit; `rollback_batch` restores the state observed at
/// `begin_batch`. Filesystem contents are not rolled back, only project
/// metadata.
pub trait Workspace: Send + Sync {
    fn root_location(&self) -> PathBuf;

    fn projects(&self) -> Vec<ProjectInfo>;
    fn find_project(&self, name: &str) -> Option<ProjectInfo>;
    fn find_project_at(&self, location: &Path) -> Option<ProjectInfo>;
    fn create_project(&self, name: &str, location: &Path) -> Result<(), WorkspaceError>;
    fn rename_project(&self, from: &str, to: &str) -> Result<(), WorkspaceError>;
    /// Re-read the project's directory so workspace members match the disk.
    fn refresh_project(&self, name: &str) -> Result<(), WorkspaceError>;

    fn natures(&self, project: &str) -> Result<Vec<String>, WorkspaceError>;
    fn set_natures(&self, project: &str, natures: Vec<String>) -> Result<(), WorkspaceError>;
    /// Whether the host understands a nature identifier. Unrecognized
    /// natures from the build model are not applied.
    fn nature_recognized(&self, nature: &str) -> bool;

    fn build_commands(&self, project: &str) -> Result<Vec<BuildCommand>, WorkspaceError>;
    fn set_build_commands(
        &self,
        project: &str,
        commands: Vec<BuildCommand>,
    ) -> Result<(), WorkspaceError>;

    fn linked_folders(&self, project: &str) -> Result<Vec<LinkedFolder>, WorkspaceError>;
    fn create_linked_folder(
        &self,
        project: &str,
        folder: LinkedFolder,
    ) -> Result<(), WorkspaceError>;
    fn delete_folder(&self, project: &str, name: &str) -> Result<(), WorkspaceError>;

    fn derived_resources(&self, project: &str) -> Result<Vec<String>, WorkspaceError>;
    fn set_derived(&self, project: &str, path: &str, derived: bool)
        -> Result<(), WorkspaceError>;

    /// Project-relative path of the member at a filesystem location, through
    /// direct containment or a linked folder. `None` when the location is
    /// not visible from the project.
    fn find_member(&self, project: &str, location: &Path)
        -> Result<Option<String>, WorkspaceError>;

    /// Project-relative path of the first member (in tree order) whose file
    /// name matches. Used to serve dependencies whose reported file is gone
    /// but which exist inside the project tree.
    fn find_member_by_name(
        &self,
        project: &str,
        file_name: &str,
    ) -> Result<Option<String>, WorkspaceError>;

    fn is_java_project(&self, project: &str) -> Result<bool, WorkspaceError>;
    fn source_folders(&self, project: &str) -> Result<Vec<AppliedSourceFolder>, WorkspaceError>;
    fn set_source_folders(
        &self,
        project: &str,
        folders: Vec<AppliedSourceFolder>,
    ) -> Result<(), WorkspaceError>;
    fn output_location(&self, project: &str) -> Result<Option<String>, WorkspaceError>;
    fn set_output_location(&self, project: &str, output: &str) -> Result<(), WorkspaceError>;
    fn compiler_levels(&self, project: &str)
        -> Result<Option<JavaSourceSettings>, WorkspaceError>;
    /// Returns `true` when an option actually changed.
    fn set_compiler_levels(
        &self,
        project: &str,
        settings: &JavaSourceSettings,
    ) -> Result<bool, WorkspaceError>;
    fn classpath_container(
        &self,
        project: &str,
        container: &str,
    ) -> Result<Option<Vec<ClasspathEntry>>, WorkspaceError>;
    fn set_classpath_container(
        &self,
        project: &str,
        container: &str,
        entries: Vec<ClasspathEntry>,
    ) -> Result<(), WorkspaceError>;
    /// Attach an attribute to the raw classpath entry of a container.
    fn set_container_attribute(
        &self,
        project: &str,
        container: &str,
        attribute: ClasspathAttribute,
    ) -> Result<(), WorkspaceError>;
    fn container_attributes(
        &self,
        project: &str,
        container: &str,
    ) -> Result<Vec<ClasspathAttribute>, WorkspaceError>;
    fn schedule_rebuild(&self, project: &str) -> Result<(), WorkspaceError>;

    fn begin_batch(&self);
    fn commit_batch(&self);
    fn rollback_batch(&self);
}

/// RAII batch over a workspace. Rolls back on drop unless committed.
pub struct BatchScope<'a> {
    workspace: &'a dyn Workspace,
    committed: bool,
}

impl<'a> BatchScope<'a> {
    pub fn begin(workspace: &'a dyn Workspace) -> Self {
        workspace.begin_batch();
        Self {
            workspace,
            committed: false,
        }
    }

    pub fn commit(mut self) {
        self.workspace.commit_batch();
        self.committed = true;
    }
}

impl Drop for BatchScope<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.workspace.rollback_batch();
        }
    }
}
