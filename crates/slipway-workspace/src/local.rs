//! In-process workspace backed by a directory on disk. Project metadata
//! lives in memory; the filesystem is only consulted for member lookups and
//! refreshes. This is the workspace the CLI and the test suite run against.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use walkdir::WalkDir;

use slipway_core::{GRADLE_NATURE_ID, JAVA_NATURE_ID};
use slipway_model::{BuildCommand, ClasspathAttribute, ClasspathEntry, JavaSourceSettings};

use crate::workspace::{
    AppliedSourceFolder, LinkedFolder, ProjectInfo, Workspace, WorkspaceError,
};

#[derive(Debug, Clone, Default)]
struct ContainerState {
    entries: Vec<ClasspathEntry>,
    attributes: Vec<ClasspathAttribute>,
}

#[derive(Debug, Clone)]
struct ProjectRecord {
    location: PathBuf,
    open: bool,
    natures: Vec<String>,
    build_commands: Vec<BuildCommand>,
    linked_folders: BTreeMap<String, LinkedFolder>,
    derived: BTreeSet<String>,
    /// Project-relative member paths from the last refresh.
    members: BTreeSet<String>,
    source_folders: Vec<AppliedSourceFolder>,
    output_location: Option<String>,
    compiler_levels: Option<JavaSourceSettings>,
    containers: BTreeMap<String, ContainerState>,
    rebuild_scheduled: bool,
}

impl ProjectRecord {
    fn new(location: PathBuf) -> Self {
        Self {
            location,
            open: true,
            natures: Vec::new(),
            build_commands: Vec::new(),
            linked_folders: BTreeMap::new(),
            derived: BTreeSet::new(),
            members: BTreeSet::new(),
            source_folders: Vec::new(),
            output_location: None,
            compiler_levels: None,
            containers: BTreeMap::new(),
            rebuild_scheduled: false,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    records: BTreeMap<String, ProjectRecord>,
    /// Snapshot taken at `begin_batch`; present while a batch is open.
    batch_snapshot: Option<BTreeMap<String, ProjectRecord>>,
}

pub struct LocalWorkspace {
    root: PathBuf,
    recognized_natures: RwLock<BTreeSet<String>>,
    state: RwLock<State>,
}

impl LocalWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let mut recognized = BTreeSet::new();
        recognized.insert(GRADLE_NATURE_ID.to_string());
        recognized.insert(JAVA_NATURE_ID.to_string());
        Self {
            root: normalize(&root.into()),
            recognized_natures: RwLock::new(recognized),
            state: RwLock::new(State::default()),
        }
    }

    /// Register an additional nature id as understood by this host.
    pub fn recognize_nature(&self, nature: impl Into<String>) {
        self.recognized_natures.write().insert(nature.into());
    }

    pub fn close_project(&self, name: &str) -> Result<(), WorkspaceError> {
        self.with_record_mut(name, |record| {
            record.open = false;
            Ok(())
        })
    }

    pub fn open_project(&self, name: &str) -> Result<(), WorkspaceError> {
        self.with_record_mut(name, |record| {
            record.open = true;
            Ok(())
        })
    }

    /// Whether a full rebuild was scheduled for the project.
    pub fn rebuild_scheduled(&self, name: &str) -> bool {
        self.state
            .read()
            .records
            .get(name)
            .map(|r| r.rebuild_scheduled)
            .unwrap_or(false)
    }

    fn with_record<T>(
        &self,
        name: &str,
        f: impl FnOnce(&ProjectRecord) -> Result<T, WorkspaceError>,
    ) -> Result<T, WorkspaceError> {
        let state = self.state.read();
        let record = state
            .records
            .get(name)
            .ok_or_else(|| WorkspaceError::ProjectNotFound(name.to_string()))?;
        f(record)
    }

    fn with_record_mut<T>(
        &self,
        name: &str,
        f: impl FnOnce(&mut ProjectRecord) -> Result<T, WorkspaceError>,
    ) -> Result<T, WorkspaceError> {
        let mut state = self.state.write();
        let record = state
            .records
            .get_mut(name)
            .ok_or_else(|| WorkspaceError::ProjectNotFound(name.to_string()))?;
        f(record)
    }
}

fn normalize(path: &Path) -> PathBuf {
    dunce::simplified(path).to_path_buf()
}

fn relative_member(base: &Path, location: &Path) -> Option<String> {
    let rel = location.strip_prefix(base).ok()?;
    let text = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    Some(text)
}

fn validate_name(name: &str) -> Result<(), WorkspaceError> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name == "." || name == ".."
    {
        return Err(WorkspaceError::InvalidName(name.to_string()));
    }
    Ok(())
}

impl Workspace for LocalWorkspace {
    fn root_location(&self) -> PathBuf {
        self.root.clone()
    }

    fn projects(&self) -> Vec<ProjectInfo> {
        self.state
            .read()
            .records
            .iter()
            .map(|(name, record)| ProjectInfo {
                name: name.clone(),
                location: record.location.clone(),
                open: record.open,
            })
            .collect()
    }

    fn find_project(&self, name: &str) -> Option<ProjectInfo> {
        self.state.read().records.get(name).map(|record| ProjectInfo {
            name: name.to_string(),
            location: record.location.clone(),
            open: record.open,
        })
    }

    fn find_project_at(&self, location: &Path) -> Option<ProjectInfo> {
        let location = normalize(location);
        self.state
            .read()
            .records
            .iter()
            .find(|(_, record)| record.location == location)
            .map(|(name, record)| ProjectInfo {
                name: name.clone(),
                location: record.location.clone(),
                open: record.open,
            })
    }

    fn create_project(&self, name: &str, location: &Path) -> Result<(), WorkspaceError> {
        validate_name(name)?;
        let mut state = self.state.write();
        if state.records.contains_key(name) {
            return Err(WorkspaceError::ProjectAlreadyExists(name.to_string()));
        }
        let location = normalize(location);
        std::fs::create_dir_all(&location)?;
        tracing::debug!(target: "slipway.workspace", name, location = %location.display(), "creating project");
        state.records.insert(name.to_string(), ProjectRecord::new(location));
        Ok(())
    }

    fn rename_project(&self, from: &str, to: &str) -> Result<(), WorkspaceError> {
        validate_name(to)?;
        let mut state = self.state.write();
        if state.records.contains_key(to) {
            return Err(WorkspaceError::ProjectAlreadyExists(to.to_string()));
        }
        let record = state
            .records
            .get(from)
            .ok_or_else(|| WorkspaceError::ProjectNotFound(from.to_string()))?;
        if !record.open {
            return Err(WorkspaceError::ProjectClosed(from.to_string()));
        }
        tracing::debug!(target: "slipway.workspace", from, to, "renaming project");
        let record = state.records.remove(from).unwrap_or_else(|| unreachable!());
        state.records.insert(to.to_string(), record);
        Ok(())
    }

    fn refresh_project(&self, name: &str) -> Result<(), WorkspaceError> {
        self.with_record_mut(name, |record| {
            let mut members = BTreeSet::new();
            for entry in WalkDir::new(&record.location)
                .min_depth(1)
                .into_iter()
                .filter_map(Result::ok)
            {
                if let Some(rel) = relative_member(&record.location, entry.path()) {
                    members.insert(rel);
                }
            }
            record.members = members;
            Ok(())
        })
    }

    fn natures(&self, project: &str) -> Result<Vec<String>, WorkspaceError> {
        self.with_record(project, |record| Ok(record.natures.clone()))
    }

    fn set_natures(&self, project: &str, natures: Vec<String>) -> Result<(), WorkspaceError> {
        self.with_record_mut(project, |record| {
            record.natures = natures;
            Ok(())
        })
    }

    fn nature_recognized(&self, nature: &str) -> bool {
        self.recognized_natures.read().contains(nature)
    }

    fn build_commands(&self, project: &str) -> Result<Vec<BuildCommand>, WorkspaceError> {
        self.with_record(project, |record| Ok(record.build_commands.clone()))
    }

    fn set_build_commands(
        &self,
        project: &str,
        commands: Vec<BuildCommand>,
    ) -> Result<(), WorkspaceError> {
        self.with_record_mut(project, |record| {
            record.build_commands = commands;
            Ok(())
        })
    }

    fn linked_folders(&self, project: &str) -> Result<Vec<LinkedFolder>, WorkspaceError> {
        self.with_record(project, |record| {
            Ok(record.linked_folders.values().cloned().collect())
        })
    }

    fn create_linked_folder(
        &self,
        project: &str,
        folder: LinkedFolder,
    ) -> Result<(), WorkspaceError> {
        self.with_record_mut(project, |record| {
            record
                .linked_folders
                .insert(folder.name.clone(), LinkedFolder {
                    location: normalize(&folder.location),
                    ..folder
                });
            Ok(())
        })
    }

    fn delete_folder(&self, project: &str, name: &str) -> Result<(), WorkspaceError> {
        self.with_record_mut(project, |record| {
            record.linked_folders.remove(name);
            record.derived.remove(name);
            Ok(())
        })
    }

    fn derived_resources(&self, project: &str) -> Result<Vec<String>, WorkspaceError> {
        self.with_record(project, |record| {
            Ok(record.derived.iter().cloned().collect())
        })
    }

    fn set_derived(
        &self,
        project: &str,
        path: &str,
        derived: bool,
    ) -> Result<(), WorkspaceError> {
        self.with_record_mut(project, |record| {
            if derived {
                record.derived.insert(path.to_string());
            } else {
                record.derived.remove(path);
            }
            Ok(())
        })
    }

    fn find_member(
        &self,
        project: &str,
        location: &Path,
    ) -> Result<Option<String>, WorkspaceError> {
        let location = normalize(location);
        self.with_record(project, |record| {
            if let Some(rel) = relative_member(&record.location, &location) {
                if record.members.contains(&rel) || location.exists() {
                    return Ok(Some(rel));
                }
                return Ok(None);
            }
            for link in record.linked_folders.values() {
                if location == link.location {
                    return Ok(Some(link.name.clone()));
                }
                if let Some(rel) = relative_member(&link.location, &location) {
                    if location.exists() {
                        return Ok(Some(format!("{}/{rel}", link.name)));
                    }
                }
            }
            Ok(None)
        })
    }

    fn find_member_by_name(
        &self,
        project: &str,
        file_name: &str,
    ) -> Result<Option<String>, WorkspaceError> {
        self.with_record(project, |record| {
            Ok(record
                .members
                .iter()
                .find(|member| member.rsplit('/').next() == Some(file_name))
                .cloned())
        })
    }

    fn is_java_project(&self, project: &str) -> Result<bool, WorkspaceError> {
        self.with_record(project, |record| {
            Ok(record.natures.iter().any(|n| n == JAVA_NATURE_ID))
        })
    }

    fn source_folders(&self, project: &str) -> Result<Vec<AppliedSourceFolder>, WorkspaceError> {
        self.with_record(project, |record| Ok(record.source_folders.clone()))
    }

    fn set_source_folders(
        &self,
        project: &str,
        folders: Vec<AppliedSourceFolder>,
    ) -> Result<(), WorkspaceError> {
        self.with_record_mut(project, |record| {
            record.source_folders = folders;
            Ok(())
        })
    }

    fn output_location(&self, project: &str) -> Result<Option<String>, WorkspaceError> {
        self.with_record(project, |record| Ok(record.output_location.clone()))
    }

    fn set_output_location(&self, project: &str, output: &str) -> Result<(), WorkspaceError> {
        self.with_record_mut(project, |record| {
            record.output_location = Some(output.to_string());
            Ok(())
        })
    }

    fn compiler_levels(
        &self,
        project: &str,
    ) -> Result<Option<JavaSourceSettings>, WorkspaceError> {
        self.with_record(project, |record| Ok(record.compiler_levels.clone()))
    }

    fn set_compiler_levels(
        &self,
        project: &str,
        settings: &JavaSourceSettings,
    ) -> Result<bool, WorkspaceError> {
        self.with_record_mut(project, |record| {
            let changed = record.compiler_levels.as_ref() != Some(settings);
            record.compiler_levels = Some(settings.clone());
            Ok(changed)
        })
    }

    fn classpath_container(
        &self,
        project: &str,
        container: &str,
    ) -> Result<Option<Vec<ClasspathEntry>>, WorkspaceError> {
        self.with_record(project, |record| {
            Ok(record.containers.get(container).map(|c| c.entries.clone()))
        })
    }

    fn set_classpath_container(
        &self,
        project: &str,
        container: &str,
        entries: Vec<ClasspathEntry>,
    ) -> Result<(), WorkspaceError> {
        self.with_record_mut(project, |record| {
            record
                .containers
                .entry(container.to_string())
                .or_default()
                .entries = entries;
            Ok(())
        })
    }

    fn set_container_attribute(
        &self,
        project: &str,
        container: &str,
        attribute: ClasspathAttribute,
    ) -> Result<(), WorkspaceError> {
        self.with_record_mut(project, |record| {
            let attributes = &mut record
                .containers
                .entry(container.to_string())
                .or_default()
                .attributes;
            attributes.retain(|a| a.name != attribute.name);
            attributes.push(attribute);
            Ok(())
        })
    }

    fn container_attributes(
        &self,
        project: &str,
        container: &str,
    ) -> Result<Vec<ClasspathAttribute>, WorkspaceError> {
        self.with_record(project, |record| {
            Ok(record
                .containers
                .get(container)
                .map(|c| c.attributes.clone())
                .unwrap_or_default())
        })
    }

    fn schedule_rebuild(&self, project: &str) -> Result<(), WorkspaceError> {
        self.with_record_mut(project, |record| {
            record.rebuild_scheduled = true;
            Ok(())
        })
    }

    fn begin_batch(&self) {
        let mut state = self.state.write();
        let snapshot = state.records.clone();
        state.batch_snapshot = Some(snapshot);
    }

    fn commit_batch(&self) {
        self.state.write().batch_snapshot = None;
    }

    fn rollback_batch(&self) {
        let mut state = self.state.write();
        if let Some(snapshot) = state.batch_snapshot.take() {
            tracing::debug!(target: "slipway.workspace", "rolling back workspace batch");
            state.records = snapshot;
        }
    }
}
