use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use slipway_core::GradleVersion;

/// A builder command attached to a workspace project description.
///
/// Equality covers the arguments, so a command whose configuration changed in
/// the build model is treated as a new managed element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildCommand {
    pub name: String,
    #[serde(default)]
    pub arguments: BTreeMap<String, String>,
}

impl BuildCommand {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LinkedResourceKind {
    File,
    Folder,
}

/// A linked resource reported by the build model. Only folder links are
/// materialized in the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedResource {
    pub name: String,
    pub kind: LinkedResourceKind,
    pub location: PathBuf,
}

/// A source directory of a Java project, project-relative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDirectory {
    pub path: String,
    /// Per-folder output location, project-relative.
    pub output: Option<String>,
    #[serde(default)]
    pub includes: Vec<String>,
    #[serde(default)]
    pub excludes: Vec<String>,
    #[serde(default)]
    pub attributes: Vec<ClasspathAttribute>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccessRuleKind {
    Accessible,
    NonAccessible,
    Discouraged,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRule {
    pub kind: AccessRuleKind,
    pub pattern: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClasspathAttribute {
    pub name: String,
    pub value: String,
}

/// An external (binary) dependency reported by the build model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalDependency {
    pub file: PathBuf,
    pub source: Option<PathBuf>,
    #[serde(default)]
    pub exported: bool,
    #[serde(default)]
    pub access_rules: Vec<AccessRule>,
    #[serde(default)]
    pub attributes: Vec<ClasspathAttribute>,
}

/// A dependency on another project of the same build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDependency {
    /// Name of the target workspace project.
    pub target: String,
    #[serde(default)]
    pub exported: bool,
    #[serde(default)]
    pub access_rules: Vec<AccessRule>,
    #[serde(default)]
    pub attributes: Vec<ClasspathAttribute>,
}

/// Source/target language levels of a Java project, e.g. `"1.8"` or `"17"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JavaSourceSettings {
    pub source_level: String,
    pub target_level: String,
}

/// Kind of an applied classpath entry, mirroring the host Java model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClasspathEntryKind {
    /// A binary library on disk or a linked workspace member.
    Library,
    /// A reference to another workspace project.
    Project,
}

/// A classpath entry as applied to the Gradle classpath container and
/// recorded in the persistent model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClasspathEntry {
    pub kind: ClasspathEntryKind,
    /// Library entries use an absolute filesystem path or a workspace path
    /// (`/project/member`); project entries use `/name`.
    pub path: String,
    pub source_path: Option<String>,
    #[serde(default)]
    pub exported: bool,
    #[serde(default)]
    pub access_rules: Vec<AccessRule>,
    #[serde(default)]
    pub attributes: Vec<ClasspathAttribute>,
}

impl ClasspathEntry {
    pub fn library(path: impl Into<String>) -> Self {
        Self {
            kind: ClasspathEntryKind::Library,
            path: path.into(),
            source_path: None,
            exported: false,
            access_rules: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn project(name: &str) -> Self {
        Self {
            kind: ClasspathEntryKind::Project,
            path: format!("/{name}"),
            source_path: None,
            exported: false,
            access_rules: Vec::new(),
            attributes: Vec::new(),
        }
    }
}

/// The immutable project tree snapshot obtained from the build tool's
/// introspection API for one build unit.
///
/// Created fresh on every fetch and discarded after one synchronization pass;
/// the model provider may cache it until invalidated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectModel {
    pub name: String,
    /// Gradle project path within the build, e.g. `:` or `:app`.
    pub path: String,
    pub project_dir: PathBuf,
    pub build_script: Option<PathBuf>,
    pub build_dir: Option<PathBuf>,
    #[serde(default)]
    pub natures: Vec<String>,
    #[serde(default)]
    pub build_commands: Vec<BuildCommand>,
    #[serde(default)]
    pub linked_resources: Vec<LinkedResource>,
    #[serde(default)]
    pub source_directories: Vec<SourceDirectory>,
    pub output_location: Option<String>,
    #[serde(default)]
    pub classpath: Vec<ExternalDependency>,
    #[serde(default)]
    pub project_dependencies: Vec<ProjectDependency>,
    pub java_settings: Option<JavaSourceSettings>,
    #[serde(default)]
    pub classpath_containers: Vec<String>,
    pub gradle_version: Option<String>,
    #[serde(default)]
    pub auto_build_tasks: bool,
    /// Task paths the build wants executed before the final model state is
    /// read (e.g. tasks materializing generated sources).
    #[serde(default)]
    pub sync_tasks: Vec<String>,
    #[serde(default)]
    pub children: Vec<ProjectModel>,
}

impl ProjectModel {
    pub fn new(name: impl Into<String>, project_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: ":".to_string(),
            project_dir: project_dir.into(),
            build_script: None,
            build_dir: None,
            natures: Vec::new(),
            build_commands: Vec::new(),
            linked_resources: Vec::new(),
            source_directories: Vec::new(),
            output_location: None,
            classpath: Vec::new(),
            project_dependencies: Vec::new(),
            java_settings: None,
            classpath_containers: Vec::new(),
            gradle_version: None,
            auto_build_tasks: false,
            sync_tasks: Vec::new(),
            children: Vec::new(),
        }
    }

    /// This project plus all transitive children, parent first.
    pub fn all(&self) -> Vec<&ProjectModel> {
        let mut out = Vec::new();
        self.collect(&mut out);
        out
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a ProjectModel>) {
        out.push(self);
        for child in &self.children {
            child.collect(out);
        }
    }

    pub fn is_java_project(&self) -> bool {
        self.java_settings.is_some() || !self.source_directories.is_empty()
    }

    pub fn gradle_version(&self) -> Option<GradleVersion> {
        self.gradle_version
            .as_deref()
            .and_then(GradleVersion::parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_flattens_parent_first() {
        let mut root = ProjectModel::new("root", "/build/root");
        let mut app = ProjectModel::new("app", "/build/root/app");
        app.children.push(ProjectModel::new("app-core", "/build/root/app/core"));
        root.children.push(app);
        root.children.push(ProjectModel::new("lib", "/build/root/lib"));

        let names: Vec<_> = root.all().into_iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["root", "app", "app-core", "lib"]);
    }
}
