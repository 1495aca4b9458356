use std::path::PathBuf;

use slipway_core::GradleVersion;

use crate::{BuildCommand, ClasspathEntry};

/// The durable record of the last applied managed configuration for one
/// workspace project.
///
/// Always reflects the outcome of the most recent successful synchronization;
/// deleted when the project is uncoupled from its build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistentModel {
    /// Workspace project name the record belongs to.
    pub project: String,
    pub build_dir: PathBuf,
    pub build_script_path: PathBuf,
    pub subproject_paths: Vec<PathBuf>,
    pub classpath: Vec<ClasspathEntry>,
    pub derived_resources: Vec<PathBuf>,
    /// Names of the linked folders created from the model.
    pub linked_resources: Vec<String>,
    pub managed_natures: Vec<String>,
    pub managed_builders: Vec<BuildCommand>,
    pub has_auto_build_tasks: bool,
    pub gradle_version: GradleVersion,
}

/// Builder for [`PersistentModel`].
///
/// Seeded from the previous persisted value so fields an updater does not
/// recompute this pass survive unchanged; the final `build()` result is
/// committed with a single store save at the end of the per-project pass.
#[derive(Debug, Clone)]
pub struct PersistentModelBuilder {
    previous: Option<PersistentModel>,
    project: String,
    build_dir: PathBuf,
    build_script_path: PathBuf,
    subproject_paths: Vec<PathBuf>,
    classpath: Vec<ClasspathEntry>,
    derived_resources: Vec<PathBuf>,
    linked_resources: Vec<String>,
    managed_natures: Vec<String>,
    managed_builders: Vec<BuildCommand>,
    has_auto_build_tasks: bool,
    gradle_version: GradleVersion,
}

fn default_gradle_version() -> GradleVersion {
    // Paired with `parse("0")` always succeeding; only reached for projects
    // that never reported a version.
    GradleVersion::parse("0").unwrap_or_else(|| unreachable!())
}

impl PersistentModelBuilder {
    /// Builder for a project that has never been synchronized.
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            previous: None,
            project: project.into(),
            build_dir: PathBuf::from("build"),
            build_script_path: PathBuf::from("build.gradle"),
            subproject_paths: Vec::new(),
            classpath: Vec::new(),
            derived_resources: Vec::new(),
            linked_resources: Vec::new(),
            managed_natures: Vec::new(),
            managed_builders: Vec::new(),
            has_auto_build_tasks: false,
            gradle_version: default_gradle_version(),
        }
    }

    /// Builder pre-populated with every field of the previous record.
    pub fn from_previous(previous: PersistentModel) -> Self {
        Self {
            project: previous.project.clone(),
            build_dir: previous.build_dir.clone(),
            build_script_path: previous.build_script_path.clone(),
            subproject_paths: previous.subproject_paths.clone(),
            classpath: previous.classpath.clone(),
            derived_resources: previous.derived_resources.clone(),
            linked_resources: previous.linked_resources.clone(),
            managed_natures: previous.managed_natures.clone(),
            managed_builders: previous.managed_builders.clone(),
            has_auto_build_tasks: previous.has_auto_build_tasks,
            gradle_version: previous.gradle_version.clone(),
            previous: Some(previous),
        }
    }

    /// The value this builder was seeded from, if any.
    pub fn previous(&self) -> Option<&PersistentModel> {
        self.previous.as_ref()
    }

    pub fn build_dir(&mut self, build_dir: PathBuf) -> &mut Self {
        self.build_dir = build_dir;
        self
    }

    pub fn build_script_path(&mut self, path: PathBuf) -> &mut Self {
        self.build_script_path = path;
        self
    }

    pub fn subproject_paths(&mut self, paths: Vec<PathBuf>) -> &mut Self {
        self.subproject_paths = paths;
        self
    }

    pub fn classpath(&mut self, classpath: Vec<ClasspathEntry>) -> &mut Self {
        self.classpath = classpath;
        self
    }

    pub fn derived_resources(&mut self, paths: Vec<PathBuf>) -> &mut Self {
        self.derived_resources = paths;
        self
    }

    pub fn linked_resources(&mut self, names: Vec<String>) -> &mut Self {
        self.linked_resources = names;
        self
    }

    pub fn managed_natures(&mut self, natures: Vec<String>) -> &mut Self {
        self.managed_natures = natures;
        self
    }

    pub fn managed_builders(&mut self, builders: Vec<BuildCommand>) -> &mut Self {
        self.managed_builders = builders;
        self
    }

    pub fn has_auto_build_tasks(&mut self, value: bool) -> &mut Self {
        self.has_auto_build_tasks = value;
        self
    }

    pub fn gradle_version(&mut self, version: GradleVersion) -> &mut Self {
        self.gradle_version = version;
        self
    }

    pub fn build(&self) -> PersistentModel {
        PersistentModel {
            project: self.project.clone(),
            build_dir: self.build_dir.clone(),
            build_script_path: self.build_script_path.clone(),
            subproject_paths: self.subproject_paths.clone(),
            classpath: self.classpath.clone(),
            derived_resources: self.derived_resources.clone(),
            linked_resources: self.linked_resources.clone(),
            managed_natures: self.managed_natures.clone(),
            managed_builders: self.managed_builders.clone(),
            has_auto_build_tasks: self.has_auto_build_tasks,
            gradle_version: self.gradle_version.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn sample_model() -> PersistentModel {
        PersistentModel {
            project: "app".to_string(),
            build_dir: PathBuf::from("target"),
            build_script_path: PathBuf::from("build.gradle.kts"),
            subproject_paths: vec![PathBuf::from("core")],
            classpath: vec![ClasspathEntry::library("/deps/guava.jar")],
            derived_resources: vec![PathBuf::from("target")],
            linked_resources: vec!["shared-src".to_string()],
            managed_natures: vec!["org.eclipse.jdt.core.javanature".to_string()],
            managed_builders: vec![BuildCommand::new("org.eclipse.jdt.core.javabuilder")],
            has_auto_build_tasks: true,
            gradle_version: GradleVersion::parse("8.5").unwrap(),
        }
    }

    #[test]
    fn unmodified_builder_reproduces_previous_model() {
        let previous = sample_model();
        let rebuilt = PersistentModelBuilder::from_previous(previous.clone()).build();
        assert_eq!(rebuilt, previous);
    }

    #[test]
    fn overrides_touch_only_their_field() {
        let previous = sample_model();
        let mut builder = PersistentModelBuilder::from_previous(previous.clone());
        builder.build_dir(PathBuf::from("out"));
        let next = builder.build();

        assert_eq!(next.build_dir, PathBuf::from("out"));
        assert_eq!(next.classpath, previous.classpath);
        assert_eq!(next.managed_natures, previous.managed_natures);
    }
}
