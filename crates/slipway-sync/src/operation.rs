//! The top-level synchronization operation: fetch the reported project
//! tree, validate it, uncouple projects the build no longer contains, then
//! bring every reported project in line with the model.
//!
//! Failure semantics: validation and primary model fetch failures abort the
//! run; everything per-project is isolated into collected problems so one
//! broken project never stops its siblings.

use std::path::{Path, PathBuf};

use slipway_core::{
    check_cancelled, CancellationToken, CoreError, MarkerLocation, ProgressSender,
    SynchronizationProblem, CORE_PLUGIN_ID, GRADLE_NATURE_ID,
};
use slipway_model::{PersistentModelBuilder, PersistentModelStore, ProjectModel};
use slipway_tooling::{
    delete_project_configuration, read_project_configuration, write_project_configuration,
    BuildConfiguration, FetchStrategy, ModelProvider, ProjectConfiguration, ScopedConnection,
};
use slipway_workspace::{BatchScope, Workspace};

use crate::configurators::ConfiguratorRunner;
use crate::naming::{ensure_name_is_free, free_root_name, update_project_name};
use crate::updaters;
use crate::validate::validate_project_locations;

/// Policy for reported projects that have no workspace counterpart yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewProjectHandler {
    /// Leave unknown projects alone; only update already-imported ones.
    NoOp,
    /// Import unknown projects and merge their configuration.
    ImportAndMerge,
}

impl NewProjectHandler {
    pub fn imports_new_projects(self) -> bool {
        matches!(self, NewProjectHandler::ImportAndMerge)
    }
}

/// The visible result of a finished run.
#[derive(Debug, Default)]
pub struct SyncOutcome {
    pub problems: Vec<SynchronizationProblem>,
}

impl SyncOutcome {
    pub fn has_errors(&self) -> bool {
        self.problems.iter().any(SynchronizationProblem::is_error)
    }
}

pub struct SynchronizeBuildOperation<'a> {
    workspace: &'a dyn Workspace,
    store: &'a PersistentModelStore,
    provider: &'a ModelProvider,
    build_config: BuildConfiguration,
    configurators: ConfiguratorRunner,
    new_project_handler: NewProjectHandler,
    progress: ProgressSender,
}

impl<'a> SynchronizeBuildOperation<'a> {
    pub fn new(
        workspace: &'a dyn Workspace,
        store: &'a PersistentModelStore,
        provider: &'a ModelProvider,
        build_config: BuildConfiguration,
    ) -> Self {
        Self {
            workspace,
            store,
            provider,
            build_config,
            configurators: ConfiguratorRunner::default(),
            new_project_handler: NewProjectHandler::ImportAndMerge,
            progress: ProgressSender::default(),
        }
    }

    pub fn with_configurators(mut self, configurators: ConfiguratorRunner) -> Self {
        self.configurators = configurators;
        self
    }

    pub fn with_new_project_handler(mut self, handler: NewProjectHandler) -> Self {
        self.new_project_handler = handler;
        self
    }

    pub fn with_progress(mut self, progress: ProgressSender) -> Self {
        self.progress = progress;
        self
    }

    pub fn run(&self, token: &CancellationToken) -> Result<SyncOutcome, CoreError> {
        let root_dir = self.build_config.root_project_dir.clone();
        let progress = self
            .progress
            .start(format!("Synchronizing Gradle build at {}", root_dir.display()));
        let mut problems = Vec::new();

        check_cancelled(token)?;
        self.import_root_project(&root_dir)
            .map_err(CoreError::import_root)?;

        progress.report("Loading the project model");
        check_cancelled(token)?;
        let model = self
            .provider
            .fetch_model(FetchStrategy::ForceReload, token)?
            .ok_or_else(|| CoreError::ModelFetch("no model returned".to_string()))?;
        let reported: Vec<&ProjectModel> = model.all_projects();

        validate_project_locations(self.workspace, &reported)?;

        self.run_sync_tasks(&reported, token, &mut problems)?;

        self.configurators.init_all(&root_dir, &mut problems);

        progress.report("Uncoupling removed projects");
        self.uncouple_removed_projects(&reported, token, &mut problems)?;

        for project_model in &reported {
            check_cancelled(token)?;
            progress.report(format!("Synchronizing project {}", project_model.name));
            self.synchronize_reported_project(project_model, &reported, token, &mut problems)?;
        }

        progress.finish(Some(format!("{} problem(s)", problems.len())));
        Ok(SyncOutcome { problems })
    }

    /// Make sure a workspace project exists for the build root, creating one
    /// named after the root directory when missing. A build located at the
    /// workspace root itself cannot be imported.
    fn import_root_project(&self, root_dir: &Path) -> Result<(), CoreError> {
        if *root_dir == self.workspace.root_location() {
            return Err(CoreError::unsupported(format!(
                "the build at {} collides with the workspace root",
                root_dir.display()
            )));
        }
        if self.workspace.find_project_at(root_dir).is_some() {
            return Ok(());
        }
        if !self.new_project_handler.imports_new_projects() {
            return Ok(());
        }

        let desired = root_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                CoreError::unsupported(format!("{} has no directory name", root_dir.display()))
            })?;
        let name = free_root_name(self.workspace, &desired, root_dir);
        self.workspace
            .create_project(&name, root_dir)
            .map_err(CoreError::other)?;
        self.write_configuration(root_dir)?;
        Ok(())
    }

    /// Run build-side tasks that must execute before the final model state
    /// is read. These are auxiliary; failures are collected, not fatal.
    fn run_sync_tasks(
        &self,
        reported: &[&ProjectModel],
        token: &CancellationToken,
        problems: &mut Vec<SynchronizationProblem>,
    ) -> Result<(), CoreError> {
        let mut tasks: Vec<String> = Vec::new();
        for model in reported {
            for task in &model.sync_tasks {
                if !tasks.contains(task) {
                    tasks.push(task.clone());
                }
            }
        }
        if tasks.is_empty() {
            return Ok(());
        }

        check_cancelled(token)?;
        let outcome = ScopedConnection::open(self.provider.connector().as_ref())
            .and_then(|mut connection| connection.run_tasks(&tasks, token));
        match outcome {
            Ok(()) => Ok(()),
            Err(err) if err.is_cancelled() => Err(err),
            Err(err) => {
                problems.push(SynchronizationProblem::error(
                    CORE_PLUGIN_ID,
                    MarkerLocation::WorkspaceRoot,
                    "running synchronization tasks failed",
                    Some(err.to_string()),
                ));
                Ok(())
            }
        }
    }

    /// Projects carrying the Gradle nature, configured against this build
    /// root, whose directory no longer appears in the reported tree.
    fn uncouple_removed_projects(
        &self,
        reported: &[&ProjectModel],
        token: &CancellationToken,
        problems: &mut Vec<SynchronizationProblem>,
    ) -> Result<(), CoreError> {
        let reported_dirs: Vec<&PathBuf> = reported.iter().map(|m| &m.project_dir).collect();
        for info in self.workspace.projects() {
            if !info.open || reported_dirs.contains(&&info.location) {
                continue;
            }
            let natures = self.workspace.natures(&info.name).map_err(CoreError::other)?;
            if !natures.iter().any(|n| n == GRADLE_NATURE_ID) {
                continue;
            }
            match read_project_configuration(&info.location) {
                Ok(Some(config))
                    if config.build_configuration.root_project_dir
                        == self.build_config.root_project_dir => {}
                _ => continue,
            }

            check_cancelled(token)?;
            tracing::info!(target: "slipway.sync", project = %info.name, "uncoupling project");
            self.workspace
                .refresh_project(&info.name)
                .map_err(CoreError::other)?;
            self.configurators
                .unconfigure_all(&info.name, &info.location, problems);
            let remaining: Vec<String> = natures
                .into_iter()
                .filter(|n| n != GRADLE_NATURE_ID)
                .collect();
            self.workspace
                .set_natures(&info.name, remaining)
                .map_err(CoreError::other)?;
            if let Err(err) = delete_project_configuration(&info.location) {
                problems.push(SynchronizationProblem::warning(
                    CORE_PLUGIN_ID,
                    MarkerLocation::Project(info.name.clone()),
                    "could not remove the build configuration",
                    Some(err.to_string()),
                ));
            }
            self.store.delete(&info.name).map_err(CoreError::other)?;
        }
        Ok(())
    }

    /// Everything touching one project, from resolving its identity to the
    /// last updater, runs inside a single workspace batch; the persistent
    /// model save is the commit point. An error rolls the whole project back,
    /// renames and creation included.
    fn synchronize_reported_project(
        &self,
        model: &ProjectModel,
        reported: &[&ProjectModel],
        token: &CancellationToken,
        problems: &mut Vec<SynchronizationProblem>,
    ) -> Result<(), CoreError> {
        let existing = self.workspace.find_project_at(&model.project_dir);
        match &existing {
            Some(info) if !info.open => {
                // Closed projects are never mutated.
                tracing::debug!(target: "slipway.sync", project = %info.name, "skipping closed project");
                return Ok(());
            }
            None if !self.new_project_handler.imports_new_projects() => {
                return Ok(());
            }
            _ => {}
        }

        let scope = BatchScope::begin(self.workspace);

        // Naming conflicts with a closed occupant are unsupported and abort
        // the run; the scope drop reverts any move-aside rename made so far.
        let name = match existing {
            Some(info) => {
                update_project_name(self.workspace, &info.name, model, reported, token)?
            }
            None => {
                ensure_name_is_free(self.workspace, &model.name, reported, token)?;
                self.workspace
                    .create_project(&model.name, &model.project_dir)
                    .map_err(CoreError::other)?;
                model.name.clone()
            }
        };

        match self.synchronize_open_project(&name, model, problems) {
            Ok(()) => {
                scope.commit();
                Ok(())
            }
            Err(err) if err.is_cancelled() => Err(err),
            Err(err) => {
                problems.push(SynchronizationProblem::error(
                    CORE_PLUGIN_ID,
                    MarkerLocation::Project(name),
                    "synchronizing the project failed",
                    Some(err.to_string()),
                ));
                Ok(())
            }
        }
    }

    fn synchronize_open_project(
        &self,
        name: &str,
        model: &ProjectModel,
        problems: &mut Vec<SynchronizationProblem>,
    ) -> Result<(), CoreError> {
        let mut builder = match self.store.load(name) {
            Some(previous) => PersistentModelBuilder::from_previous(previous),
            None => PersistentModelBuilder::new(name),
        };

        updaters::update_natures(self.workspace, name, model, &mut builder)?;
        updaters::update_build_commands(self.workspace, name, model, &mut builder)?;
        updaters::update_linked_resources(self.workspace, name, model, &mut builder)?;
        updaters::update_derived_folders(self.workspace, name, model, &mut builder)?;
        updaters::update_build_script(model, &mut builder);
        updaters::update_source_folders(self.workspace, name, model, problems)?;
        updaters::update_java_settings(self.workspace, name, model)?;
        updaters::update_classpath_container(self.workspace, name, model, &mut builder, problems)?;
        updaters::update_deployment_attributes(self.workspace, name, model, problems)?;

        if let Some(version) = model.gradle_version() {
            builder.gradle_version(version);
        }
        builder.has_auto_build_tasks(model.auto_build_tasks);

        self.configurators
            .configure_all(name, &model.project_dir, model, problems);

        self.write_configuration(&model.project_dir)?;
        self.store
            .save(&builder.build())
            .map_err(CoreError::other)?;
        Ok(())
    }

    fn write_configuration(&self, project_dir: &Path) -> Result<(), CoreError> {
        write_project_configuration(&ProjectConfiguration {
            project_dir: project_dir.to_path_buf(),
            build_configuration: self.build_config.clone(),
        })
        .map_err(CoreError::other)
    }
}
