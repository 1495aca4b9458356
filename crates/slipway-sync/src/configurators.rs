//! Extension hooks invoked at defined points of a synchronization run.
//!
//! Hooks come from an explicit ordered list injected into the orchestrator.
//! Each invocation is isolated: a failing or panicking hook becomes a
//! collected problem attributed to its id, never an aborted run.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use slipway_core::{panic_payload_to_str, MarkerLocation, SynchronizationProblem};
use slipway_model::ProjectModel;

/// Context handed to `init`; covers the whole build being synchronized.
pub struct InitContext<'a> {
    pub build_root: &'a Path,
    problems: Vec<(MarkerLocation, String, Option<String>, bool)>,
}

impl<'a> InitContext<'a> {
    fn new(build_root: &'a Path) -> Self {
        Self {
            build_root,
            problems: Vec::new(),
        }
    }

    pub fn error(&mut self, message: impl Into<String>, cause: Option<String>) {
        self.problems
            .push((MarkerLocation::WorkspaceRoot, message.into(), cause, true));
    }

    pub fn warning(&mut self, message: impl Into<String>, cause: Option<String>) {
        self.problems
            .push((MarkerLocation::WorkspaceRoot, message.into(), cause, false));
    }
}

/// Context handed to `configure` and `unconfigure` for one project.
pub struct ProjectContext<'a> {
    pub project_name: &'a str,
    pub project_dir: PathBuf,
    /// The reported model for the project; absent during uncoupling.
    pub model: Option<&'a ProjectModel>,
    problems: Vec<(MarkerLocation, String, Option<String>, bool)>,
}

impl<'a> ProjectContext<'a> {
    fn new(project_name: &'a str, project_dir: PathBuf, model: Option<&'a ProjectModel>) -> Self {
        Self {
            project_name,
            project_dir,
            model,
            problems: Vec::new(),
        }
    }

    pub fn error(&mut self, message: impl Into<String>, cause: Option<String>) {
        let location = MarkerLocation::Project(self.project_name.to_string());
        self.problems.push((location, message.into(), cause, true));
    }

    pub fn warning(&mut self, message: impl Into<String>, cause: Option<String>) {
        let location = MarkerLocation::Project(self.project_name.to_string());
        self.problems.push((location, message.into(), cause, false));
    }
}

/// One pluggable synchronization hook.
pub trait ProjectConfigurator: Send + Sync {
    /// Stable identifier used when attributing problems.
    fn id(&self) -> &str;

    fn init(&self, _context: &mut InitContext<'_>) {}
    fn configure(&self, _context: &mut ProjectContext<'_>) {}
    fn unconfigure(&self, _context: &mut ProjectContext<'_>) {}
}

/// Ordered list of configurators with per-hook isolation.
#[derive(Clone, Default)]
pub struct ConfiguratorRunner {
    configurators: Vec<Arc<dyn ProjectConfigurator>>,
}

impl ConfiguratorRunner {
    pub fn new(configurators: Vec<Arc<dyn ProjectConfigurator>>) -> Self {
        Self { configurators }
    }

    pub fn is_empty(&self) -> bool {
        self.configurators.is_empty()
    }

    pub fn init_all(&self, build_root: &Path, problems: &mut Vec<SynchronizationProblem>) {
        for configurator in &self.configurators {
            let mut context = InitContext::new(build_root);
            let outcome = catch_unwind(AssertUnwindSafe(|| configurator.init(&mut context)));
            collect(configurator.as_ref(), context.problems, outcome, problems);
        }
    }

    pub fn configure_all(
        &self,
        project_name: &str,
        project_dir: &Path,
        model: &ProjectModel,
        problems: &mut Vec<SynchronizationProblem>,
    ) {
        for configurator in &self.configurators {
            let mut context =
                ProjectContext::new(project_name, project_dir.to_path_buf(), Some(model));
            let outcome = catch_unwind(AssertUnwindSafe(|| configurator.configure(&mut context)));
            collect(configurator.as_ref(), context.problems, outcome, problems);
        }
    }

    pub fn unconfigure_all(
        &self,
        project_name: &str,
        project_dir: &Path,
        problems: &mut Vec<SynchronizationProblem>,
    ) {
        for configurator in &self.configurators {
            let mut context = ProjectContext::new(project_name, project_dir.to_path_buf(), None);
            let outcome =
                catch_unwind(AssertUnwindSafe(|| configurator.unconfigure(&mut context)));
            collect(configurator.as_ref(), context.problems, outcome, problems);
        }
    }
}

fn collect(
    configurator: &dyn ProjectConfigurator,
    raised: Vec<(MarkerLocation, String, Option<String>, bool)>,
    outcome: std::thread::Result<()>,
    problems: &mut Vec<SynchronizationProblem>,
) {
    for (location, message, cause, is_error) in raised {
        let problem = if is_error {
            SynchronizationProblem::error(configurator.id(), location, message, cause)
        } else {
            SynchronizationProblem::warning(configurator.id(), location, message, cause)
        };
        problems.push(problem);
    }
    if let Err(payload) = outcome {
        let message = panic_payload_to_str(payload.as_ref());
        tracing::warn!(target: "slipway.sync", id = configurator.id(), %message, "configurator panicked");
        problems.push(SynchronizationProblem::error(
            configurator.id(),
            MarkerLocation::WorkspaceRoot,
            format!("configurator {} failed unexpectedly", configurator.id()),
            Some(message),
        ));
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use slipway_core::Severity;

    use super::*;

    struct Panicking;

    impl ProjectConfigurator for Panicking {
        fn id(&self) -> &str {
            "test.panicking"
        }

        fn configure(&self, _context: &mut ProjectContext<'_>) {
            panic!("boom");
        }
    }

    struct Warning;

    impl ProjectConfigurator for Warning {
        fn id(&self) -> &str {
            "test.warning"
        }

        fn configure(&self, context: &mut ProjectContext<'_>) {
            context.warning("heads up", None);
        }
    }

    #[test]
    fn a_panicking_hook_does_not_stop_the_others() {
        let runner = ConfiguratorRunner::new(vec![Arc::new(Panicking), Arc::new(Warning)]);
        let model = ProjectModel::new("app", "/checkout/app");
        let mut problems = Vec::new();

        runner.configure_all("app", Path::new("/checkout/app"), &model, &mut problems);

        assert_eq!(problems.len(), 2);
        assert_eq!(problems[0].plugin_id, "test.panicking");
        assert_eq!(problems[0].severity, Severity::Error);
        assert_eq!(problems[1].plugin_id, "test.warning");
        assert_eq!(problems[1].severity, Severity::Warning);
    }
}
