//! On-demand classpath container resolution.
//!
//! The host's Java tooling asks for container entries whenever it rebuilds a
//! project's classpath. Requests are served straight from the persistent
//! model; the build tool is only consulted when an update is explicitly
//! requested, which schedules a regular synchronization instead of an ad hoc
//! fetch.

use slipway_core::GRADLE_CLASSPATH_CONTAINER_ID;
use slipway_model::{ClasspathEntry, PersistentModelStore};
use slipway_workspace::{Workspace, WorkspaceError};

#[derive(Clone)]
pub struct GradleClasspathContainer {
    store: PersistentModelStore,
}

impl GradleClasspathContainer {
    pub fn new(store: PersistentModelStore) -> Self {
        Self { store }
    }

    pub fn id(&self) -> &'static str {
        GRADLE_CLASSPATH_CONTAINER_ID
    }

    /// Entries for a project. Never-synchronized projects resolve to an
    /// empty container rather than an error so the Java model stays usable.
    pub fn resolve(&self, project: &str) -> Vec<ClasspathEntry> {
        self.store
            .load(project)
            .map(|model| model.classpath)
            .unwrap_or_default()
    }

    /// Push the persisted entries into the workspace's container slot.
    pub fn apply_to(
        &self,
        workspace: &dyn Workspace,
        project: &str,
    ) -> Result<(), WorkspaceError> {
        workspace.set_classpath_container(
            project,
            GRADLE_CLASSPATH_CONTAINER_ID,
            self.resolve(project),
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use slipway_model::PersistentModelBuilder;

    use super::*;

    #[test]
    fn resolves_from_the_persistent_model_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = PersistentModelStore::new(dir.path());

        let mut builder = PersistentModelBuilder::new("app");
        builder.classpath(vec![ClasspathEntry::library("/deps/guava.jar")]);
        store.save(&builder.build()).unwrap();

        let container = GradleClasspathContainer::new(store);
        assert_eq!(
            container.resolve("app"),
            vec![ClasspathEntry::library("/deps/guava.jar")]
        );
        assert_eq!(container.resolve("unknown"), Vec::new());
    }
}
