use std::collections::BTreeSet;

use slipway_core::{
    CoreError, MarkerLocation, SynchronizationProblem, CORE_PLUGIN_ID,
    GRADLE_CLASSPATH_CONTAINER_ID,
};
use slipway_model::{ClasspathAttribute, ProjectModel};
use slipway_workspace::Workspace;

use crate::updaters::ws_err;

/// Deployment attribute understood by the web tooling platform.
pub const DEPLOYMENT_ATTRIBUTE: &str = "org.eclipse.jst.component.dependency";

/// Marker attribute excluding the container from deployment.
pub const NON_DEPLOYMENT_ATTRIBUTE: &str = "org.eclipse.jst.component.nondependency";

/// Propagate deployment metadata from the model's dependencies to the
/// classpath container.
///
/// The web tooling model supports a single deployment path per container, so
/// conflicting per-dependency paths are reported loudly instead of picking
/// one silently.
pub fn update_deployment_attributes(
    workspace: &dyn Workspace,
    project: &str,
    model: &ProjectModel,
    problems: &mut Vec<SynchronizationProblem>,
) -> Result<(), CoreError> {
    let mut deployment_paths: BTreeSet<String> = BTreeSet::new();
    let mut has_non_deployed = false;
    for dependency in &model.classpath {
        for attribute in &dependency.attributes {
            match attribute.name.as_str() {
                DEPLOYMENT_ATTRIBUTE => {
                    deployment_paths.insert(attribute.value.clone());
                }
                NON_DEPLOYMENT_ATTRIBUTE => has_non_deployed = true,
                _ => {}
            }
        }
    }

    if deployment_paths.len() > 1 {
        problems.push(SynchronizationProblem::error(
            CORE_PLUGIN_ID,
            MarkerLocation::Project(project.to_string()),
            format!(
                "dependencies declare conflicting deployment paths: {}",
                deployment_paths.into_iter().collect::<Vec<_>>().join(", ")
            ),
            None,
        ));
        return Ok(());
    }

    if let Some(path) = deployment_paths.into_iter().next() {
        workspace
            .set_container_attribute(
                project,
                GRADLE_CLASSPATH_CONTAINER_ID,
                ClasspathAttribute {
                    name: DEPLOYMENT_ATTRIBUTE.to_string(),
                    value: path,
                },
            )
            .map_err(ws_err)?;
    } else if has_non_deployed {
        workspace
            .set_container_attribute(
                project,
                GRADLE_CLASSPATH_CONTAINER_ID,
                ClasspathAttribute {
                    name: NON_DEPLOYMENT_ATTRIBUTE.to_string(),
                    value: String::new(),
                },
            )
            .map_err(ws_err)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use slipway_core::Severity;
    use slipway_model::ExternalDependency;
    use slipway_workspace::LocalWorkspace;

    use super::*;

    fn dependency_with(attribute: &str, value: &str) -> ExternalDependency {
        ExternalDependency {
            file: std::path::PathBuf::from("/deps/a.jar"),
            source: None,
            exported: false,
            access_rules: Vec::new(),
            attributes: vec![ClasspathAttribute {
                name: attribute.to_string(),
                value: value.to_string(),
            }],
        }
    }

    #[test]
    fn single_deployment_path_is_applied_to_the_container() {
        let dir = tempfile::tempdir().unwrap();
        let ws = LocalWorkspace::new(dir.path());
        ws.create_project("app", &dir.path().join("app")).unwrap();

        let mut model = ProjectModel::new("app", dir.path().join("app"));
        model.classpath = vec![
            dependency_with(DEPLOYMENT_ATTRIBUTE, "/WEB-INF/lib"),
            dependency_with(DEPLOYMENT_ATTRIBUTE, "/WEB-INF/lib"),
        ];

        let mut problems = Vec::new();
        update_deployment_attributes(&ws, "app", &model, &mut problems).unwrap();

        assert!(problems.is_empty());
        let attributes = ws
            .container_attributes("app", GRADLE_CLASSPATH_CONTAINER_ID)
            .unwrap();
        assert_eq!(attributes.len(), 1);
        assert_eq!(attributes[0].value, "/WEB-INF/lib");
    }

    #[test]
    fn conflicting_deployment_paths_fail_loudly() {
        let dir = tempfile::tempdir().unwrap();
        let ws = LocalWorkspace::new(dir.path());
        ws.create_project("app", &dir.path().join("app")).unwrap();

        let mut model = ProjectModel::new("app", dir.path().join("app"));
        model.classpath = vec![
            dependency_with(DEPLOYMENT_ATTRIBUTE, "/WEB-INF/lib"),
            dependency_with(DEPLOYMENT_ATTRIBUTE, "/WEB-INF/other"),
        ];

        let mut problems = Vec::new();
        update_deployment_attributes(&ws, "app", &model, &mut problems).unwrap();

        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].severity, Severity::Error);
        assert!(ws
            .container_attributes("app", GRADLE_CLASSPATH_CONTAINER_ID)
            .unwrap()
            .is_empty());
    }
}
