use slipway_core::{CoreError, MarkerLocation, SynchronizationProblem, CORE_PLUGIN_ID};
use slipway_model::ProjectModel;
use slipway_workspace::{AppliedSourceFolder, Workspace};

use crate::updaters::ws_err;

const DEFAULT_OUTPUT: &str = "bin";

/// Apply the model's source folders and the shared default output location.
///
/// The IDE owns the default output wholesale, so a per-folder output nested
/// inside it would be clobbered on clean builds. When that happens the
/// default output moves into its own subfolder and a warning is recorded.
pub fn update_source_folders(
    workspace: &dyn Workspace,
    project: &str,
    model: &ProjectModel,
    problems: &mut Vec<SynchronizationProblem>,
) -> Result<(), CoreError> {
    if !model.is_java_project() {
        return Ok(());
    }

    let folders: Vec<AppliedSourceFolder> = model
        .source_directories
        .iter()
        .map(|dir| AppliedSourceFolder {
            path: dir.path.clone(),
            output: dir.output.clone(),
            includes: dir.includes.clone(),
            excludes: dir.excludes.clone(),
            attributes: dir.attributes.clone(),
        })
        .collect();

    let mut default_output = model
        .output_location
        .clone()
        .unwrap_or_else(|| DEFAULT_OUTPUT.to_string());
    let nested = folders.iter().any(|folder| {
        folder
            .output
            .as_deref()
            .is_some_and(|output| nests_inside(output, &default_output))
    });
    if nested {
        let relocated = format!("{default_output}/default");
        problems.push(SynchronizationProblem::warning(
            CORE_PLUGIN_ID,
            MarkerLocation::Project(project.to_string()),
            format!(
                "default output location {default_output} overlaps a source folder output, \
                 relocated to {relocated}"
            ),
            None,
        ));
        default_output = relocated;
    }

    workspace.set_source_folders(project, folders).map_err(ws_err)?;
    workspace
        .set_output_location(project, &default_output)
        .map_err(ws_err)?;
    Ok(())
}

fn nests_inside(output: &str, default_output: &str) -> bool {
    output == default_output
        || output
            .strip_prefix(default_output)
            .is_some_and(|rest| rest.starts_with('/'))
}
