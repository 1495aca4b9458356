use slipway_core::{CoreError, GRADLE_NATURE_ID, JAVA_NATURE_ID};
use slipway_model::{PersistentModelBuilder, ProjectModel};
use slipway_workspace::Workspace;

use crate::merge;
use crate::updaters::ws_err;

/// Merge the model's natures into the project, preserving user-added ones.
/// The Gradle nature is always applied, and the Java nature whenever the
/// model describes a Java project. Natures the host does not recognize are
/// skipped.
pub fn update_natures(
    workspace: &dyn Workspace,
    project: &str,
    model: &ProjectModel,
    builder: &mut PersistentModelBuilder,
) -> Result<(), CoreError> {
    let mut model_natures: Vec<String> = model
        .natures
        .iter()
        .filter(|n| workspace.nature_recognized(n))
        .cloned()
        .collect();
    if model.is_java_project() && !model_natures.iter().any(|n| n == JAVA_NATURE_ID) {
        model_natures.push(JAVA_NATURE_ID.to_string());
    }
    if !model_natures.iter().any(|n| n == GRADLE_NATURE_ID) {
        model_natures.push(GRADLE_NATURE_ID.to_string());
    }

    let current = workspace.natures(project).map_err(ws_err)?;
    let managed = builder
        .previous()
        .map(|p| p.managed_natures.clone())
        .unwrap_or_default();

    let result = merge::calculate(&current, &model_natures, &managed);
    workspace
        .set_natures(project, result.next_elements)
        .map_err(ws_err)?;
    builder.managed_natures(result.next_managed);
    Ok(())
}
