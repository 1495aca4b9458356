use slipway_core::{CoreError, GRADLE_BUILDER_ID};
use slipway_model::{BuildCommand, PersistentModelBuilder, ProjectModel};
use slipway_workspace::Workspace;

use crate::merge;
use crate::updaters::ws_err;

/// Merge the model's build commands into the project description. The
/// Gradle builder itself is force-appended so coupled projects always build
/// through it, whether or not the model lists it.
pub fn update_build_commands(
    workspace: &dyn Workspace,
    project: &str,
    model: &ProjectModel,
    builder: &mut PersistentModelBuilder,
) -> Result<(), CoreError> {
    let mut model_commands = model.build_commands.clone();
    if !model_commands.iter().any(|c| c.name == GRADLE_BUILDER_ID) {
        model_commands.push(BuildCommand::new(GRADLE_BUILDER_ID));
    }

    let current = workspace.build_commands(project).map_err(ws_err)?;
    let managed = builder
        .previous()
        .map(|p| p.managed_builders.clone())
        .unwrap_or_default();

    let result = merge::calculate(&current, &model_commands, &managed);
    workspace
        .set_build_commands(project, result.next_elements)
        .map_err(ws_err)?;
    builder.managed_builders(result.next_managed);
    Ok(())
}
