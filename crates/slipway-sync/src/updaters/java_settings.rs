use slipway_core::CoreError;
use slipway_model::ProjectModel;
use slipway_workspace::Workspace;

use crate::updaters::ws_err;

/// Apply source and target language levels. A full rebuild is scheduled
/// only when an option actually changed.
pub fn update_java_settings(
    workspace: &dyn Workspace,
    project: &str,
    model: &ProjectModel,
) -> Result<(), CoreError> {
    let Some(settings) = &model.java_settings else {
        return Ok(());
    };
    let changed = workspace
        .set_compiler_levels(project, settings)
        .map_err(ws_err)?;
    if changed {
        tracing::debug!(target: "slipway.sync", project, "compiler options changed, scheduling rebuild");
        workspace.schedule_rebuild(project).map_err(ws_err)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use slipway_model::JavaSourceSettings;
    use slipway_workspace::LocalWorkspace;

    use super::*;

    #[test]
    fn rebuild_is_scheduled_only_on_change() {
        let dir = tempfile::tempdir().unwrap();
        let ws = LocalWorkspace::new(dir.path());
        ws.create_project("app", &dir.path().join("app")).unwrap();

        let mut model = ProjectModel::new("app", dir.path().join("app"));
        model.java_settings = Some(JavaSourceSettings {
            source_level: "17".to_string(),
            target_level: "17".to_string(),
        });
        ws.set_compiler_levels(
            "app",
            &JavaSourceSettings {
                source_level: "17".to_string(),
                target_level: "17".to_string(),
            },
        )
        .unwrap();

        update_java_settings(&ws, "app", &model).unwrap();
        assert!(!ws.rebuild_scheduled("app"));

        model.java_settings = Some(JavaSourceSettings {
            source_level: "21".to_string(),
            target_level: "21".to_string(),
        });
        update_java_settings(&ws, "app", &model).unwrap();
        assert!(ws.rebuild_scheduled("app"));
    }
}
