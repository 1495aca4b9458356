use slipway_core::CoreError;
use slipway_model::{LinkedResourceKind, PersistentModelBuilder, ProjectModel};
use slipway_workspace::{LinkedFolder, Workspace};

use crate::updaters::ws_err;

/// Apply the folder-type linked resources from the model.
///
/// Links created by an earlier pass that the model stopped reporting are
/// deleted, but only while they are still plain model-created links; a
/// resource the user converted is left alone.
pub fn update_linked_resources(
    workspace: &dyn Workspace,
    project: &str,
    model: &ProjectModel,
    builder: &mut PersistentModelBuilder,
) -> Result<(), CoreError> {
    let desired: Vec<&slipway_model::LinkedResource> = model
        .linked_resources
        .iter()
        .filter(|r| r.kind == LinkedResourceKind::Folder)
        .collect();
    let desired_names: Vec<String> = desired.iter().map(|r| r.name.clone()).collect();

    let current = workspace.linked_folders(project).map_err(ws_err)?;
    let previously_created = builder
        .previous()
        .map(|p| p.linked_resources.clone())
        .unwrap_or_default();

    for name in &previously_created {
        if desired_names.contains(name) {
            continue;
        }
        let still_model_link = current
            .iter()
            .any(|link| &link.name == name && link.from_model);
        if still_model_link {
            workspace.delete_folder(project, name).map_err(ws_err)?;
        }
    }

    for resource in desired {
        workspace
            .create_linked_folder(
                project,
                LinkedFolder {
                    name: resource.name.clone(),
                    location: resource.location.clone(),
                    from_model: true,
                },
            )
            .map_err(ws_err)?;
    }

    builder.linked_resources(desired_names);
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use slipway_model::LinkedResource;
    use slipway_workspace::LocalWorkspace;

    use super::*;

    fn link(name: &str, location: &std::path::Path) -> LinkedResource {
        LinkedResource {
            name: name.to_string(),
            kind: LinkedResourceKind::Folder,
            location: location.to_path_buf(),
        }
    }

    #[test]
    fn creates_links_and_removes_stale_ones() {
        let dir = tempfile::tempdir().unwrap();
        let ws = LocalWorkspace::new(dir.path());
        ws.create_project("app", &dir.path().join("app")).unwrap();

        // First pass: the model reports one link.
        let mut model = ProjectModel::new("app", dir.path().join("app"));
        model.linked_resources = vec![link("shared", &dir.path().join("shared"))];
        let mut builder = PersistentModelBuilder::new("app");
        update_linked_resources(&ws, "app", &model, &mut builder).unwrap();
        let first = builder.build();
        assert_eq!(first.linked_resources, vec!["shared".to_string()]);

        // Second pass: the link is gone from the model.
        let model = ProjectModel::new("app", dir.path().join("app"));
        let mut builder = PersistentModelBuilder::from_previous(first);
        update_linked_resources(&ws, "app", &model, &mut builder).unwrap();

        assert!(ws.linked_folders("app").unwrap().is_empty());
        assert!(builder.build().linked_resources.is_empty());
    }

    #[test]
    fn file_links_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let ws = LocalWorkspace::new(dir.path());
        ws.create_project("app", &dir.path().join("app")).unwrap();

        let mut model = ProjectModel::new("app", dir.path().join("app"));
        model.linked_resources = vec![LinkedResource {
            name: "notes.txt".to_string(),
            kind: LinkedResourceKind::File,
            location: dir.path().join("notes.txt"),
        }];
        let mut builder = PersistentModelBuilder::new("app");
        update_linked_resources(&ws, "app", &model, &mut builder).unwrap();

        assert!(ws.linked_folders("app").unwrap().is_empty());
    }

    #[test]
    fn user_converted_resources_are_not_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let ws = LocalWorkspace::new(dir.path());
        ws.create_project("app", &dir.path().join("app")).unwrap();

        // A link recorded as model-created last pass, but meanwhile the user
        // replaced it with their own (from_model flag cleared).
        ws.create_linked_folder(
            "app",
            LinkedFolder {
                name: "shared".to_string(),
                location: dir.path().join("shared"),
                from_model: false,
            },
        )
        .unwrap();

        let mut previous = PersistentModelBuilder::new("app");
        previous.linked_resources(vec!["shared".to_string()]);
        let mut builder = PersistentModelBuilder::from_previous(previous.build());

        let model = ProjectModel::new("app", dir.path().join("app"));
        update_linked_resources(&ws, "app", &model, &mut builder).unwrap();

        assert_eq!(ws.linked_folders("app").unwrap().len(), 1);
    }
}
