//! Location invariants checked before any workspace mutation. A violation
//! aborts the whole run.

use std::collections::BTreeMap;
use std::path::PathBuf;

use slipway_core::CoreError;
use slipway_model::ProjectModel;
use slipway_workspace::Workspace;

/// No two reported projects may share a directory, and none may sit at the
/// workspace root itself.
pub fn validate_project_locations(
    workspace: &dyn Workspace,
    reported: &[&ProjectModel],
) -> Result<(), CoreError> {
    let root = workspace.root_location();
    let mut by_dir: BTreeMap<PathBuf, &str> = BTreeMap::new();

    for model in reported {
        if model.project_dir == root {
            return Err(CoreError::unsupported(format!(
                "project {} is located at the workspace root {}",
                model.name,
                root.display()
            )));
        }
        if let Some(previous) = by_dir.insert(model.project_dir.clone(), model.name.as_str()) {
            return Err(CoreError::unsupported(format!(
                "projects {previous} and {} share the directory {}",
                model.name,
                model.project_dir.display()
            )));
        }
    }
    Ok(())
}
