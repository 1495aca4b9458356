//! Project identity and name conflict handling.
//!
//! Workspace projects are matched to reported projects by directory, never
//! by name. When a desired name is taken by a different project, the
//! occupying project is moved aside with a deterministic placeholder name,
//! but only when it is open and itself due to be renamed in this same pass.

use std::path::Path;

use slipway_core::{check_cancelled, CancellationToken, CoreError};
use slipway_model::ProjectModel;
use slipway_workspace::{ProjectInfo, Workspace};

/// Hash compatible with `java.lang.String#hashCode`, used to build
/// placeholder names that stay stable across runs.
pub fn java_string_hash(value: &str) -> i32 {
    let mut hash: i32 = 0;
    for unit in value.encode_utf16() {
        hash = hash.wrapping_mul(31).wrapping_add(unit as i32);
    }
    hash
}

fn placeholder_name(name: &str) -> String {
    format!("{name}-{}", java_string_hash(name))
}

/// The workspace project a reported project corresponds to, by directory.
pub fn find_workspace_project<'a>(
    workspace: &'a dyn Workspace,
    project_dir: &Path,
) -> Option<ProjectInfo> {
    workspace.find_project_at(project_dir)
}

/// Whether a workspace project will receive a different name from the
/// reported tree during this pass.
fn scheduled_for_rename(project: &ProjectInfo, reported: &[&ProjectModel]) -> bool {
    reported
        .iter()
        .any(|model| model.project_dir == project.location && model.name != project.name)
}

/// Free `name` for the given reported project, moving an occupying project
/// aside when that is safe.
pub fn ensure_name_is_free(
    workspace: &dyn Workspace,
    name: &str,
    reported: &[&ProjectModel],
    token: &CancellationToken,
) -> Result<(), CoreError> {
    check_cancelled(token)?;
    let Some(occupant) = workspace.find_project(name) else {
        return Ok(());
    };

    if occupant.open && scheduled_for_rename(&occupant, reported) {
        let placeholder = placeholder_name(name);
        tracing::debug!(
            target: "slipway.sync",
            name,
            placeholder,
            "moving occupying project aside"
        );
        workspace
            .rename_project(name, &placeholder)
            .map_err(CoreError::other)?;
        return Ok(());
    }

    Err(CoreError::unsupported(format!(
        "a project named {name} already exists at {} and cannot be moved aside",
        occupant.location.display()
    )))
}

/// Rename a workspace project to the name the model reports, resolving
/// conflicts first. No-op when the names already agree.
pub fn update_project_name(
    workspace: &dyn Workspace,
    current_name: &str,
    model: &ProjectModel,
    reported: &[&ProjectModel],
    token: &CancellationToken,
) -> Result<String, CoreError> {
    if current_name == model.name {
        return Ok(current_name.to_string());
    }
    check_cancelled(token)?;
    ensure_name_is_free(workspace, &model.name, reported, token)?;
    workspace
        .rename_project(current_name, &model.name)
        .map_err(CoreError::other)?;
    Ok(model.name.clone())
}

/// Pick a free project name for the root import, appending underscores
/// while the desired name is taken by a project at another location.
pub fn free_root_name(workspace: &dyn Workspace, desired: &str, location: &Path) -> String {
    let mut name = desired.to_string();
    while let Some(existing) = workspace.find_project(&name) {
        if existing.location == location {
            break;
        }
        name.push('_');
    }
    name
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn hash_matches_the_java_reference_values() {
        assert_eq!(java_string_hash(""), 0);
        assert_eq!(java_string_hash("a"), 97);
        assert_eq!(java_string_hash("app"), 96801);
        // Overflow wraps instead of panicking.
        assert_eq!(java_string_hash("polygenelubricants"), i32::MIN);
    }

    #[test]
    fn placeholder_is_deterministic() {
        assert_eq!(placeholder_name("app"), "app-96801");
    }
}
