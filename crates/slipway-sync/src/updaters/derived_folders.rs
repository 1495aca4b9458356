use std::path::{Path, PathBuf};

use slipway_core::CoreError;
use slipway_model::{PersistentModelBuilder, ProjectModel};
use slipway_workspace::Workspace;

use crate::updaters::ws_err;

const DEFAULT_BUILD_DIR: &str = "build";

/// Gradle's per-build cache directory, always treated as derived.
const GRADLE_CACHE_DIR: &str = ".gradle";

/// Mark the build output directory, the Gradle cache directory and nested
/// subproject directories as derived, and unmark paths marked by an earlier
/// pass that no longer apply.
pub fn update_derived_folders(
    workspace: &dyn Workspace,
    project: &str,
    model: &ProjectModel,
    builder: &mut PersistentModelBuilder,
) -> Result<(), CoreError> {
    let mut derived: Vec<String> = Vec::new();

    let build_dir = resolve_build_dir(workspace, project, model)?;
    if let Some(build_dir) = &build_dir {
        derived.push(build_dir.clone());
    }
    derived.push(GRADLE_CACHE_DIR.to_string());

    let subprojects: Vec<PathBuf> = model
        .children
        .iter()
        .filter_map(|child| relative_to(&model.project_dir, &child.project_dir))
        .collect();
    for path in &subprojects {
        derived.push(portable(path));
    }

    let previously_derived = builder
        .previous()
        .map(|p| p.derived_resources.clone())
        .unwrap_or_default();
    for path in &previously_derived {
        let text = portable(path);
        if !derived.contains(&text) {
            workspace.set_derived(project, &text, false).map_err(ws_err)?;
        }
    }
    for path in &derived {
        workspace.set_derived(project, path, true).map_err(ws_err)?;
    }

    builder.derived_resources(derived.iter().map(PathBuf::from).collect());
    builder.subproject_paths(subprojects);
    builder.build_dir(build_dir.map(PathBuf::from).unwrap_or_else(|| {
        PathBuf::from(DEFAULT_BUILD_DIR)
    }));
    Ok(())
}

/// Project-relative build directory. A build directory outside the project
/// tree is only reachable through a linked resource; when no link covers it
/// the directory is not marked.
fn resolve_build_dir(
    workspace: &dyn Workspace,
    project: &str,
    model: &ProjectModel,
) -> Result<Option<String>, CoreError> {
    let Some(build_dir) = &model.build_dir else {
        return Ok(Some(DEFAULT_BUILD_DIR.to_string()));
    };
    if build_dir.is_relative() {
        return Ok(Some(portable(build_dir)));
    }
    if let Some(rel) = relative_to(&model.project_dir, build_dir) {
        return Ok(Some(portable(&rel)));
    }
    let member = workspace.find_member(project, build_dir).map_err(ws_err)?;
    if member.is_none() {
        tracing::debug!(
            target: "slipway.sync",
            project,
            build_dir = %build_dir.display(),
            "build directory is outside the project and not linked, skipping derived marker"
        );
    }
    Ok(member)
}

fn relative_to(base: &Path, path: &Path) -> Option<PathBuf> {
    let rel = path.strip_prefix(base).ok()?;
    if rel.as_os_str().is_empty() {
        return None;
    }
    Some(rel.to_path_buf())
}

fn portable(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
