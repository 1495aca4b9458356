use std::path::{Path, PathBuf};

use slipway_model::{PersistentModelBuilder, ProjectModel};

const DEFAULT_BUILD_SCRIPT: &str = "build.gradle";

/// Record where the project's build script lives, relative to the project
/// directory. Falls back to the conventional name when the model reports
/// nothing.
pub fn update_build_script(model: &ProjectModel, builder: &mut PersistentModelBuilder) {
    let path = match &model.build_script {
        Some(script) => relativize(&model.project_dir, script),
        None => PathBuf::from(DEFAULT_BUILD_SCRIPT),
    };
    builder.build_script_path(path);
}

fn relativize(base: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(base)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}
