//! Per-project build configuration, persisted under
//! `<project>/.settings/gradle.prefs`. The file records how to reach the
//! root of the Gradle build a project belongs to; deleting it uncouples the
//! project from its build.

use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Location of the build configuration file inside a project directory.
pub const PROJECT_PREFS_REL_PATH: &str = ".settings/gradle.prefs";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid build configuration in {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Configuration of one Gradle build, shared by every project of that build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfiguration {
    /// Directory of the root project of the build.
    pub root_project_dir: PathBuf,
    pub gradle_user_home: Option<PathBuf>,
    pub offline_mode: bool,
}

impl BuildConfiguration {
    pub fn new(root_project_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_project_dir: root_project_dir.into(),
            gradle_user_home: None,
            offline_mode: false,
        }
    }
}

/// A project directory together with the build it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfiguration {
    pub project_dir: PathBuf,
    pub build_configuration: BuildConfiguration,
}

/// On-disk shape of `gradle.prefs`. Keys keep the dotted style of the
/// preference store the format originated in.
#[derive(Debug, Serialize, Deserialize)]
struct PrefsFile {
    #[serde(rename = "connection.project.dir")]
    project_dir: String,
    #[serde(rename = "connection.gradle.user.home")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    gradle_user_home: Option<String>,
    #[serde(rename = "connection.offline.mode")]
    #[serde(default)]
    offline_mode: bool,
}

/// Read the build configuration of a project, if it has one.
pub fn read_project_configuration(
    project_dir: &Path,
) -> Result<Option<ProjectConfiguration>, ConfigError> {
    let path = project_dir.join(PROJECT_PREFS_REL_PATH);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(ConfigError::Read { path, source }),
    };
    let prefs: PrefsFile =
        serde_json::from_str(&text).map_err(|source| ConfigError::Invalid { path, source })?;

    let root_project_dir = normalize(&project_dir.join(&prefs.project_dir));
    Ok(Some(ProjectConfiguration {
        project_dir: project_dir.to_path_buf(),
        build_configuration: BuildConfiguration {
            root_project_dir,
            gradle_user_home: prefs.gradle_user_home.map(PathBuf::from),
            offline_mode: prefs.offline_mode,
        },
    }))
}

/// Write the build configuration of a project. The root project directory is
/// stored relative to the project so the checkout can be moved on disk.
pub fn write_project_configuration(config: &ProjectConfiguration) -> Result<(), ConfigError> {
    let path = config.project_dir.join(PROJECT_PREFS_REL_PATH);
    let prefs = PrefsFile {
        project_dir: relative_path(
            &config.project_dir,
            &config.build_configuration.root_project_dir,
        ),
        gradle_user_home: config
            .build_configuration
            .gradle_user_home
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned()),
        offline_mode: config.build_configuration.offline_mode,
    };

    let mut text = serde_json::to_string_pretty(&prefs).map_err(|source| ConfigError::Invalid {
        path: path.clone(),
        source,
    })?;
    text.push('\n');

    let write = |path: &Path| -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &text)
    };
    write(&path).map_err(|source| ConfigError::Write { path, source })
}

/// Remove the build configuration of a project; absent files are fine.
pub fn delete_project_configuration(project_dir: &Path) -> Result<(), ConfigError> {
    let path = project_dir.join(PROJECT_PREFS_REL_PATH);
    match fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(ConfigError::Write { path, source }),
    }
}

fn relative_path(from: &Path, to: &Path) -> String {
    let from = normalize(from);
    let to = normalize(to);
    if from == to {
        return String::new();
    }

    let from_parts: Vec<_> = from.components().collect();
    let to_parts: Vec<_> = to.components().collect();
    let common = from_parts
        .iter()
        .zip(&to_parts)
        .take_while(|(a, b)| a == b)
        .count();
    if common == 0 {
        // Different roots; store the absolute location.
        return to.to_string_lossy().into_owned();
    }

    let mut parts: Vec<String> = Vec::new();
    for _ in common..from_parts.len() {
        parts.push("..".to_string());
    }
    for component in &to_parts[common..] {
        parts.push(component.as_os_str().to_string_lossy().into_owned());
    }
    parts.join("/")
}

/// Lexical normalization: resolves `.` and `..` without touching the disk.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn round_trips_a_subproject_configuration() {
        let root = tempfile::tempdir().unwrap();
        let project_dir = root.path().join("app");
        fs::create_dir_all(&project_dir).unwrap();

        let config = ProjectConfiguration {
            project_dir: project_dir.clone(),
            build_configuration: BuildConfiguration::new(root.path()),
        };
        write_project_configuration(&config).unwrap();

        let loaded = read_project_configuration(&project_dir).unwrap().unwrap();
        assert_eq!(
            loaded.build_configuration.root_project_dir,
            normalize(root.path())
        );
        assert!(!loaded.build_configuration.offline_mode);
    }

    #[test]
    fn root_project_stores_an_empty_relative_path() {
        let root = tempfile::tempdir().unwrap();
        let config = ProjectConfiguration {
            project_dir: root.path().to_path_buf(),
            build_configuration: BuildConfiguration::new(root.path()),
        };
        write_project_configuration(&config).unwrap();

        let text = fs::read_to_string(root.path().join(PROJECT_PREFS_REL_PATH)).unwrap();
        assert!(text.contains("\"connection.project.dir\": \"\""));

        let loaded = read_project_configuration(root.path()).unwrap().unwrap();
        assert_eq!(
            loaded.build_configuration.root_project_dir,
            normalize(root.path())
        );
    }

    #[test]
    fn missing_prefs_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_project_configuration(dir.path()).unwrap(), None);
    }

    #[test]
    fn delete_uncouples_the_project() {
        let root = tempfile::tempdir().unwrap();
        let config = ProjectConfiguration {
            project_dir: root.path().to_path_buf(),
            build_configuration: BuildConfiguration::new(root.path()),
        };
        write_project_configuration(&config).unwrap();

        delete_project_configuration(root.path()).unwrap();
        assert_eq!(read_project_configuration(root.path()).unwrap(), None);
        delete_project_configuration(root.path()).unwrap();
    }
}
