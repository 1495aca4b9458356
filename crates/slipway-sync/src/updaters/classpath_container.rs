use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use slipway_core::{
    CoreError, MarkerLocation, SynchronizationProblem, CORE_PLUGIN_ID,
    GRADLE_CLASSPATH_CONTAINER_ID,
};
use slipway_model::{
    ClasspathEntry, ClasspathEntryKind, ExternalDependency, PersistentModelBuilder, ProjectModel,
};
use slipway_workspace::Workspace;

use crate::updaters::ws_err;

/// File name prefix Gradle uses for placeholder files standing in for
/// dependencies it could not resolve.
const UNRESOLVED_PREFIX: &str = "unresolved dependency - ";

/// Archive suffixes the host Java model accepts as library entries.
const ARCHIVE_SUFFIXES: [&str; 3] = [".jar", ".rar", ".zip"];

fn unresolved_coordinates() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([^ ]+) ([^ ]+) ([^ ]+)$").unwrap_or_else(|_| unreachable!()))
}

/// Rebuild the Gradle classpath container of a Java project from the model's
/// dependency lists.
///
/// Only directories and archive files are accepted as library entries; the
/// host Java model cannot put anything else (a native library, say) on a
/// classpath. External files that do not exist on disk are served through a
/// linked workspace member when one with the same name is visible from the
/// project; unresolved-dependency placeholders become error problems naming
/// the coordinates. If any external dependency is exported, externals
/// precede project dependencies so export propagation keeps working with
/// older Gradle versions.
pub fn update_classpath_container(
    workspace: &dyn Workspace,
    project: &str,
    model: &ProjectModel,
    builder: &mut PersistentModelBuilder,
    problems: &mut Vec<SynchronizationProblem>,
) -> Result<(), CoreError> {
    if !model.is_java_project() {
        return Ok(());
    }
    // Gradle may have materialized new files since the last refresh; member
    // lookups below must see them.
    workspace.refresh_project(project).map_err(ws_err)?;

    let mut externals: Vec<ClasspathEntry> = Vec::new();
    for dependency in &model.classpath {
        if let Some(entry) = external_entry(workspace, project, dependency, problems)? {
            externals.push(entry);
        }
    }

    let projects: Vec<ClasspathEntry> = model
        .project_dependencies
        .iter()
        .map(|dependency| ClasspathEntry {
            kind: ClasspathEntryKind::Project,
            path: format!("/{}", dependency.target),
            source_path: None,
            exported: dependency.exported,
            access_rules: dependency.access_rules.clone(),
            attributes: dependency.attributes.clone(),
        })
        .collect();

    let externals_first = externals.iter().any(|e| e.exported);
    let entries: Vec<ClasspathEntry> = if externals_first {
        externals.into_iter().chain(projects).collect()
    } else {
        projects.into_iter().chain(externals).collect()
    };

    workspace
        .set_classpath_container(project, GRADLE_CLASSPATH_CONTAINER_ID, entries.clone())
        .map_err(ws_err)?;
    builder.classpath(entries);
    Ok(())
}

fn external_entry(
    workspace: &dyn Workspace,
    project: &str,
    dependency: &ExternalDependency,
    problems: &mut Vec<SynchronizationProblem>,
) -> Result<Option<ClasspathEntry>, CoreError> {
    let file_name = dependency
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if let Some(coordinates) = file_name.strip_prefix(UNRESOLVED_PREFIX) {
        let message = match unresolved_coordinates().captures(coordinates) {
            Some(captures) => format!(
                "unresolved dependency {}:{}:{}",
                &captures[1], &captures[2], &captures[3]
            ),
            None => format!("unresolved dependency {coordinates}"),
        };
        problems.push(SynchronizationProblem::error(
            CORE_PLUGIN_ID,
            MarkerLocation::Project(project.to_string()),
            message,
            None,
        ));
        return Ok(None);
    }

    let accepted = dependency.file.is_dir()
        || ARCHIVE_SUFFIXES.iter().any(|s| file_name.ends_with(s));
    if !accepted {
        tracing::debug!(
            target: "slipway.sync",
            project,
            file = %dependency.file.display(),
            "dependency is neither a directory nor an archive, omitting"
        );
        return Ok(None);
    }

    if dependency.file.exists() {
        return Ok(Some(ClasspathEntry {
            kind: ClasspathEntryKind::Library,
            path: portable(&dependency.file),
            source_path: dependency.source.as_deref().map(portable),
            exported: dependency.exported,
            access_rules: dependency.access_rules.clone(),
            attributes: dependency.attributes.clone(),
        }));
    }

    if let Some(member) = workspace
        .find_member_by_name(project, &file_name)
        .map_err(ws_err)?
    {
        return Ok(Some(ClasspathEntry {
            kind: ClasspathEntryKind::Library,
            path: format!("/{project}/{member}"),
            source_path: dependency.source.as_deref().map(portable),
            exported: dependency.exported,
            access_rules: dependency.access_rules.clone(),
            attributes: dependency.attributes.clone(),
        }));
    }

    problems.push(SynchronizationProblem::warning(
        CORE_PLUGIN_ID,
        MarkerLocation::Project(project.to_string()),
        format!(
            "dependency {} does not exist and was dropped from the classpath",
            dependency.file.display()
        ),
        None,
    ));
    Ok(None)
}

fn portable(path: &Path) -> String {
    let mut out = String::new();
    if path.has_root() {
        out.push('/');
    }
    let joined = path
        .components()
        .filter(|c| !matches!(c, std::path::Component::RootDir))
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    out.push_str(&joined);
    out
}
