//! Conversion between [`PersistentModel`] and its Java-properties-style
//! on-disk form. Path lists are `:`-joined portable (forward-slash) strings;
//! the classpath and the managed builders are embedded XML fragments, the
//! same shapes the host IDE serializes natively.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use slipway_core::GradleVersion;

use crate::classpath_xml::{classpath_from_xml, classpath_to_xml, ClasspathXmlError};
use crate::{BuildCommand, PersistentModel, PersistentModelBuilder};

const PROPERTY_BUILD_DIR: &str = "buildDir";
const PROPERTY_BUILD_SCRIPT_PATH: &str = "buildScriptPath";
const PROPERTY_SUBPROJECTS: &str = "subprojectPaths";
const PROPERTY_CLASSPATH: &str = "classpath";
const PROPERTY_DERIVED_RESOURCES: &str = "derivedResources";
const PROPERTY_LINKED_RESOURCES: &str = "linkedResources";
const PROPERTY_MANAGED_NATURES: &str = "managedNatures";
const PROPERTY_MANAGED_BUILDERS: &str = "managedBuilders";
const PROPERTY_HAS_AUTO_BUILD_TASKS: &str = "hasAutoBuildTasks";
const PROPERTY_GRADLE_VERSION: &str = "gradleVersion";

const PATH_LIST_SEPARATOR: char = ':';

pub(crate) fn to_properties(model: &PersistentModel) -> BTreeMap<String, String> {
    let mut properties = BTreeMap::new();
    properties.insert(
        PROPERTY_BUILD_DIR.to_string(),
        portable_path(&model.build_dir),
    );
    properties.insert(
        PROPERTY_BUILD_SCRIPT_PATH.to_string(),
        portable_path(&model.build_script_path),
    );
    properties.insert(
        PROPERTY_SUBPROJECTS.to_string(),
        join_paths(&model.subproject_paths),
    );
    properties.insert(
        PROPERTY_CLASSPATH.to_string(),
        classpath_to_xml(&model.classpath),
    );
    properties.insert(
        PROPERTY_DERIVED_RESOURCES.to_string(),
        join_paths(&model.derived_resources),
    );
    properties.insert(
        PROPERTY_LINKED_RESOURCES.to_string(),
        model.linked_resources.join(&PATH_LIST_SEPARATOR.to_string()),
    );
    properties.insert(
        PROPERTY_MANAGED_NATURES.to_string(),
        model.managed_natures.join(&PATH_LIST_SEPARATOR.to_string()),
    );
    properties.insert(
        PROPERTY_MANAGED_BUILDERS.to_string(),
        build_commands_to_xml(&model.managed_builders),
    );
    properties.insert(
        PROPERTY_HAS_AUTO_BUILD_TASKS.to_string(),
        model.has_auto_build_tasks.to_string(),
    );
    properties.insert(
        PROPERTY_GRADLE_VERSION.to_string(),
        model.gradle_version.as_str().to_string(),
    );
    properties
}

/// Rebuild a model from its properties. Returns `None` for records written
/// before a successful synchronization (no `gradleVersion` key), mirroring
/// the "absent" placeholder of the original store.
pub(crate) fn from_properties(
    project: &str,
    properties: &BTreeMap<String, String>,
) -> Result<Option<PersistentModel>, ClasspathXmlError> {
    let Some(gradle_version) = properties
        .get(PROPERTY_GRADLE_VERSION)
        .and_then(|v| GradleVersion::parse(v))
    else {
        return Ok(None);
    };

    let mut builder = PersistentModelBuilder::new(project);
    if let Some(value) = properties.get(PROPERTY_BUILD_DIR) {
        builder.build_dir(PathBuf::from(value));
    }
    if let Some(value) = properties.get(PROPERTY_BUILD_SCRIPT_PATH) {
        builder.build_script_path(PathBuf::from(value));
    }
    if let Some(value) = properties.get(PROPERTY_SUBPROJECTS) {
        builder.subproject_paths(split_paths(value));
    }
    if let Some(value) = properties.get(PROPERTY_CLASSPATH) {
        builder.classpath(classpath_from_xml(value)?);
    }
    if let Some(value) = properties.get(PROPERTY_DERIVED_RESOURCES) {
        builder.derived_resources(split_paths(value));
    }
    if let Some(value) = properties.get(PROPERTY_LINKED_RESOURCES) {
        builder.linked_resources(split_list(value));
    }
    if let Some(value) = properties.get(PROPERTY_MANAGED_NATURES) {
        builder.managed_natures(split_list(value));
    }
    if let Some(value) = properties.get(PROPERTY_MANAGED_BUILDERS) {
        builder.managed_builders(build_commands_from_xml(value)?);
    }
    if let Some(value) = properties.get(PROPERTY_HAS_AUTO_BUILD_TASKS) {
        builder.has_auto_build_tasks(value == "true");
    }
    builder.gradle_version(gradle_version);
    Ok(Some(builder.build()))
}

fn portable_path(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        if !out.is_empty() || path.has_root() {
            out.push('/');
        }
        match component {
            std::path::Component::RootDir => {
                // Leading slash already emitted.
                if out.is_empty() {
                    out.push('/');
                }
            }
            other => out.push_str(&other.as_os_str().to_string_lossy()),
        }
    }
    out
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| portable_path(p))
        .collect::<Vec<_>>()
        .join(&PATH_LIST_SEPARATOR.to_string())
}

fn split_paths(value: &str) -> Vec<PathBuf> {
    split_list(value).into_iter().map(PathBuf::from).collect()
}

fn split_list(value: &str) -> Vec<String> {
    if value.is_empty() {
        return Vec::new();
    }
    value
        .split(PATH_LIST_SEPARATOR)
        .map(str::to_string)
        .collect()
}

/// Managed builders persist in the `.project` buildSpec shape.
pub(crate) fn build_commands_to_xml(commands: &[BuildCommand]) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<buildSpec>\n");
    for command in commands {
        out.push_str("\t<buildCommand>\n");
        out.push_str(&format!("\t\t<name>{}</name>\n", xml_escape(&command.name)));
        out.push_str("\t\t<arguments>\n");
        for (key, value) in &command.arguments {
            out.push_str("\t\t\t<dictionary>\n");
            out.push_str(&format!("\t\t\t\t<key>{}</key>\n", xml_escape(key)));
            out.push_str(&format!("\t\t\t\t<value>{}</value>\n", xml_escape(value)));
            out.push_str("\t\t\t</dictionary>\n");
        }
        out.push_str("\t\t</arguments>\n");
        out.push_str("\t</buildCommand>\n");
    }
    out.push_str("</buildSpec>\n");
    out
}

pub(crate) fn build_commands_from_xml(xml: &str) -> Result<Vec<BuildCommand>, ClasspathXmlError> {
    let doc = roxmltree::Document::parse(xml)?;
    let root = doc.root_element();
    if root.tag_name().name() != "buildSpec" {
        return Err(ClasspathXmlError::Malformed(format!(
            "unexpected root element <{}>",
            root.tag_name().name()
        )));
    }

    let mut commands = Vec::new();
    for node in root.children().filter(|n| n.has_tag_name("buildCommand")) {
        let name = node
            .children()
            .find(|n| n.has_tag_name("name"))
            .and_then(|n| n.text())
            .unwrap_or_default()
            .to_string();
        if name.is_empty() {
            return Err(ClasspathXmlError::Malformed(
                "buildCommand without name".to_string(),
            ));
        }

        let mut arguments = BTreeMap::new();
        if let Some(args) = node.children().find(|n| n.has_tag_name("arguments")) {
            for dictionary in args.children().filter(|n| n.has_tag_name("dictionary")) {
                let key = dictionary
                    .children()
                    .find(|n| n.has_tag_name("key"))
                    .and_then(|n| n.text())
                    .unwrap_or_default()
                    .to_string();
                let value = dictionary
                    .children()
                    .find(|n| n.has_tag_name("value"))
                    .and_then(|n| n.text())
                    .unwrap_or_default()
                    .to_string();
                arguments.insert(key, value);
            }
        }
        commands.push(BuildCommand { name, arguments });
    }
    Ok(commands)
}

fn xml_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::ClasspathEntry;

    use super::*;

    fn sample_model() -> PersistentModel {
        let mut command = BuildCommand::new("org.eclipse.jdt.core.javabuilder");
        command
            .arguments
            .insert("incremental".to_string(), "true".to_string());

        PersistentModel {
            project: "app".to_string(),
            build_dir: PathBuf::from("build"),
            build_script_path: PathBuf::from("build.gradle"),
            subproject_paths: vec![PathBuf::from("core"), PathBuf::from("web")],
            classpath: vec![
                ClasspathEntry::library("/deps/guava.jar"),
                ClasspathEntry::project("lib"),
            ],
            derived_resources: vec![PathBuf::from("build"), PathBuf::from("core/build")],
            linked_resources: vec!["shared-src".to_string()],
            managed_natures: vec![
                "org.eclipse.jdt.core.javanature".to_string(),
                "slipway.gradleprojectnature".to_string(),
            ],
            managed_builders: vec![command],
            has_auto_build_tasks: false,
            gradle_version: GradleVersion::parse("8.5").unwrap(),
        }
    }

    #[test]
    fn model_round_trips_through_properties() {
        let model = sample_model();
        let properties = to_properties(&model);
        let loaded = from_properties("app", &properties).unwrap().unwrap();
        assert_eq!(loaded, model);
    }

    #[test]
    fn missing_gradle_version_means_absent() {
        let mut properties = to_properties(&sample_model());
        properties.remove("gradleVersion");
        assert_eq!(from_properties("app", &properties).unwrap(), None);
    }

    #[test]
    fn path_lists_use_portable_separators() {
        let model = sample_model();
        let properties = to_properties(&model);
        assert_eq!(properties.get("subprojectPaths").unwrap(), "core:web");
        assert_eq!(
            properties.get("derivedResources").unwrap(),
            "build:core/build"
        );
    }
}
