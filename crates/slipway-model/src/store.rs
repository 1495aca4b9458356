//! Disk-backed store for [`PersistentModel`] records, one properties file
//! per workspace project. Reads degrade to "no model" on corrupt or
//! unreadable files so a damaged state directory never blocks a
//! synchronization from running.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::convert::{from_properties, to_properties};
use crate::PersistentModel;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write persistent model for {project}: {source}")]
    Write {
        project: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to delete persistent model for {project}: {source}")]
    Delete {
        project: String,
        #[source]
        source: std::io::Error,
    },
}

/// Store rooted at a state directory, typically
/// `<workspace>/.metadata/.plugins/slipway.core/project-preferences`.
#[derive(Debug, Clone)]
pub struct PersistentModelStore {
    dir: PathBuf,
}

impl PersistentModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn file_for(&self, project: &str) -> PathBuf {
        self.dir.join(format!("{project}.prefs"))
    }

    /// Load the record for a project. Missing, unreadable, and corrupt files
    /// all read as `None`.
    pub fn load(&self, project: &str) -> Option<PersistentModel> {
        let path = self.file_for(project);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                tracing::debug!(
                    target: "slipway.model",
                    project,
                    path = %path.display(),
                    error = %err,
                    "failed to read persistent model, treating as absent"
                );
                return None;
            }
        };
        let properties = parse_properties(&text);
        match from_properties(project, &properties) {
            Ok(model) => model,
            Err(err) => {
                tracing::debug!(
                    target: "slipway.model",
                    project,
                    path = %path.display(),
                    error = %err,
                    "corrupt persistent model, treating as absent"
                );
                None
            }
        }
    }

    /// Persist a record, atomically replacing any previous file.
    pub fn save(&self, model: &PersistentModel) -> Result<(), StoreError> {
        let write = || -> std::io::Result<()> {
            fs::create_dir_all(&self.dir)?;
            let mut file = tempfile::NamedTempFile::new_in(&self.dir)?;
            file.write_all(render_properties(&to_properties(model)).as_bytes())?;
            file.persist(self.file_for(&model.project))
                .map_err(|err| err.error)?;
            Ok(())
        };
        write().map_err(|source| StoreError::Write {
            project: model.project.clone(),
            source,
        })
    }

    /// Remove the record for a project; absent files are not an error.
    pub fn delete(&self, project: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.file_for(project)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Delete {
                project: project.to_string(),
                source,
            }),
        }
    }
}

fn render_properties(properties: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    for (key, value) in properties {
        out.push_str(key);
        out.push('=');
        out.push_str(&escape_value(value));
        out.push('\n');
    }
    out
}

fn parse_properties(text: &str) -> BTreeMap<String, String> {
    let mut properties = BTreeMap::new();
    for line in text.lines() {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            properties.insert(key.to_string(), unescape_value(value));
        }
    }
    properties
}

fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out
}

fn unescape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
