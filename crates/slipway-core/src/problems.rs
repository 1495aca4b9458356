use std::path::PathBuf;

/// Severity of a collected synchronization problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// Where a problem marker should be attached in the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerLocation {
    /// Nothing better is known; attach to the workspace root.
    WorkspaceRoot,
    /// Attach to the named project.
    Project(String),
    /// Attach to a resource inside the named project (e.g. the build script).
    Resource { project: String, path: PathBuf },
}

/// A non-fatal failure collected during synchronization.
///
/// Problems are attributed to the contributing plugin and a marker location;
/// they surface as the visible job outcome but never stop sibling projects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynchronizationProblem {
    pub severity: Severity,
    pub plugin_id: String,
    pub location: MarkerLocation,
    pub message: String,
    pub cause: Option<String>,
}

impl SynchronizationProblem {
    pub fn error(
        plugin_id: impl Into<String>,
        location: MarkerLocation,
        message: impl Into<String>,
        cause: Option<String>,
    ) -> Self {
        Self {
            severity: Severity::Error,
            plugin_id: plugin_id.into(),
            location,
            message: message.into(),
            cause,
        }
    }

    pub fn warning(
        plugin_id: impl Into<String>,
        location: MarkerLocation,
        message: impl Into<String>,
        cause: Option<String>,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            plugin_id: plugin_id.into(),
            location,
            message: message.into(),
            cause,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for SynchronizationProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "[{severity}] {}: {}", self.plugin_id, self.message)?;
        match &self.location {
            MarkerLocation::WorkspaceRoot => {}
            MarkerLocation::Project(name) => write!(f, " (project {name})")?,
            MarkerLocation::Resource { project, path } => {
                write!(f, " (project {project}, {})", path.display())?
            }
        }
        if let Some(cause) = &self.cause {
            write!(f, ": {cause}")?;
        }
        Ok(())
    }
}
