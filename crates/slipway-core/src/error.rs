use thiserror::Error;

use crate::Cancelled;

/// Fatal errors that abort a synchronization run before (or between) project
/// mutations. Per-project failures are collected as
/// [`SynchronizationProblem`](crate::SynchronizationProblem)s instead.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The build layout cannot be represented in the workspace: duplicate
    /// project directories, a project at the workspace root, or an
    /// unresolvable project name conflict.
    #[error("unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    /// Importing the root project failed; nothing was synchronized.
    #[error("importing the root project failed: {0}")]
    ImportRootProject(#[source] Box<CoreError>),

    /// The primary model query against the build tool failed.
    #[error("loading the Gradle model failed: {0}")]
    ModelFetch(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("synchronization was cancelled")]
    Cancelled,

    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl CoreError {
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedConfiguration(message.into())
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    pub fn other(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Other(Box::new(err))
    }

    /// Wrap a failure of the root-project import step.
    pub fn import_root(err: CoreError) -> Self {
        Self::ImportRootProject(Box::new(err))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, CoreError::Cancelled)
    }
}

impl From<Cancelled> for CoreError {
    fn from(_: Cancelled) -> Self {
        CoreError::Cancelled
    }
}
