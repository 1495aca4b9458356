//! Boundary to the Gradle tooling side: build configuration persistence,
//! connection management, the workspace-local model snapshot, and the
//! caching model provider that the synchronization engine fetches through.

mod config;
mod connection;
mod provider;
mod snapshot;

pub use config::{
    read_project_configuration, write_project_configuration, delete_project_configuration,
    BuildConfiguration, ConfigError, ProjectConfiguration, PROJECT_PREFS_REL_PATH,
};
pub use connection::{ScopedConnection, ToolingConnection, ToolingConnector};
pub use provider::{FetchStrategy, ModelProvider};
pub use snapshot::{
    write_snapshot, BuildModel, ModelSnapshotFile, SnapshotConnector, MODEL_SNAPSHOT_REL_PATH,
    MODEL_SNAPSHOT_SCHEMA_VERSION,
};
