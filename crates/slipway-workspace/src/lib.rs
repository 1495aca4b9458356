//! Workspace abstraction the synchronization engine runs against.
//!
//! The [`Workspace`] trait captures exactly the host operations the engine
//! needs: project lifecycle, natures and builders, linked and derived
//! resources, and the Java-specific surface (source folders, compiler
//! levels, classpath containers). [`LocalWorkspace`] is the in-process
//! implementation used by the CLI and by tests; an IDE embedding provides
//! its own.

mod local;
mod workspace;

pub use local::LocalWorkspace;
pub use workspace::{
    AppliedSourceFolder, BatchScope, LinkedFolder, ProjectInfo, Workspace, WorkspaceError,
};
