//! The synchronization engine: reconciles the project tree reported by a
//! Gradle build against the workspace, merging build-managed configuration
//! with user edits instead of clobbering them.

pub mod configurators;
pub mod container;
pub mod job;
pub mod merge;
pub mod naming;
pub mod operation;
pub mod updaters;
pub mod validate;

pub use configurators::{InitContext, ProjectConfigurator, ProjectContext};
pub use container::GradleClasspathContainer;
pub use job::{JobHandle, ScheduleOutcome, SynchronizationJobManager, SynchronizationRequest};
pub use merge::{calculate, MergeResult};
pub use operation::{NewProjectHandler, SyncOutcome, SynchronizeBuildOperation};
