//! Per-aspect updaters. Each one consumes the reported model plus the
//! project's current workspace state, applies its delta, and records the
//! newly managed state on the persistent model builder. Updaters are
//! idempotent; running one twice against the same model is a no-op.

mod build_commands;
mod build_script;
mod classpath_container;
mod derived_folders;
mod java_settings;
mod linked_resources;
mod natures;
mod source_folders;
mod wtp;

pub use build_commands::update_build_commands;
pub use build_script::update_build_script;
pub use classpath_container::update_classpath_container;
pub use derived_folders::update_derived_folders;
pub use java_settings::update_java_settings;
pub use linked_resources::update_linked_resources;
pub use natures::update_natures;
pub use source_folders::update_source_folders;
pub use wtp::update_deployment_attributes;

use slipway_core::CoreError;
use slipway_workspace::WorkspaceError;

pub(crate) fn ws_err(err: WorkspaceError) -> CoreError {
    CoreError::other(err)
}
