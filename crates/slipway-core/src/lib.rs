//! Shared types for the slipway synchronization engine: the fatal error
//! taxonomy, synchronization problems, cooperative cancellation, progress
//! reporting, and Gradle version handling.

mod cancellation;
mod error;
mod gradle_version;
mod problems;
mod progress;

pub use cancellation::{check_cancelled, Cancelled};
pub use error::CoreError;
pub use gradle_version::GradleVersion;
pub use problems::{MarkerLocation, Severity, SynchronizationProblem};
pub use progress::{Progress, ProgressEvent, ProgressId, ProgressReceiver, ProgressSender};

pub use tokio_util::sync::CancellationToken;

/// Plugin id used when attributing problems raised by slipway itself.
pub const CORE_PLUGIN_ID: &str = "slipway.core";

/// Nature id marking a workspace project as owned by a Gradle build.
pub const GRADLE_NATURE_ID: &str = "slipway.gradleprojectnature";

/// Builder command installed on every coupled project.
pub const GRADLE_BUILDER_ID: &str = "slipway.gradleprojectbuilder";

/// Classpath container id resolved from the persistent model.
pub const GRADLE_CLASSPATH_CONTAINER_ID: &str = "slipway.gradleclasspathcontainer";

/// Nature id of the host Java model.
pub const JAVA_NATURE_ID: &str = "org.eclipse.jdt.core.javanature";

/// Builder id of the host Java model.
pub const JAVA_BUILDER_ID: &str = "org.eclipse.jdt.core.javabuilder";

/// Render a panic payload for logging.
///
/// Panics from hooks and background jobs are isolated rather than propagated,
/// so the payload only survives as a log line and a problem message.
pub fn panic_payload_to_str(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
