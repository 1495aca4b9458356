//! Data model shared across the slipway synchronization engine: the project
//! tree reported by the Gradle introspection API, the classpath entry types
//! applied to workspace projects, and the durable per-project persistent
//! model with its property-file representation.

mod classpath_xml;
mod convert;
mod persistent;
mod project;
mod store;

pub use classpath_xml::{classpath_from_xml, classpath_to_xml, ClasspathXmlError};
pub use persistent::{PersistentModel, PersistentModelBuilder};
pub use project::{
    AccessRule, AccessRuleKind, BuildCommand, ClasspathAttribute, ClasspathEntry,
    ClasspathEntryKind, ExternalDependency, JavaSourceSettings, LinkedResource,
    LinkedResourceKind, ProjectDependency, ProjectModel, SourceDirectory,
};
pub use store::{PersistentModelStore, StoreError};
