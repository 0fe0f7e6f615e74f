//! Typed representation of discovered build units and IDE project descriptors.
//!
//! Pure data: nothing in this module touches the filesystem.

pub mod file;
pub mod project;
pub mod unit;

pub use file::{FileGroup, FileKind, SourceFile};
pub use project::{FileEntry, ProjectDescriptor, ProjectKind};
pub use unit::{BuildUnit, OutputKind, Platform, UnitLayout, UnitSpec};
