//! FileSystem abstraction for testable discovery and collection

mod mock;
mod real;
mod r#trait;

pub use mock::MockFileSystem;
pub use r#trait::{DirEntry, FileSystem, FileType};
pub use real::RealFileSystem;
