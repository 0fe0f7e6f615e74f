//! FileSystem trait definition

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Type of file system entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    File,
    Directory,
    Symlink,
}

/// A directory entry returned by read_dir
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub path: PathBuf,
    pub name: String,
    pub file_type: FileType,
}

impl DirEntry {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.name
    }

    pub fn is_file(&self) -> bool {
        self.file_type == FileType::File
    }
}

/// Read-only view of the file system used by discovery and collection
pub trait FileSystem: Send + Sync {
    /// Check if a path exists
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a directory
    fn is_dir(&self, path: &Path) -> bool;

    /// Check if path is a file
    fn is_file(&self, path: &Path) -> bool;

    /// Read file contents as string
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// List directory contents (one level, unsorted)
    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>>;

    /// All regular files below `root`, sorted, without descending into
    /// dot-directories or any directory for which `prune` returns true.
    fn walk_files(&self, root: &Path, prune: &dyn Fn(&Path) -> bool) -> Result<Vec<PathBuf>>;
}
