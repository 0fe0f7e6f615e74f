use super::{DirEntry, FileSystem, FileType};
use crate::util::paths::is_hidden;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use ignore::WalkBuilder;

pub struct RealFileSystem;

impl RealFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RealFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).context(format!("Failed to read file {:?}", path))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let entries = fs::read_dir(path).context(format!("Failed to read directory {:?}", path))?;

        let mut result = Vec::new();
        for entry in entries {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();
            let file_type = if path.is_file() {
                FileType::File
            } else if path.is_dir() {
                FileType::Directory
            } else {
                FileType::Symlink
            };

            result.push(DirEntry {
                path,
                name,
                file_type,
            });
        }

        Ok(result)
    }

    fn walk_files(&self, root: &Path, prune: &dyn Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
        if !root.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let walker = WalkBuilder::new(root)
            .hidden(false)
            .ignore(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .parents(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(|e| {
                e.depth() == 0
                    || !e.file_type().map(|t| t.is_dir()).unwrap_or(false)
                    || !is_hidden(e.path())
            })
            .build();

        for entry in walker {
            let entry = entry.context(format!("Failed to walk directory {:?}", root))?;
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            // Every directory between root and the file must survive pruning
            let pruned = entry
                .path()
                .ancestors()
                .skip(1)
                .take_while(|dir| *dir != root)
                .any(|dir| prune(dir));
            if !pruned {
                files.push(entry.into_path());
            }
        }

        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        let base = dir.path();

        fs::create_dir_all(base.join("Sources")).unwrap();
        fs::create_dir_all(base.join(".git/objects")).unwrap();
        fs::create_dir_all(base.join("Intermediate")).unwrap();
        fs::write(base.join("Sources/Main.cpp"), "int main() {}").unwrap();
        fs::write(base.join(".git/objects/abc"), "x").unwrap();
        fs::write(base.join("Intermediate/Main.o"), "x").unwrap();
        fs::write(base.join("README.md"), "# hi").unwrap();

        dir
    }

    #[test]
    fn test_exists_and_kinds() {
        let temp = create_test_dir();
        let fs = RealFileSystem::new();

        assert!(fs.exists(temp.path()));
        assert!(fs.is_dir(&temp.path().join("Sources")));
        assert!(fs.is_file(&temp.path().join("README.md")));
        assert!(!fs.exists(&temp.path().join("nonexistent")));
    }

    #[test]
    fn test_read_to_string() {
        let temp = create_test_dir();
        let fs = RealFileSystem::new();

        let content = fs.read_to_string(&temp.path().join("README.md")).unwrap();
        assert_eq!(content, "# hi");
    }

    #[test]
    fn test_read_dir() {
        let temp = create_test_dir();
        let fs = RealFileSystem::new();

        let entries = fs.read_dir(temp.path()).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.file_name()).collect();
        assert!(names.contains(&"README.md"));
        assert!(names.contains(&"Sources"));
    }

    #[test]
    fn test_walk_skips_hidden_and_pruned_dirs() {
        let temp = create_test_dir();
        let fs = RealFileSystem::new();

        let files = fs
            .walk_files(temp.path(), &|p| p.ends_with("Intermediate"))
            .unwrap();
        assert_eq!(
            files,
            vec![
                temp.path().join("README.md"),
                temp.path().join("Sources/Main.cpp"),
            ]
        );
    }

    #[test]
    fn test_walk_missing_root_is_empty() {
        let temp = create_test_dir();
        let fs = RealFileSystem::new();
        assert!(fs
            .walk_files(&temp.path().join("missing"), &|_| false)
            .unwrap()
            .is_empty());
    }
}
