use super::{DirEntry, FileSystem, FileType};
use crate::util::paths::is_hidden;
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

#[derive(Debug, Clone)]
pub struct MockEntry {
    pub content: Option<String>,
    pub file_type: FileType,
}

/// In-memory file system for discovery and collection tests
pub struct MockFileSystem {
    files: RwLock<HashMap<PathBuf, MockEntry>>,
    root: PathBuf,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::with_root(PathBuf::from("/mock"))
    }

    pub fn with_root(root: PathBuf) -> Self {
        Self {
            files: RwLock::new(HashMap::new()),
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: &str) {
        let path = self.normalize_path(path.as_ref());
        let mut files = self.files.write().unwrap();

        if let Some(parent) = path.parent() {
            Self::ensure_parents(&mut files, parent);
        }

        files.insert(
            path,
            MockEntry {
                content: Some(content.to_string()),
                file_type: FileType::File,
            },
        );
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = self.normalize_path(path.as_ref());
        let mut files = self.files.write().unwrap();
        Self::ensure_parents(&mut files, &path);
    }

    fn normalize_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn ensure_parents(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            files.entry(current.clone()).or_insert(MockEntry {
                content: None,
                file_type: FileType::Directory,
            });
        }
    }

    fn entry_type(&self, path: &Path) -> Option<FileType> {
        let path = self.normalize_path(path);
        self.files.read().unwrap().get(&path).map(|e| e.file_type)
    }
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.entry_type(path).is_some()
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.entry_type(path) == Some(FileType::Directory)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.entry_type(path) == Some(FileType::File)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let path = self.normalize_path(path);
        let files = self.files.read().unwrap();
        let entry = files
            .get(&path)
            .ok_or_else(|| anyhow!("File not found: {:?}", path))?;

        entry
            .content
            .clone()
            .ok_or_else(|| anyhow!("Not a file: {:?}", path))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let path = self.normalize_path(path);
        let files = self.files.read().unwrap();

        if !files.contains_key(&path) {
            return Err(anyhow!("Directory not found: {:?}", path));
        }

        let entries = files
            .iter()
            .filter(|(file_path, _)| file_path.parent() == Some(path.as_path()))
            .map(|(file_path, entry)| DirEntry {
                path: file_path.clone(),
                name: file_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("")
                    .to_string(),
                file_type: entry.file_type,
            })
            .collect();

        Ok(entries)
    }

    fn walk_files(&self, root: &Path, prune: &dyn Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
        let root = self.normalize_path(root);
        let files = self.files.read().unwrap();

        let mut result: Vec<PathBuf> = files
            .iter()
            .filter(|(path, entry)| entry.file_type == FileType::File && path.starts_with(&root))
            .filter(|(path, _)| {
                // Every directory between root and the file must survive pruning
                let mut dir = path.parent();
                while let Some(d) = dir {
                    if d == root {
                        return true;
                    }
                    if is_hidden(d) || prune(d) {
                        return false;
                    }
                    dir = d.parent();
                }
                true
            })
            .map(|(path, _)| path.clone())
            .collect();

        result.sort();
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_file_creates_parents() {
        let fs = MockFileSystem::new();
        fs.add_file("Svc/Sources/Main.cpp", "int main() {}");

        assert!(fs.is_file(Path::new("/mock/Svc/Sources/Main.cpp")));
        assert!(fs.is_dir(Path::new("/mock/Svc/Sources")));
        assert!(fs.is_dir(Path::new("/mock/Svc")));
    }

    #[test]
    fn test_read_to_string() {
        let fs = MockFileSystem::new();
        fs.add_file("a.txt", "hello world");

        assert_eq!(fs.read_to_string(Path::new("a.txt")).unwrap(), "hello world");
        assert!(fs.read_to_string(Path::new("missing.txt")).is_err());
    }

    #[test]
    fn test_read_dir_lists_direct_children() {
        let fs = MockFileSystem::new();
        fs.add_file("dir/a.txt", "a");
        fs.add_file("dir/sub/b.txt", "b");

        let mut names: Vec<String> = fs
            .read_dir(Path::new("dir"))
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["a.txt", "sub"]);
    }

    #[test]
    fn test_walk_files_sorted_and_pruned() {
        let fs = MockFileSystem::new();
        fs.add_file("Svc/Sources/b.cpp", "");
        fs.add_file("Svc/Sources/a.cpp", "");
        fs.add_file("Svc/.cache/x", "");
        fs.add_file("Svc/Build/out", "");
        fs.add_dir("Svc/Empty");

        let files = fs
            .walk_files(Path::new("Svc"), &|p| p.ends_with("Build"))
            .unwrap();
        assert_eq!(
            files,
            vec![
                PathBuf::from("/mock/Svc/Sources/a.cpp"),
                PathBuf::from("/mock/Svc/Sources/b.cpp"),
            ]
        );
    }
}
