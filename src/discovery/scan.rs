use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::fs::FileSystem;
use crate::meta::DialectTag;

/// Directories that only ever hold generated output
const EXCLUDED_DIRS: &[&str] = &["Build", "Intermediate", "node_modules", "bin", "obj", "Projects"];

#[derive(Debug, Clone)]
pub struct ScanResult {
    pub root: PathBuf,
    /// Absolute paths of every regular file below `root`, sorted
    pub file_tree: Vec<PathBuf>,
}

impl ScanResult {
    /// Build descriptor candidates with their dialect, in path order.
    pub fn descriptors(&self) -> Vec<(PathBuf, DialectTag)> {
        self.file_tree
            .iter()
            .filter_map(|p| DialectTag::from_path(p).map(|d| (p.clone(), d)))
            .collect()
    }

    pub fn managed_projects(&self) -> Vec<PathBuf> {
        self.file_tree
            .iter()
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("csproj"))
            .cloned()
            .collect()
    }
}

pub fn execute(fs: &dyn FileSystem, root: &Path) -> Result<ScanResult> {
    let file_tree = fs
        .walk_files(root, &is_excluded)
        .with_context(|| format!("Failed to scan {}", root.display()))?;

    Ok(ScanResult {
        root: root.to_path_buf(),
        file_tree,
    })
}

fn is_excluded(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| EXCLUDED_DIRS.contains(&name))
        .unwrap_or(false)
}
