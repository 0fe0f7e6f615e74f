//! Project descriptors consumed by the IDE emitters

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use super::file::{FileGroup, FileKind, SourceFile};
use super::unit::OutputKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectKind {
    Executable,
    StaticLibrary,
    DynamicLibrary,
    ManagedExecutable,
    ManagedLibrary,
}

impl ProjectKind {
    pub fn from_output_kind(kind: OutputKind) -> Self {
        match kind {
            OutputKind::Executable => ProjectKind::Executable,
            OutputKind::StaticLibrary => ProjectKind::StaticLibrary,
            OutputKind::SharedLibrary => ProjectKind::DynamicLibrary,
        }
    }

    /// Managed (C#) projects are listed in the solution but have no native project file.
    pub fn is_managed(&self) -> bool {
        matches!(
            self,
            ProjectKind::ManagedExecutable | ProjectKind::ManagedLibrary
        )
    }

    pub fn is_executable(&self) -> bool {
        matches!(
            self,
            ProjectKind::Executable | ProjectKind::ManagedExecutable
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectKind::Executable => "executable",
            ProjectKind::StaticLibrary => "static_library",
            ProjectKind::DynamicLibrary => "dynamic_library",
            ProjectKind::ManagedExecutable => "managed_executable",
            ProjectKind::ManagedLibrary => "managed_library",
        }
    }
}

impl fmt::Display for ProjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file of a project as the emitters see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub path: PathBuf,
    /// Relative to the project's root directory
    pub relative: PathBuf,
    pub kind: FileKind,
}

impl From<&SourceFile> for FileEntry {
    fn from(file: &SourceFile) -> Self {
        Self {
            path: file.path.clone(),
            relative: file.relative.clone(),
            kind: file.kind,
        }
    }
}

impl FileEntry {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectDescriptor {
    pub name: String,
    /// Folder chain between the search root and the project directory; never empty
    pub group_path: Vec<String>,
    pub kind: ProjectKind,
    pub root_dir: PathBuf,
    /// Descriptor (`.Build.py`/`.Build.cs`) or `.csproj` the project was found through
    pub source_file: PathBuf,
    pub meta_dir: PathBuf,
    pub include_dirs: Vec<PathBuf>,
    pub files: BTreeMap<FileGroup, Vec<FileEntry>>,
}

impl ProjectDescriptor {
    pub fn group_label(&self) -> String {
        self.group_path.join("/")
    }

    pub fn files(&self, group: FileGroup) -> &[FileEntry] {
        self.files.get(&group).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every file, grouped in `FileGroup` order.
    pub fn all_files(&self) -> impl Iterator<Item = (FileGroup, &FileEntry)> {
        self.files
            .iter()
            .flat_map(|(group, entries)| entries.iter().map(move |e| (*group, e)))
    }

    pub fn file_count(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    /// C and C++ translation units, in collection order.
    pub fn compilable_sources(&self) -> impl Iterator<Item = &FileEntry> {
        self.files(FileGroup::Sources)
            .iter()
            .filter(|e| e.kind.is_compilable())
    }

    /// Groups files by their `FileGroup`, keeping the given order within each group.
    pub fn group_files<'a>(
        files: impl IntoIterator<Item = &'a SourceFile>,
    ) -> BTreeMap<FileGroup, Vec<FileEntry>> {
        let mut grouped: BTreeMap<FileGroup, Vec<FileEntry>> = BTreeMap::new();
        for file in files {
            grouped.entry(file.group).or_default().push(FileEntry::from(file));
        }
        grouped
    }

    pub fn contains_file(&self, path: &Path) -> bool {
        self.all_files().any(|(_, e)| e.path == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(path: &str, group: FileGroup) -> SourceFile {
        SourceFile {
            path: PathBuf::from("/r/P").join(path),
            relative: PathBuf::from(path),
            group,
            kind: FileKind::from_path(Path::new(path)),
        }
    }

    fn descriptor() -> ProjectDescriptor {
        let files = vec![
            source("Sources/Main.cpp", FileGroup::Sources),
            source("Sources/Main.h", FileGroup::Headers),
            source("Sources/gen.c", FileGroup::Sources),
            source("Meta/P.Build.py", FileGroup::Meta),
        ];
        ProjectDescriptor {
            name: "P".to_string(),
            group_path: vec!["Runtime".to_string(), "MicroServices".to_string()],
            kind: ProjectKind::Executable,
            root_dir: PathBuf::from("/r/P"),
            source_file: PathBuf::from("/r/P/Meta/P.Build.py"),
            meta_dir: PathBuf::from("/r/P/Meta"),
            include_dirs: vec![PathBuf::from("/r/P/Sources")],
            files: ProjectDescriptor::group_files(&files),
        }
    }

    #[test]
    fn test_grouping_and_counts() {
        let p = descriptor();
        assert_eq!(p.file_count(), 4);
        assert_eq!(p.files(FileGroup::Sources).len(), 2);
        assert!(p.files(FileGroup::Configs).is_empty());
        assert_eq!(p.group_label(), "Runtime/MicroServices");
        assert!(p.contains_file(Path::new("/r/P/Sources/Main.h")));
    }

    #[test]
    fn test_all_files_in_group_order() {
        let p = descriptor();
        let groups: Vec<FileGroup> = p.all_files().map(|(g, _)| g).collect();
        assert_eq!(
            groups,
            vec![
                FileGroup::Headers,
                FileGroup::Sources,
                FileGroup::Sources,
                FileGroup::Meta
            ]
        );
        let compilable: Vec<String> = p.compilable_sources().map(|e| e.file_name()).collect();
        assert_eq!(compilable, vec!["Main.cpp", "gen.c"]);
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            ProjectKind::from_output_kind(OutputKind::SharedLibrary),
            ProjectKind::DynamicLibrary
        );
        assert!(ProjectKind::ManagedLibrary.is_managed());
        assert!(!ProjectKind::StaticLibrary.is_executable());
    }
}
