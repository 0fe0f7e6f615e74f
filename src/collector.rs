//! Member file enumeration and classification
//!
//! Files are classified by extension, then the directory they were found in may override
//! the result: everything under `Protos/` and `Meta/` is Meta, `Sources/` only admits
//! headers and sources, `Configs/` only admits configs. Anything unrecognized is Meta, so
//! every regular non-dot file lands in exactly one group.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::fs::FileSystem;
use crate::model::{BuildUnit, FileGroup, FileKind, SourceFile};
use crate::util::paths::{is_hidden, normalize, relative_to};

/// Which canonical directory a file was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirRole {
    Sources,
    Protos,
    Configs,
    Meta,
    /// Anywhere else (declared sources outside `Sources/`, managed project trees)
    Other,
}

/// Group implied by the file extension alone.
pub fn group_for_extension(path: &Path) -> FileGroup {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("h" | "hpp" | "hxx" | "hh") => FileGroup::Headers,
        Some("cpp" | "cxx" | "cc" | "c" | "cs") => FileGroup::Sources,
        Some("json" | "xml" | "yaml" | "yml" | "ini") => FileGroup::Configs,
        _ => FileGroup::Meta,
    }
}

pub fn classify(role: DirRole, path: &Path) -> FileGroup {
    let by_extension = group_for_extension(path);
    match role {
        DirRole::Protos | DirRole::Meta => FileGroup::Meta,
        DirRole::Sources => match by_extension {
            FileGroup::Headers | FileGroup::Sources => by_extension,
            _ => FileGroup::Meta,
        },
        DirRole::Configs => match by_extension {
            FileGroup::Configs => FileGroup::Configs,
            _ => FileGroup::Meta,
        },
        DirRole::Other => by_extension,
    }
}

const PROJECT_FILE_EXTENSIONS: &[&str] = &["csproj", "vcxproj", "pbxproj"];

/// Build output directories never hold member files
fn is_output_dir(path: &Path) -> bool {
    matches!(
        path.file_name().and_then(|n| n.to_str()),
        Some("Build" | "Intermediate" | "bin" | "obj")
    )
}

pub struct FileCollector<'a> {
    fs: &'a dyn FileSystem,
}

impl<'a> FileCollector<'a> {
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        Self { fs }
    }

    /// Returns `unit` with `source_files` filled in, sorted by relative path.
    pub fn collect(&self, mut unit: BuildUnit) -> BuildUnit {
        let root = unit.layout.root.clone();
        let mut files = Vec::new();
        let mut seen = HashSet::new();

        let canonical = [
            (DirRole::Sources, unit.layout.sources.clone()),
            (DirRole::Protos, unit.layout.protos.clone()),
            (DirRole::Configs, unit.layout.configs.clone()),
            (DirRole::Meta, unit.layout.meta.clone()),
        ];

        for (role, dir) in &canonical {
            for path in self.walk(dir) {
                self.push(&mut files, &mut seen, &root, path, *role);
            }
        }

        // Project files sitting directly in the unit root
        if let Ok(entries) = self.fs.read_dir(&root) {
            let mut extra: Vec<PathBuf> = entries
                .into_iter()
                .filter(|e| e.is_file() && !is_hidden(e.path()))
                .map(|e| e.path)
                .filter(|p| {
                    p.extension()
                        .and_then(|e| e.to_str())
                        .map(|e| PROJECT_FILE_EXTENSIONS.contains(&e))
                        .unwrap_or(false)
                })
                .collect();
            extra.sort();
            for path in extra {
                self.push(&mut files, &mut seen, &root, path, DirRole::Meta);
            }
        }

        // Declared sources that live outside the canonical directories
        for declared in &unit.declared_sources {
            let path = unit.resolve_declared(declared);
            if seen.contains(&normalize(&path)) {
                continue;
            }
            if self.fs.is_file(&path) {
                self.push(&mut files, &mut seen, &root, path, DirRole::Other);
            } else {
                warn!(unit = %unit.name, source = %declared, "Declared source file not found");
            }
        }

        files.sort_by(|a, b| a.relative.cmp(&b.relative));

        if unit.discover_protos {
            unit.proto_files = files
                .iter()
                .filter(|f| f.kind == FileKind::Proto && f.path.starts_with(&unit.layout.protos))
                .map(|f| format!("../Protos/{}", f.file_name()))
                .collect();
        }

        debug!(unit = %unit.name, files = files.len(), "Collected unit files");
        unit.source_files = files;
        unit
    }

    /// Classifies every file below `root` by extension only; used for managed projects.
    pub fn collect_tree(&self, root: &Path) -> Vec<SourceFile> {
        let mut files = Vec::new();
        let mut seen = HashSet::new();
        for path in self.walk(root) {
            self.push(&mut files, &mut seen, root, path, DirRole::Other);
        }
        files.sort_by(|a, b| a.relative.cmp(&b.relative));
        files
    }

    fn walk(&self, dir: &Path) -> Vec<PathBuf> {
        if !self.fs.is_dir(dir) {
            return Vec::new();
        }
        match self.fs.walk_files(dir, &is_output_dir) {
            Ok(paths) => paths.into_iter().filter(|p| !is_hidden(p)).collect(),
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Failed to enumerate directory");
                Vec::new()
            }
        }
    }

    fn push(
        &self,
        files: &mut Vec<SourceFile>,
        seen: &mut HashSet<PathBuf>,
        root: &Path,
        path: PathBuf,
        role: DirRole,
    ) {
        // `./Svc/Sources/a.cpp` from a walk and `Svc/Sources/a.cpp` from a declaration
        if !seen.insert(normalize(&path)) {
            return;
        }
        files.push(SourceFile {
            relative: relative_to(&path, root),
            group: classify(role, &path),
            kind: FileKind::from_path(&path),
            path,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;
    use crate::model::UnitSpec;

    fn unit(spec: UnitSpec) -> BuildUnit {
        BuildUnit::from_spec(spec, Path::new("/mock/Svc/Meta/Svc.Build.py"))
    }

    fn group_of(unit: &BuildUnit, relative: &str) -> Option<FileGroup> {
        unit.source_files
            .iter()
            .find(|f| f.relative == Path::new(relative))
            .map(|f| f.group)
    }

    #[test]
    fn test_extension_table() {
        assert_eq!(group_for_extension(Path::new("a.hpp")), FileGroup::Headers);
        assert_eq!(group_for_extension(Path::new("a.cc")), FileGroup::Sources);
        assert_eq!(group_for_extension(Path::new("a.yml")), FileGroup::Configs);
        assert_eq!(group_for_extension(Path::new("a.proto")), FileGroup::Meta);
        assert_eq!(group_for_extension(Path::new("Makefile")), FileGroup::Meta);
    }

    #[test]
    fn test_directory_overrides() {
        assert_eq!(classify(DirRole::Protos, Path::new("x.json")), FileGroup::Meta);
        assert_eq!(classify(DirRole::Sources, Path::new("notes.json")), FileGroup::Meta);
        assert_eq!(classify(DirRole::Configs, Path::new("x.cpp")), FileGroup::Meta);
        assert_eq!(classify(DirRole::Configs, Path::new("x.ini")), FileGroup::Configs);
        assert_eq!(classify(DirRole::Meta, Path::new("x.h")), FileGroup::Meta);
        assert_eq!(classify(DirRole::Other, Path::new("x.h")), FileGroup::Headers);
    }

    #[test]
    fn test_collect_unit_layout() {
        let fs = MockFileSystem::new();
        fs.add_file("Svc/Sources/SvcMain.cpp", "int main() {}");
        fs.add_file("Svc/Sources/Svc.h", "");
        fs.add_file("Svc/Sources/detail/Impl.cc", "");
        fs.add_file("Svc/Sources/README.md", "");
        fs.add_file("Svc/Sources/.clang-format", "");
        fs.add_file("Svc/Protos/svc.proto", "");
        fs.add_file("Svc/Configs/SvcConfig.json", "{}");
        fs.add_file("Svc/Meta/Svc.Build.py", "");
        fs.add_file("Svc/Build/Svc", "binary");
        fs.add_file("Svc/Svc.vcxproj", "");

        let collected = FileCollector::new(&fs).collect(unit(UnitSpec::new("Svc")));

        assert_eq!(group_of(&collected, "Sources/SvcMain.cpp"), Some(FileGroup::Sources));
        assert_eq!(group_of(&collected, "Sources/Svc.h"), Some(FileGroup::Headers));
        assert_eq!(group_of(&collected, "Sources/detail/Impl.cc"), Some(FileGroup::Sources));
        assert_eq!(group_of(&collected, "Sources/README.md"), Some(FileGroup::Meta));
        assert_eq!(group_of(&collected, "Protos/svc.proto"), Some(FileGroup::Meta));
        assert_eq!(group_of(&collected, "Configs/SvcConfig.json"), Some(FileGroup::Configs));
        assert_eq!(group_of(&collected, "Meta/Svc.Build.py"), Some(FileGroup::Meta));
        assert_eq!(group_of(&collected, "Svc.vcxproj"), Some(FileGroup::Meta));
        assert_eq!(group_of(&collected, "Sources/.clang-format"), None);
        assert_eq!(group_of(&collected, "Build/Svc"), None);
    }

    #[test]
    fn test_every_visible_file_classified_once() {
        let fs = MockFileSystem::new();
        let names = [
            "Svc/Sources/a.cpp",
            "Svc/Sources/b.weird",
            "Svc/Sources/nested/c.hxx",
            "Svc/Protos/p.proto",
            "Svc/Protos/p.txt",
            "Svc/Configs/c.yaml",
            "Svc/Configs/c.bin",
            "Svc/Meta/Svc.Build.py",
            "Svc/Meta/Svc.Docker.py",
        ];
        for name in names {
            fs.add_file(name, "");
        }

        let collected = FileCollector::new(&fs).collect(unit(UnitSpec::new("Svc")));
        assert_eq!(collected.source_files.len(), names.len());

        let unique: HashSet<&PathBuf> = collected.source_files.iter().map(|f| &f.path).collect();
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn test_sorted_output() {
        let fs = MockFileSystem::new();
        fs.add_file("Svc/Sources/z.cpp", "");
        fs.add_file("Svc/Sources/a.cpp", "");
        fs.add_file("Svc/Configs/m.json", "");

        let collected = FileCollector::new(&fs).collect(unit(UnitSpec::new("Svc")));
        let rel: Vec<String> = collected
            .source_files
            .iter()
            .map(|f| f.relative.to_string_lossy().to_string())
            .collect();
        assert_eq!(rel, vec!["Configs/m.json", "Sources/a.cpp", "Sources/z.cpp"]);
    }

    #[test]
    fn test_declared_sources_outside_sources_dir() {
        let fs = MockFileSystem::new();
        fs.add_file("Svc/src/NutAllocator.cpp", "");
        fs.add_file("Svc/include/Nut.h", "");

        let mut spec = UnitSpec::new("Svc");
        spec.sources = vec![
            "../src/NutAllocator.cpp".to_string(),
            "../src/Missing.cpp".to_string(),
        ];
        let collected = FileCollector::new(&fs).collect(unit(spec));

        assert_eq!(collected.source_files.len(), 1);
        assert_eq!(group_of(&collected, "src/NutAllocator.cpp"), Some(FileGroup::Sources));
    }

    #[test]
    fn test_declared_source_under_dot_relative_root() {
        let fs = MockFileSystem::with_root(PathBuf::from("."));
        fs.add_file("Svc/Sources/Main.cpp", "int main() {}");
        fs.add_file("Svc/Meta/Svc.Build.py", "");

        let mut spec = UnitSpec::new("Svc");
        spec.sources = vec!["../Sources/Main.cpp".to_string()];
        let unit = BuildUnit::from_spec(spec, Path::new("./Svc/Meta/Svc.Build.py"));
        let collected = FileCollector::new(&fs).collect(unit);

        let sources: Vec<&SourceFile> = collected
            .source_files
            .iter()
            .filter(|f| f.group == FileGroup::Sources)
            .collect();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].relative, PathBuf::from("Sources/Main.cpp"));
    }

    #[test]
    fn test_missing_canonical_dirs_are_empty() {
        let fs = MockFileSystem::new();
        fs.add_file("Svc/Meta/Svc.Build.py", "");

        let collected = FileCollector::new(&fs).collect(unit(UnitSpec::new("Svc")));
        assert_eq!(collected.source_files.len(), 1);
    }

    #[test]
    fn test_discovered_protos() {
        let fs = MockFileSystem::new();
        fs.add_file("Svc/Protos/b.proto", "");
        fs.add_file("Svc/Protos/a.proto", "");
        fs.add_file("Svc/Protos/notes.txt", "");

        let mut spec = UnitSpec::new("Svc");
        spec.discover_protos = true;
        let collected = FileCollector::new(&fs).collect(unit(spec));
        assert_eq!(
            collected.proto_files,
            vec!["../Protos/a.proto", "../Protos/b.proto"]
        );
    }

    #[test]
    fn test_collect_tree_for_managed_project() {
        let fs = MockFileSystem::new();
        fs.add_file("Tool/Program.cs", "");
        fs.add_file("Tool/Tool.csproj", "");
        fs.add_file("Tool/appsettings.json", "");
        fs.add_file("Tool/obj/Debug/x.cs", "");

        let files = FileCollector::new(&fs).collect_tree(Path::new("/mock/Tool"));
        let groups: Vec<(String, FileGroup)> = files
            .iter()
            .map(|f| (f.file_name(), f.group))
            .collect();
        assert_eq!(
            groups,
            vec![
                ("Program.cs".to_string(), FileGroup::Sources),
                ("Tool.csproj".to_string(), FileGroup::Meta),
                ("appsettings.json".to_string(), FileGroup::Configs),
            ]
        );
    }
}
