//! Conversion of discovered units into emitter-facing project descriptors

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

use super::UnitSet;
use crate::collector::FileCollector;
use crate::fs::FileSystem;
use crate::model::{BuildUnit, FileGroup, FileKind, ProjectDescriptor, ProjectKind};

const FALLBACK_GROUP: &str = "Other";

fn native_main_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\bint\s+main\s*\(").expect("main pattern is valid"))
}

fn managed_main_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"static\s+(?:async\s+Task(?:<int>)?|void|int)\s+Main\s*\(")
            .expect("managed main pattern is valid")
    })
}

pub struct ProjectBuilder<'a> {
    fs: &'a dyn FileSystem,
    search_roots: &'a [PathBuf],
    project_root: &'a Path,
}

impl<'a> ProjectBuilder<'a> {
    pub fn new(
        fs: &'a dyn FileSystem,
        search_roots: &'a [PathBuf],
        project_root: &'a Path,
    ) -> Self {
        Self {
            fs,
            search_roots,
            project_root,
        }
    }

    /// Native projects in unit order, then managed projects in path order.
    ///
    /// A `.csproj` inside a native unit's directory belongs to that unit and does not
    /// become a project of its own; neither does one whose name is already taken.
    pub fn build(&self, units: &UnitSet, managed: &[PathBuf]) -> Vec<ProjectDescriptor> {
        let mut projects: Vec<ProjectDescriptor> =
            units.iter().map(|unit| self.native(unit)).collect();

        let mut managed = managed.to_vec();
        managed.sort();
        for csproj in managed {
            let Some(dir) = csproj.parent() else { continue };
            if units.iter().any(|u| dir.starts_with(&u.layout.root)) {
                continue;
            }
            let project = self.managed(&csproj, dir);
            if projects.iter().any(|p| p.name == project.name) {
                debug!(project = %project.name, "Skipping managed project with a taken name");
                continue;
            }
            projects.push(project);
        }

        projects
    }

    pub fn native(&self, unit: &BuildUnit) -> ProjectDescriptor {
        let kind = if unit.kind_declared {
            ProjectKind::from_output_kind(unit.output_kind)
        } else if self.looks_executable(unit) {
            ProjectKind::Executable
        } else {
            ProjectKind::StaticLibrary
        };

        ProjectDescriptor {
            name: unit.name.clone(),
            group_path: self.group_path(&unit.layout.root),
            kind,
            root_dir: unit.layout.root.clone(),
            source_file: unit.descriptor.clone(),
            meta_dir: unit.layout.meta.clone(),
            include_dirs: unit.effective_include_dirs(self.project_root),
            files: ProjectDescriptor::group_files(&unit.source_files),
        }
    }

    pub fn managed(&self, csproj: &Path, dir: &Path) -> ProjectDescriptor {
        let files = FileCollector::new(self.fs).collect_tree(dir);
        let has_main = files
            .iter()
            .filter(|f| f.kind == FileKind::CSharp)
            .any(|f| self.file_matches(&f.path, managed_main_pattern()));

        let name = csproj
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        ProjectDescriptor {
            name,
            group_path: self.group_path(dir),
            kind: if has_main {
                ProjectKind::ManagedExecutable
            } else {
                ProjectKind::ManagedLibrary
            },
            root_dir: dir.to_path_buf(),
            source_file: csproj.to_path_buf(),
            meta_dir: dir.to_path_buf(),
            include_dirs: Vec::new(),
            files: ProjectDescriptor::group_files(&files),
        }
    }

    /// Directory components between the closest enclosing search root and the
    /// project's own directory.
    pub fn group_path(&self, project_dir: &Path) -> Vec<String> {
        let parent = project_dir.parent().unwrap_or(project_dir);
        let base = self
            .search_roots
            .iter()
            .filter(|root| parent.starts_with(root))
            .max_by_key(|root| root.components().count());

        let components: Vec<String> = base
            .and_then(|root| parent.strip_prefix(root).ok())
            .map(|rel| {
                rel.components()
                    .map(|c| c.as_os_str().to_string_lossy().to_string())
                    .collect()
            })
            .unwrap_or_default();

        if components.is_empty() {
            vec![FALLBACK_GROUP.to_string()]
        } else {
            components
        }
    }

    fn looks_executable(&self, unit: &BuildUnit) -> bool {
        let sources: Vec<_> = unit
            .files_in(FileGroup::Sources)
            .filter(|f| f.kind == FileKind::CppSource)
            .collect();

        let by_name = sources.iter().any(|f| {
            let name = f.file_name();
            name == "main.cpp" || name.ends_with("Main.cpp")
        });

        by_name
            || sources
                .iter()
                .any(|f| self.file_matches(&f.path, native_main_pattern()))
    }

    fn file_matches(&self, path: &Path, pattern: &Regex) -> bool {
        self.fs
            .read_to_string(path)
            .map(|text| pattern.is_match(&text))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OutputKind, UnitSpec};

    use crate::fs::MockFileSystem;

    fn collected(fs: &MockFileSystem, spec: UnitSpec, root: &str) -> BuildUnit {
        let unit = BuildUnit::from_spec(spec, &PathBuf::from(root).join("Meta/X.Build.py"));
        FileCollector::new(fs).collect(unit)
    }

    fn roots() -> Vec<PathBuf> {
        vec![PathBuf::from("/mock/Source")]
    }

    #[test]
    fn test_group_path_from_search_root() {
        let fs = MockFileSystem::new();
        let roots = vec![
            PathBuf::from("/mock/Source"),
            PathBuf::from("/mock/Source/Runtime"),
        ];
        let builder = ProjectBuilder::new(&fs, &roots, Path::new("/mock"));

        assert_eq!(
            builder.group_path(Path::new("/mock/Source/Runtime/MicroServices/Player")),
            vec!["MicroServices"]
        );
        assert_eq!(
            builder.group_path(Path::new("/mock/Source/Programs/Tools/Gen")),
            vec!["Programs", "Tools"]
        );
        assert_eq!(
            builder.group_path(Path::new("/mock/Source/Direct")),
            vec!["Other"]
        );
        assert_eq!(builder.group_path(Path::new("/elsewhere/X")), vec!["Other"]);
    }

    #[test]
    fn test_executable_by_file_name() {
        let fs = MockFileSystem::new();
        fs.add_file("Source/Svc/Player/Sources/PlayerMain.cpp", "");
        let unit = collected(&fs, UnitSpec::new("Player"), "/mock/Source/Svc/Player");

        let roots = roots();
        let project = ProjectBuilder::new(&fs, &roots, Path::new("/mock")).native(&unit);
        assert_eq!(project.kind, ProjectKind::Executable);
        assert_eq!(project.group_path, vec!["Svc"]);
        assert_eq!(project.files(FileGroup::Sources).len(), 1);
    }

    #[test]
    fn test_executable_by_content_and_library_fallback() {
        let fs = MockFileSystem::new();
        fs.add_file("Source/A/Sources/App.cpp", "int main(int argc, char** argv) {}");
        fs.add_file("Source/B/Sources/Util.cpp", "int helper() { return 1; }");

        let roots = roots();
        let builder = ProjectBuilder::new(&fs, &roots, Path::new("/mock"));

        let a = collected(&fs, UnitSpec::new("A"), "/mock/Source/A");
        assert_eq!(builder.native(&a).kind, ProjectKind::Executable);

        let b = collected(&fs, UnitSpec::new("B"), "/mock/Source/B");
        assert_eq!(builder.native(&b).kind, ProjectKind::StaticLibrary);
    }

    #[test]
    fn test_declared_kind_wins_over_heuristics() {
        let fs = MockFileSystem::new();
        fs.add_file("Source/Nut/Sources/NutMain.cpp", "int main() {}");
        let mut spec = UnitSpec::new("Nut");
        spec.kind = Some(OutputKind::SharedLibrary);
        let unit = collected(&fs, spec, "/mock/Source/Nut");

        let roots = roots();
        let project = ProjectBuilder::new(&fs, &roots, Path::new("/mock")).native(&unit);
        assert_eq!(project.kind, ProjectKind::DynamicLibrary);
    }

    #[test]
    fn test_managed_projects() {
        let fs = MockFileSystem::new();
        fs.add_file("Source/Programs/Tool/Tool.csproj", "<Project />");
        fs.add_file(
            "Source/Programs/Tool/Program.cs",
            "class P { static async Task Main(string[] args) {} }",
        );
        fs.add_file("Source/Programs/Shared/Shared.csproj", "<Project />");
        fs.add_file("Source/Programs/Shared/Lib.cs", "public class Lib {}");
        fs.add_file("Source/Svc/Player/Player.csproj", "<Project />");
        fs.add_file("Source/Svc/Player/Sources/PlayerMain.cpp", "");

        let player = collected(&fs, UnitSpec::new("Player"), "/mock/Source/Svc/Player");
        let mut units = UnitSet::new();
        units.insert(player);

        let roots = roots();
        let managed = vec![
            PathBuf::from("/mock/Source/Programs/Tool/Tool.csproj"),
            PathBuf::from("/mock/Source/Programs/Shared/Shared.csproj"),
            PathBuf::from("/mock/Source/Svc/Player/Player.csproj"),
        ];
        let projects = ProjectBuilder::new(&fs, &roots, Path::new("/mock")).build(&units, &managed);

        let summary: Vec<(&str, ProjectKind)> =
            projects.iter().map(|p| (p.name.as_str(), p.kind)).collect();
        assert_eq!(
            summary,
            vec![
                ("Player", ProjectKind::Executable),
                ("Shared", ProjectKind::ManagedLibrary),
                ("Tool", ProjectKind::ManagedExecutable),
            ]
        );
        assert_eq!(projects[2].group_path, vec!["Programs"]);
        assert!(projects[2].include_dirs.is_empty());
    }
}
