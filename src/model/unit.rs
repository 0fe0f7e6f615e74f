//! Build unit model

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use super::file::{FileGroup, SourceFile};
use crate::util::paths::normalize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    StaticLibrary,
    SharedLibrary,
    Executable,
}

impl OutputKind {
    /// Infers the artifact kind from a declared output file name.
    pub fn from_output_name(output: &str) -> Self {
        let ext = Path::new(output)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("a" | "lib") => OutputKind::StaticLibrary,
            Some("so" | "dylib" | "dll") => OutputKind::SharedLibrary,
            _ => OutputKind::Executable,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().replace('-', "_").as_str() {
            "executable" | "exe" | "program" => Some(OutputKind::Executable),
            "static_library" | "static_lib" | "static" => Some(OutputKind::StaticLibrary),
            "shared_library" | "shared_lib" | "shared" | "dynamic_library" => {
                Some(OutputKind::SharedLibrary)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputKind::StaticLibrary => "static_library",
            OutputKind::SharedLibrary => "shared_library",
            OutputKind::Executable => "executable",
        }
    }

    /// File name of the linked artifact; an extension already present in `output_name` is kept.
    pub fn artifact_file_name(&self, output_name: &str, platform: Platform, msvc: bool) -> String {
        if Path::new(output_name).extension().is_some()
            && OutputKind::from_output_name(output_name) == *self
        {
            return output_name.to_string();
        }

        let suffix = match (self, platform) {
            (OutputKind::Executable, Platform::Windows) => ".exe",
            (OutputKind::Executable, _) => "",
            (OutputKind::StaticLibrary, _) if msvc => ".lib",
            (OutputKind::StaticLibrary, _) => ".a",
            (OutputKind::SharedLibrary, Platform::Windows) => ".dll",
            (OutputKind::SharedLibrary, Platform::MacOs) => ".dylib",
            (OutputKind::SharedLibrary, Platform::Linux) => ".so",
        };
        format!("{}{}", output_name, suffix)
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }
}

/// Dialect-neutral result of parsing a descriptor file.
///
/// List-valued fields keep the declared order and the declared (descriptor-relative) spelling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSpec {
    pub name: String,
    pub sources: Vec<String>,
    pub include_dirs: Vec<String>,
    pub proto_files: Vec<String>,
    pub config_files: Vec<String>,
    pub dependencies: Vec<String>,
    pub output: Option<String>,
    pub kind: Option<OutputKind>,
    /// Take every `.proto` under the proto directory instead of a declared list
    #[serde(default)]
    pub discover_protos: bool,
}

impl UnitSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn output_kind(&self) -> OutputKind {
        self.kind.unwrap_or_else(|| {
            self.output
                .as_deref()
                .map(OutputKind::from_output_name)
                .unwrap_or(OutputKind::Executable)
        })
    }
}

/// Canonical directory layout derived from a unit's root directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitLayout {
    pub root: PathBuf,
    pub sources: PathBuf,
    pub protos: PathBuf,
    pub configs: PathBuf,
    pub meta: PathBuf,
    pub output: PathBuf,
    pub intermediate: PathBuf,
}

impl UnitLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            sources: root.join("Sources"),
            protos: root.join("Protos"),
            configs: root.join("Configs"),
            meta: root.join("Meta"),
            output: root.join("Build"),
            intermediate: root.join("Intermediate"),
            root,
        }
    }
}

/// One discoverable, independently buildable service or library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildUnit {
    pub name: String,
    pub descriptor: PathBuf,
    pub layout: UnitLayout,
    pub declared_sources: Vec<String>,
    pub proto_files: Vec<String>,
    pub config_files: Vec<String>,
    pub source_files: Vec<SourceFile>,
    pub include_dirs: BTreeSet<PathBuf>,
    pub dependencies: BTreeSet<String>,
    pub output_kind: OutputKind,
    /// True when the descriptor stated the kind (type key, output extension or class marker).
    pub kind_declared: bool,
    pub output_name: String,
    pub discover_protos: bool,
}

impl BuildUnit {
    /// Builds a unit from its parsed descriptor. The project root is the descriptor's
    /// parent-of-parent directory (`<root>/Meta/<X>.Build.<ext>`).
    pub fn from_spec(spec: UnitSpec, descriptor: &Path) -> Self {
        let descriptor_dir = descriptor.parent().unwrap_or_else(|| Path::new("."));
        let root = descriptor_dir
            .parent()
            .unwrap_or(descriptor_dir)
            .to_path_buf();
        let layout = UnitLayout::new(root);

        let include_dirs = spec
            .include_dirs
            .iter()
            .map(|dir| normalize(&descriptor_dir.join(dir)))
            .collect();

        let kind_declared = spec.kind.is_some()
            || spec
                .output
                .as_deref()
                .map(|o| Path::new(o).extension().is_some())
                .unwrap_or(false);
        let output_kind = spec.output_kind();
        let output_name = spec.output.clone().unwrap_or_else(|| spec.name.clone());

        Self {
            name: spec.name,
            descriptor: descriptor.to_path_buf(),
            layout,
            declared_sources: spec.sources,
            proto_files: spec.proto_files,
            config_files: spec.config_files,
            source_files: Vec::new(),
            include_dirs,
            dependencies: spec.dependencies.into_iter().collect(),
            output_kind,
            kind_declared,
            output_name,
            discover_protos: spec.discover_protos,
        }
    }

    pub fn descriptor_dir(&self) -> &Path {
        self.descriptor.parent().unwrap_or(&self.layout.meta)
    }

    /// Resolves a path string declared in the descriptor.
    pub fn resolve_declared(&self, declared: &str) -> PathBuf {
        normalize(&self.descriptor_dir().join(declared))
    }

    /// Declared proto files, looked up by file name inside the proto directory.
    pub fn declared_protos(&self) -> Vec<PathBuf> {
        self.proto_files
            .iter()
            .filter_map(|p| Path::new(p).file_name())
            .map(|name| self.layout.protos.join(name))
            .collect()
    }

    /// Declared config files, looked up by file name inside the config directory.
    pub fn declared_configs(&self) -> Vec<PathBuf> {
        self.config_files
            .iter()
            .filter_map(|p| Path::new(p).file_name())
            .map(|name| self.layout.configs.join(name))
            .collect()
    }

    /// Include search path used for compilation and indexing: the sources directory,
    /// the declared include directories, then the project-wide `Include` directory.
    pub fn effective_include_dirs(&self, project_root: &Path) -> Vec<PathBuf> {
        let mut dirs = vec![self.layout.sources.clone()];
        for dir in &self.include_dirs {
            if !dirs.contains(dir) {
                dirs.push(dir.clone());
            }
        }
        let shared = project_root.join("Include");
        if !dirs.contains(&shared) {
            dirs.push(shared);
        }
        dirs
    }

    pub fn files_in(&self, group: FileGroup) -> impl Iterator<Item = &SourceFile> {
        self.source_files.iter().filter(move |f| f.group == group)
    }

    pub fn artifact_path(&self, platform: Platform, msvc: bool) -> PathBuf {
        self.layout.output.join(
            self.output_kind
                .artifact_file_name(&self.output_name, platform, msvc),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player_spec() -> UnitSpec {
        UnitSpec {
            name: "PlayerService".to_string(),
            sources: vec!["../Sources/PlayerServiceMain.cpp".to_string()],
            include_dirs: vec!["../Sources".to_string()],
            proto_files: vec!["../Protos/playerservice.proto".to_string()],
            config_files: vec!["../Configs/PlayerServiceConfig.json".to_string()],
            dependencies: vec!["protobuf".to_string()],
            output: Some("PlayerServiceMain".to_string()),
            kind: None,
            discover_protos: false,
        }
    }

    #[test]
    fn test_layout_from_descriptor() {
        let unit = BuildUnit::from_spec(
            player_spec(),
            Path::new("/repo/Source/Runtime/PlayerService/Meta/PlayerService.Build.py"),
        );
        assert_eq!(
            unit.layout.root,
            PathBuf::from("/repo/Source/Runtime/PlayerService")
        );
        assert_eq!(
            unit.layout.output,
            PathBuf::from("/repo/Source/Runtime/PlayerService/Build")
        );
        assert_eq!(
            unit.layout.intermediate,
            PathBuf::from("/repo/Source/Runtime/PlayerService/Intermediate")
        );
        assert!(unit
            .include_dirs
            .contains(&PathBuf::from("/repo/Source/Runtime/PlayerService/Sources")));
    }

    #[test]
    fn test_declared_protos_resolve_into_proto_dir() {
        let unit = BuildUnit::from_spec(player_spec(), Path::new("/r/P/Meta/P.Build.py"));
        assert_eq!(
            unit.declared_protos(),
            vec![PathBuf::from("/r/P/Protos/playerservice.proto")]
        );
        assert_eq!(
            unit.declared_configs(),
            vec![PathBuf::from("/r/P/Configs/PlayerServiceConfig.json")]
        );
    }

    #[test]
    fn test_output_kind_from_name() {
        assert_eq!(OutputKind::from_output_name("LibNut.a"), OutputKind::StaticLibrary);
        assert_eq!(OutputKind::from_output_name("libx.so"), OutputKind::SharedLibrary);
        assert_eq!(OutputKind::from_output_name("PlayerServiceMain"), OutputKind::Executable);
    }

    #[test]
    fn test_artifact_file_name() {
        let exe = OutputKind::Executable;
        assert_eq!(exe.artifact_file_name("App", Platform::Linux, false), "App");
        assert_eq!(exe.artifact_file_name("App", Platform::Windows, true), "App.exe");

        let lib = OutputKind::StaticLibrary;
        assert_eq!(lib.artifact_file_name("LibNut.a", Platform::Linux, false), "LibNut.a");
        assert_eq!(lib.artifact_file_name("LibNut", Platform::Windows, true), "LibNut.lib");

        let shared = OutputKind::SharedLibrary;
        assert_eq!(shared.artifact_file_name("core", Platform::MacOs, false), "core.dylib");
    }

    #[test]
    fn test_kind_declared_tracks_output_extension() {
        let mut spec = player_spec();
        let unit = BuildUnit::from_spec(spec.clone(), Path::new("/r/P/Meta/P.Build.py"));
        assert!(!unit.kind_declared);

        spec.output = Some("P.a".to_string());
        let unit = BuildUnit::from_spec(spec, Path::new("/r/P/Meta/P.Build.py"));
        assert!(unit.kind_declared);
        assert_eq!(unit.output_kind, OutputKind::StaticLibrary);
    }

    #[test]
    fn test_effective_include_dirs_order() {
        let unit = BuildUnit::from_spec(player_spec(), Path::new("/r/P/Meta/P.Build.py"));
        assert_eq!(
            unit.effective_include_dirs(Path::new("/r")),
            vec![PathBuf::from("/r/P/Sources"), PathBuf::from("/r/Include")]
        );
    }

    #[test]
    fn test_parse_kind_names() {
        assert_eq!(OutputKind::parse("static-library"), Some(OutputKind::StaticLibrary));
        assert_eq!(OutputKind::parse("Executable"), Some(OutputKind::Executable));
        assert_eq!(OutputKind::parse("plugin"), None);
    }
}
