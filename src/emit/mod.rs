//! IDE and editor project generation
//!
//! Every emitter consumes the same list of [`ProjectDescriptor`]s and owns one output
//! format. A write failure for one project is logged and recorded; the remaining
//! projects are still emitted. IDE project files never compile anything themselves:
//! their single build step calls back into `svcbuild build <unit>`.

pub mod clangd;
pub mod compile_commands;
pub mod ids;
pub mod vcxproj;
pub mod workspace;
pub mod xcode;

use anyhow::{Context as _, Result};
use clap::ValueEnum;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::config::SvcbuildConfig;
use crate::model::{Platform, ProjectDescriptor};
use crate::progress::{ProgressEvent, ProgressHandler};
use crate::util::paths::relative_to;

pub use clangd::ClangdEmitter;
pub use compile_commands::CompileCommandsEmitter;
pub use vcxproj::VcxprojEmitter;
pub use workspace::{SolutionEmitter, XcodeWorkspaceEmitter};
pub use xcode::XcodeEmitter;

/// Settings shared by all emitters, taken from the run configuration.
#[derive(Debug, Clone)]
pub struct EmitSettings {
    pub project_root: PathBuf,
    /// Absolute directory receiving `.vcxproj` and `.xcodeproj` files
    pub projects_dir: PathBuf,
    pub workspace_name: String,
    pub orchestrator_bin: String,
    pub cxx_standard: String,
    pub platform: Platform,
}

impl EmitSettings {
    pub fn from_config(config: &SvcbuildConfig, platform: Platform) -> Self {
        Self {
            project_root: config.project_root.clone(),
            projects_dir: config.projects_path(),
            workspace_name: config.workspace_name(),
            orchestrator_bin: config.orchestrator_bin.clone(),
            cxx_standard: config.cxx_standard.clone(),
            platform,
        }
    }

    /// Directory holding one project's IDE files: `<projects_dir>/<group path>`.
    pub fn project_dir(&self, project: &ProjectDescriptor) -> PathBuf {
        project
            .group_path
            .iter()
            .fold(self.projects_dir.clone(), |dir, part| dir.join(part))
    }

    /// Project root as seen from a generated project's directory.
    pub fn root_from(&self, dir: &Path) -> PathBuf {
        relative_to(&self.project_root, dir)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitFailure {
    pub project: String,
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct EmitResult {
    pub files: Vec<PathBuf>,
    pub failures: Vec<EmitFailure>,
}

impl EmitResult {
    /// Writes `content` to `path` and records the outcome under `project`.
    pub fn write(&mut self, project: &str, path: PathBuf, content: &str) {
        match write_file(&path, content) {
            Ok(()) => self.files.push(path),
            Err(e) => {
                error!(
                    project,
                    path = %path.display(),
                    error = %format!("{:#}", e),
                    "Failed to write project file"
                );
                self.failures.push(EmitFailure {
                    project: project.to_string(),
                    path,
                    message: format!("{:#}", e),
                });
            }
        }
    }

    pub fn merge(&mut self, other: EmitResult) {
        self.files.extend(other.files);
        self.failures.extend(other.failures);
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

pub trait Emitter {
    fn name(&self) -> &'static str;

    fn generate(&self, projects: &[ProjectDescriptor], settings: &EmitSettings) -> EmitResult;
}

/// What `projectfiles` should generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EmitTarget {
    /// Root compile_commands.json plus one per unit
    CompileCommands,
    /// .clangd files and compile databases
    Clangd,
    /// .vcxproj files and the .sln
    Vs,
    /// .xcodeproj bundles and the .xcworkspace
    Xcode,
    /// Only the .sln and .xcworkspace
    Workspace,
    /// Everything
    All,
    /// The usual set for the host platform
    #[value(alias = "generate")]
    Platform,
}

impl EmitTarget {
    pub fn emitters(&self, platform: Platform) -> Vec<Box<dyn Emitter>> {
        match self {
            EmitTarget::CompileCommands => vec![Box::new(CompileCommandsEmitter)],
            EmitTarget::Clangd => vec![Box::new(ClangdEmitter), Box::new(CompileCommandsEmitter)],
            EmitTarget::Vs => vec![Box::new(VcxprojEmitter), Box::new(SolutionEmitter)],
            EmitTarget::Xcode => vec![Box::new(XcodeEmitter), Box::new(XcodeWorkspaceEmitter)],
            EmitTarget::Workspace => {
                vec![Box::new(SolutionEmitter), Box::new(XcodeWorkspaceEmitter)]
            }
            EmitTarget::All => {
                let mut all = EmitTarget::Xcode.emitters(platform);
                all.extend(EmitTarget::Vs.emitters(platform));
                all.extend(EmitTarget::Clangd.emitters(platform));
                all
            }
            EmitTarget::Platform => match platform {
                Platform::MacOs => EmitTarget::All.emitters(platform),
                Platform::Windows | Platform::Linux => {
                    let mut set = EmitTarget::Vs.emitters(platform);
                    set.extend(EmitTarget::Clangd.emitters(platform));
                    set
                }
            },
        }
    }
}

/// Runs every emitter of `target` in turn.
pub fn emit(
    target: EmitTarget,
    projects: &[ProjectDescriptor],
    settings: &EmitSettings,
    progress: &dyn ProgressHandler,
) -> EmitResult {
    let mut total = EmitResult::default();
    for emitter in target.emitters(settings.platform) {
        let result = emitter.generate(projects, settings);
        info!(
            emitter = emitter.name(),
            files = result.files.len(),
            failures = result.failures.len(),
            "Emitter finished"
        );
        for failure in &result.failures {
            progress.on_progress(&ProgressEvent::Warning {
                unit: failure.project.clone(),
                message: format!("{}: {}", failure.path.display(), failure.message),
            });
        }
        progress.on_progress(&ProgressEvent::EmitterComplete {
            emitter: emitter.name().to_string(),
            files: result.files.len(),
        });
        total.merge(result);
    }
    total
}

pub(crate) fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

/// Escapes text for XML attribute and element content.
pub(crate) fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::{FileGroup, FileKind, ProjectKind, SourceFile};
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<ProgressEvent>>);

    impl ProgressHandler for Recorder {
        fn on_progress(&self, event: &ProgressEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    pub fn settings(root: &Path, platform: Platform) -> EmitSettings {
        EmitSettings {
            project_root: root.to_path_buf(),
            projects_dir: root.join("Projects"),
            workspace_name: "Nut".to_string(),
            orchestrator_bin: "svcbuild".to_string(),
            cxx_standard: "c++20".to_string(),
            platform,
        }
    }

    pub fn project(
        root: &Path,
        name: &str,
        group: &[&str],
        kind: ProjectKind,
        files: &[&str],
    ) -> ProjectDescriptor {
        let dir = group
            .iter()
            .fold(root.join("Source"), |d, g| d.join(g))
            .join(name);
        let sources: Vec<SourceFile> = files
            .iter()
            .map(|rel| {
                let path = dir.join(rel);
                let kind = FileKind::from_path(&path);
                let group = match rel.split('/').next() {
                    Some("Meta") => FileGroup::Meta,
                    Some("Configs") => FileGroup::Configs,
                    _ if matches!(kind, FileKind::CHeader | FileKind::CppHeader) => {
                        FileGroup::Headers
                    }
                    _ => FileGroup::Sources,
                };
                SourceFile {
                    path,
                    relative: PathBuf::from(rel),
                    group,
                    kind,
                }
            })
            .collect();

        ProjectDescriptor {
            name: name.to_string(),
            group_path: group.iter().map(|g| g.to_string()).collect(),
            kind,
            root_dir: dir.clone(),
            source_file: if kind.is_managed() {
                dir.join(format!("{}.csproj", name))
            } else {
                dir.join(format!("Meta/{}.Build.py", name))
            },
            meta_dir: dir.join("Meta"),
            include_dirs: vec![dir.join("Sources"), root.join("Include")],
            files: ProjectDescriptor::group_files(&sources),
        }
    }

    #[test]
    fn test_platform_default_sets() {
        let names = |p: Platform| -> Vec<&'static str> {
            EmitTarget::Platform.emitters(p).iter().map(|e| e.name()).collect()
        };
        assert_eq!(
            names(Platform::Windows),
            vec!["vcxproj", "solution", "clangd", "compile_commands"]
        );
        assert_eq!(names(Platform::Linux), names(Platform::Windows));
        assert!(names(Platform::MacOs).contains(&"xcode"));
        assert!(names(Platform::MacOs).contains(&"xcworkspace"));
    }

    #[test]
    fn test_project_dir_follows_group_path() {
        let s = settings(Path::new("/repo"), Platform::Linux);
        let p = project(
            Path::new("/repo"),
            "Svc",
            &["Runtime", "MicroServices"],
            ProjectKind::Executable,
            &[],
        );
        assert_eq!(s.project_dir(&p), PathBuf::from("/repo/Projects/Runtime/MicroServices"));
        assert_eq!(s.root_from(&s.project_dir(&p)), PathBuf::from("../../.."));
    }

    #[test]
    fn test_write_failure_is_recorded_not_fatal() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, "file, not a directory").unwrap();

        let mut result = EmitResult::default();
        result.write("A", blocker.join("A.vcxproj"), "x");
        result.write("B", temp.path().join("B.vcxproj"), "y");

        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].project, "A");
        assert_eq!(result.files, vec![temp.path().join("B.vcxproj")]);
    }

    #[test]
    fn test_emit_reports_each_emitter() {
        let temp = TempDir::new().unwrap();
        let s = settings(temp.path(), Platform::Linux);
        let projects = vec![project(
            temp.path(),
            "Svc",
            &["Services"],
            ProjectKind::Executable,
            &["Sources/SvcMain.cpp"],
        )];
        let recorder = Recorder::default();

        let result = emit(EmitTarget::CompileCommands, &projects, &s, &recorder);
        assert!(result.is_success());
        let events = recorder.0.lock().unwrap();
        assert!(events.iter().any(|e| matches!(
            e,
            ProgressEvent::EmitterComplete { emitter, files }
                if emitter == "compile_commands" && *files == 2
        )));
    }

    #[test]
    fn test_xml_escape() {
        assert_eq!(xml_escape("a&b <c> \"d\""), "a&amp;b &lt;c&gt; &quot;d&quot;");
    }
}
