//! `.clangd` configuration files
//!
//! A root file carries the union of every native project's include directories; each
//! native project also gets its own file with a stricter clang-tidy selection.

use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::compile_commands::indexing_flags;
use super::{EmitResult, EmitSettings, Emitter};
use crate::model::ProjectDescriptor;

pub const FILE_NAME: &str = ".clangd";

const HEADER: &str = "# clangd configuration generated by svcbuild; regenerate instead of editing\n\n";

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ClangdConfig {
    compile_flags: CompileFlags,
    index: Index,
    inlay_hints: InlayHints,
    hover: Hover,
    completion: Completion,
    #[serde(skip_serializing_if = "Option::is_none")]
    diagnostics: Option<Diagnostics>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CompileFlags {
    add: Vec<String>,
    remove: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct Index {
    background: &'static str,
    standard_library: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct InlayHints {
    enabled: bool,
    parameter_names: bool,
    deduced_types: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct Hover {
    #[serde(rename = "ShowAKA")]
    show_aka: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct Completion {
    all_scopes: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct Diagnostics {
    clang_tidy: ClangTidy,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ClangTidy {
    add: Vec<String>,
    remove: Vec<String>,
}

fn config(flags: Vec<String>, per_project: bool) -> ClangdConfig {
    ClangdConfig {
        compile_flags: CompileFlags {
            add: flags,
            remove: vec!["-W*".to_string()],
        },
        index: Index {
            background: "Build",
            standard_library: true,
        },
        inlay_hints: InlayHints {
            enabled: true,
            parameter_names: true,
            deduced_types: true,
        },
        hover: Hover { show_aka: true },
        completion: Completion { all_scopes: true },
        diagnostics: per_project.then(|| Diagnostics {
            clang_tidy: ClangTidy {
                add: ["modernize-*", "readability-*", "performance-*"]
                    .iter()
                    .map(|c| c.to_string())
                    .collect(),
                remove: vec!["modernize-use-trailing-return-type".to_string()],
            },
        }),
    }
}

pub fn render<'a>(
    settings: &EmitSettings,
    include_dirs: impl IntoIterator<Item = &'a Path>,
    per_project: bool,
) -> anyhow::Result<String> {
    let flags = indexing_flags(&settings.cxx_standard, settings.platform, include_dirs);
    let body = serde_yaml::to_string(&config(flags, per_project))?;
    Ok(format!("{}{}", HEADER, body))
}

/// Sorted union of the include directories of every native project.
pub fn global_include_dirs(projects: &[ProjectDescriptor]) -> Vec<PathBuf> {
    projects
        .iter()
        .filter(|p| !p.kind.is_managed())
        .flat_map(|p| p.include_dirs.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub struct ClangdEmitter;

impl Emitter for ClangdEmitter {
    fn name(&self) -> &'static str {
        "clangd"
    }

    fn generate(&self, projects: &[ProjectDescriptor], settings: &EmitSettings) -> EmitResult {
        let mut result = EmitResult::default();

        let global = global_include_dirs(projects);
        match render(settings, global.iter().map(PathBuf::as_path), false) {
            Ok(content) => result.write(
                &settings.workspace_name,
                settings.project_root.join(FILE_NAME),
                &content,
            ),
            Err(e) => tracing::error!(error = %e, "Failed to render root .clangd"),
        }

        for project in projects.iter().filter(|p| !p.kind.is_managed()) {
            match render(settings, project.include_dirs.iter().map(PathBuf::as_path), true) {
                Ok(content) => {
                    result.write(&project.name, project.root_dir.join(FILE_NAME), &content)
                }
                Err(e) => {
                    tracing::error!(project = %project.name, error = %e, "Failed to render .clangd")
                }
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::tests::{project, settings};
    use crate::model::{Platform, ProjectKind};
    use tempfile::TempDir;

    fn parse(content: &str) -> serde_yaml::Value {
        serde_yaml::from_str(content).unwrap()
    }

    #[test]
    fn test_root_config_shape() {
        let s = settings(Path::new("/repo"), Platform::Linux);
        let content = render(&s, [Path::new("/repo/Include")], false).unwrap();
        assert!(content.starts_with("# clangd configuration"));

        let value = parse(&content);
        let add = value["CompileFlags"]["Add"].as_sequence().unwrap();
        assert_eq!(add[0].as_str(), Some("-std=c++20"));
        assert_eq!(add.last().unwrap().as_str(), Some("-I/repo/Include"));
        assert_eq!(value["CompileFlags"]["Remove"][0].as_str(), Some("-W*"));
        assert_eq!(value["Index"]["Background"].as_str(), Some("Build"));
        assert_eq!(value["Index"]["StandardLibrary"].as_bool(), Some(true));
        assert_eq!(value["InlayHints"]["DeducedTypes"].as_bool(), Some(true));
        assert_eq!(value["Hover"]["ShowAKA"].as_bool(), Some(true));
        assert_eq!(value["Completion"]["AllScopes"].as_bool(), Some(true));
        assert!(value.get("Diagnostics").is_none());
    }

    #[test]
    fn test_project_config_adds_clang_tidy() {
        let s = settings(Path::new("/repo"), Platform::Linux);
        let value = parse(&render(&s, [Path::new("/repo/Svc/Sources")], true).unwrap());
        let tidy = &value["Diagnostics"]["ClangTidy"];
        let added: Vec<&str> = tidy["Add"]
            .as_sequence()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert_eq!(added, vec!["modernize-*", "readability-*", "performance-*"]);
        assert_eq!(tidy["Remove"][0].as_str(), Some("modernize-use-trailing-return-type"));
    }

    #[test]
    fn test_global_dirs_are_sorted_union_of_native_projects() {
        let root = Path::new("/repo");
        let projects = vec![
            project(root, "Zed", &["S"], ProjectKind::Executable, &[]),
            project(root, "Alpha", &["S"], ProjectKind::StaticLibrary, &[]),
            project(root, "Tool", &["P"], ProjectKind::ManagedExecutable, &[]),
        ];
        let dirs = global_include_dirs(&projects);
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/repo/Include"),
                PathBuf::from("/repo/Source/S/Alpha/Sources"),
                PathBuf::from("/repo/Source/S/Zed/Sources"),
            ]
        );
    }

    #[test]
    fn test_writes_root_and_native_project_files() {
        let temp = TempDir::new().unwrap();
        let s = settings(temp.path(), Platform::Linux);
        let projects = vec![
            project(temp.path(), "Svc", &["S"], ProjectKind::Executable, &[]),
            project(temp.path(), "Tool", &["P"], ProjectKind::ManagedLibrary, &[]),
        ];

        let result = ClangdEmitter.generate(&projects, &s);
        assert_eq!(result.files.len(), 2);
        assert!(temp.path().join(".clangd").is_file());
        assert!(projects[0].root_dir.join(".clangd").is_file());
        assert!(!projects[1].root_dir.join(".clangd").exists());
    }
}
