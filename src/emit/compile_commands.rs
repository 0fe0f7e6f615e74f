//! `compile_commands.json` generation
//!
//! One record per translation unit of every native project, written as a single
//! pretty-printed array at the project root and again per project under its `Meta`
//! directory. The commands exist for indexing only.

use serde::Serialize;
use std::path::Path;

use super::{EmitResult, EmitSettings, Emitter};
use crate::model::{Platform, ProjectDescriptor};
use crate::util::paths::to_forward_slashes;

pub const FILE_NAME: &str = "compile_commands.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileCommand {
    pub directory: String,
    pub command: String,
    pub file: String,
}

/// Flags shared by compile databases and `.clangd` files.
pub fn indexing_flags<'a>(
    cxx_standard: &str,
    platform: Platform,
    include_dirs: impl IntoIterator<Item = &'a Path>,
) -> Vec<String> {
    let mut flags = vec![
        format!("-std={}", cxx_standard),
        "-Wall".to_string(),
        "-Wextra".to_string(),
        "-g".to_string(),
        "-O0".to_string(),
        "-DDEBUG".to_string(),
    ];
    if platform == Platform::MacOs {
        flags.push("-mmacosx-version-min=10.15".to_string());
    }
    flags.extend(include_dirs.into_iter().map(|d| format!("-I{}", to_forward_slashes(d))));
    flags
}

fn shell_quote(arg: &str) -> String {
    if arg.contains(' ') {
        format!("\"{}\"", arg)
    } else {
        arg.to_string()
    }
}

/// Records for one project in source collection order; empty for managed projects.
pub fn project_commands(
    project: &ProjectDescriptor,
    settings: &EmitSettings,
) -> Vec<CompileCommand> {
    if project.kind.is_managed() {
        return Vec::new();
    }

    let flags = indexing_flags(
        &settings.cxx_standard,
        settings.platform,
        project.include_dirs.iter().map(|d| d.as_path()),
    );
    let directory = to_forward_slashes(&settings.project_root);

    project
        .compilable_sources()
        .map(|source| {
            let file = to_forward_slashes(&source.path);
            let mut parts = vec!["clang++".to_string()];
            parts.extend(flags.iter().map(|f| shell_quote(f)));
            parts.push("-c".to_string());
            parts.push(shell_quote(&file));
            CompileCommand {
                directory: directory.clone(),
                command: parts.join(" "),
                file,
            }
        })
        .collect()
}

pub fn render(commands: &[CompileCommand]) -> String {
    // Serializing plain string fields cannot fail.
    let mut out = serde_json::to_string_pretty(commands).unwrap_or_else(|_| "[]".to_string());
    out.push('\n');
    out
}

pub struct CompileCommandsEmitter;

impl Emitter for CompileCommandsEmitter {
    fn name(&self) -> &'static str {
        "compile_commands"
    }

    fn generate(&self, projects: &[ProjectDescriptor], settings: &EmitSettings) -> EmitResult {
        let mut result = EmitResult::default();
        let mut all = Vec::new();

        for project in projects.iter().filter(|p| !p.kind.is_managed()) {
            let commands = project_commands(project, settings);
            result.write(&project.name, project.meta_dir.join(FILE_NAME), &render(&commands));
            all.extend(commands);
        }

        result.write(
            &settings.workspace_name,
            settings.project_root.join(FILE_NAME),
            &render(&all),
        );
        result
    }
}
