//! Per-unit build stages
//!
//! Each stage is a hard gate: the first error aborts the remaining stages of that unit.

use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::runner::{CommandOutput, CommandRunner, ToolCommand};
use crate::error::BuildError;
use crate::model::{BuildUnit, OutputKind, Platform};
use crate::progress::{ProgressEvent, ProgressHandler};
use crate::toolchain::{Toolchain, ToolchainError};
use crate::util::paths::normalize;

const SOURCE_EXTENSIONS: &[&str] = &["cpp", "cc", "c"];

/// Everything a stage may read while building one unit
pub struct StageContext<'a> {
    pub unit: &'a BuildUnit,
    pub toolchain: &'a Toolchain,
    /// Present whenever the unit has proto inputs on disk
    pub protoc: Option<&'a Path>,
    pub runner: &'a dyn CommandRunner,
    pub progress: &'a dyn ProgressHandler,
    pub cxx_standard: &'a str,
    pub project_root: &'a Path,
    pub platform: Platform,
}

impl StageContext<'_> {
    fn note(&self, message: impl Into<String>) {
        self.progress.on_progress(&ProgressEvent::Note {
            unit: self.unit.name.clone(),
            message: message.into(),
        });
    }

    fn warn(&self, message: impl Into<String>) {
        self.progress.on_progress(&ProgressEvent::Warning {
            unit: self.unit.name.clone(),
            message: message.into(),
        });
    }

    /// Runs `command`; a failed spawn or a non-zero exit becomes `Err(message)`.
    fn run_tool(&self, command: &ToolCommand) -> Result<CommandOutput, String> {
        self.progress.on_progress(&ProgressEvent::CommandStarted {
            unit: self.unit.name.clone(),
            command: command.to_string(),
        });

        let output = self.runner.run(command).map_err(|e| {
            format!("failed to start {}: {}", command.program.display(), e)
        })?;
        if !output.success {
            return Err(output.diagnostics());
        }

        let chatter = output.stderr.trim();
        if !chatter.is_empty() {
            self.note(chatter.to_string());
        }
        Ok(output)
    }
}

/// Results handed from one stage to the next
#[derive(Debug, Default)]
pub struct StageState {
    pub objects: Vec<PathBuf>,
    pub artifact: Option<PathBuf>,
}

pub trait BuildStage: Send + Sync {
    fn name(&self) -> &'static str;

    /// Stages that do not apply are skipped without a progress line.
    fn applies(&self, _unit: &BuildUnit) -> bool {
        true
    }

    fn execute(&self, ctx: &StageContext<'_>, state: &mut StageState) -> Result<(), BuildError>;
}

/// The fixed stage order of a build
pub fn pipeline() -> Vec<Box<dyn BuildStage>> {
    vec![
        Box::new(ProtoGenStage),
        Box::new(CompileStage),
        Box::new(LinkStage),
        Box::new(StageFilesStage),
    ]
}

/// Declared protos split into `(present, missing)`.
pub fn proto_inputs(unit: &BuildUnit) -> (Vec<PathBuf>, Vec<PathBuf>) {
    unit.declared_protos().into_iter().partition(|p| p.is_file())
}

pub struct ProtoGenStage;

impl BuildStage for ProtoGenStage {
    fn name(&self) -> &'static str {
        "ProtoGen"
    }

    fn applies(&self, unit: &BuildUnit) -> bool {
        !unit.proto_files.is_empty()
    }

    fn execute(&self, ctx: &StageContext<'_>, _state: &mut StageState) -> Result<(), BuildError> {
        let (present, missing) = proto_inputs(ctx.unit);
        for proto in &missing {
            ctx.warn(format!("proto file not found: {}", proto.display()));
        }
        if present.is_empty() {
            return Ok(());
        }

        let protoc = ctx.protoc.ok_or_else(|| BuildError::ToolchainUnavailable {
            unit: ctx.unit.name.clone(),
            source: ToolchainError::ProtocNotFound {
                searched: Vec::new(),
            },
        })?;

        let layout = &ctx.unit.layout;
        std::fs::create_dir_all(&layout.sources)
            .map_err(|e| BuildError::io(&layout.sources, e))?;

        for proto in present {
            ctx.note(format!("protoc {}", file_name(&proto)));
            let command = ToolCommand::new(protoc)
                .arg(format!("--cpp_out={}", layout.sources.display()))
                .arg(format!("--proto_path={}", layout.protos.display()))
                .path_arg(&proto);

            ctx.run_tool(&command)
                .map_err(|message| BuildError::ProtoGenFailure {
                    proto: proto.clone(),
                    message,
                })?;
        }
        Ok(())
    }
}

pub struct CompileStage;

impl CompileStage {
    /// Top-level C/C++ files of the sources directory (which includes protoc output),
    /// then declared sources found elsewhere, without duplicates.
    pub fn inputs(unit: &BuildUnit) -> Result<Vec<PathBuf>, BuildError> {
        let dir = &unit.layout.sources;
        let mut inputs = Vec::new();

        if dir.is_dir() {
            let entries = std::fs::read_dir(dir).map_err(|e| BuildError::io(dir, e))?;
            for entry in entries {
                let path = entry.map_err(|e| BuildError::io(dir, e))?.path();
                if path.is_file() && is_compilable(&path) {
                    inputs.push(path);
                }
            }
            inputs.sort();
        }

        let mut seen: HashSet<PathBuf> = inputs.iter().map(|p| normalize(p)).collect();
        for declared in &unit.declared_sources {
            let path = unit.resolve_declared(declared);
            if is_compilable(&path) && path.is_file() && seen.insert(normalize(&path)) {
                inputs.push(path);
            }
        }

        Ok(inputs)
    }

    /// Object path for every input. Inputs sharing a stem get a numeric suffix.
    pub fn object_paths(inputs: &[PathBuf], dir: &Path, object_ext: &str) -> Vec<PathBuf> {
        let mut used = HashSet::new();
        inputs
            .iter()
            .map(|src| {
                let stem = src
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default();
                let mut candidate = stem.clone();
                let mut n = 1;
                while !used.insert(candidate.clone()) {
                    candidate = format!("{}_{}", stem, n);
                    n += 1;
                }
                dir.join(format!("{}{}", candidate, object_ext))
            })
            .collect()
    }

    pub fn command(ctx: &StageContext<'_>, source: &Path, object: &Path) -> ToolCommand {
        let tc = ctx.toolchain;
        let includes = ctx.unit.effective_include_dirs(ctx.project_root);

        if tc.is_msvc() {
            ToolCommand::new(&tc.compiler)
                .arg("/nologo")
                .arg(format!("/std:{}", msvc_standard(ctx.cxx_standard)))
                .arg("/EHsc")
                .args(includes.iter().map(|d| format!("/I{}", d.display())))
                .arg("/c")
                .path_arg(source)
                .arg(format!("/Fo{}", object.display()))
        } else {
            let mut cmd = ToolCommand::new(&tc.compiler).arg(format!("-std={}", ctx.cxx_standard));
            if ctx.unit.output_kind == OutputKind::SharedLibrary {
                cmd = cmd.arg("-fPIC");
            }
            for dir in &includes {
                cmd = cmd.arg("-I").path_arg(dir);
            }
            cmd.arg("-c").path_arg(source).arg("-o").path_arg(object)
        }
    }
}

impl BuildStage for CompileStage {
    fn name(&self) -> &'static str {
        "Compile"
    }

    fn execute(&self, ctx: &StageContext<'_>, state: &mut StageState) -> Result<(), BuildError> {
        let layout = &ctx.unit.layout;
        let inputs = Self::inputs(ctx.unit)?;
        if inputs.is_empty() {
            return Err(BuildError::NoSourceFiles {
                unit: ctx.unit.name.clone(),
                dir: layout.sources.clone(),
            });
        }

        std::fs::create_dir_all(&layout.intermediate)
            .map_err(|e| BuildError::io(&layout.intermediate, e))?;

        let objects = Self::object_paths(&inputs, &layout.intermediate, ctx.toolchain.object_ext);
        debug!(unit = %ctx.unit.name, files = inputs.len(), "Compiling");

        // Every object must exist before linking starts.
        inputs
            .par_iter()
            .zip(objects.par_iter())
            .map(|(source, object)| {
                ctx.note(format!("{} -> {}", file_name(source), file_name(object)));
                let command = Self::command(ctx, source, object);
                ctx.run_tool(&command)
                    .map(|_| ())
                    .map_err(|message| BuildError::CompileFailure {
                        file: source.clone(),
                        message,
                    })
            })
            .collect::<Result<Vec<()>, BuildError>>()?;

        state.objects = objects;
        Ok(())
    }
}

pub struct LinkStage;

impl LinkStage {
    pub fn command(ctx: &StageContext<'_>, objects: &[PathBuf], artifact: &Path) -> ToolCommand {
        let tc = ctx.toolchain;
        let objects = objects.iter().map(|o| o.display().to_string());

        match (ctx.unit.output_kind, tc.is_msvc()) {
            (OutputKind::StaticLibrary, false) => ToolCommand::new(&tc.archiver)
                .arg("rcs")
                .path_arg(artifact)
                .args(objects),
            (OutputKind::StaticLibrary, true) => ToolCommand::new(&tc.archiver)
                .arg("/nologo")
                .arg(format!("/OUT:{}", artifact.display()))
                .args(objects),
            (OutputKind::SharedLibrary, false) => ToolCommand::new(&tc.linker)
                .args(["-shared", "-fPIC"])
                .args(objects)
                .arg("-o")
                .path_arg(artifact),
            (OutputKind::SharedLibrary, true) => ToolCommand::new(&tc.linker)
                .args(["/nologo", "/LD"])
                .args(objects)
                .arg(format!("/Fe{}", artifact.display())),
            (OutputKind::Executable, false) => ToolCommand::new(&tc.linker)
                .args(objects)
                .arg("-o")
                .path_arg(artifact),
            (OutputKind::Executable, true) => ToolCommand::new(&tc.linker)
                .arg("/nologo")
                .args(objects)
                .arg(format!("/Fe{}", artifact.display())),
        }
    }
}

impl BuildStage for LinkStage {
    fn name(&self) -> &'static str {
        "Link"
    }

    fn execute(&self, ctx: &StageContext<'_>, state: &mut StageState) -> Result<(), BuildError> {
        let output_dir = &ctx.unit.layout.output;
        std::fs::create_dir_all(output_dir).map_err(|e| BuildError::io(output_dir, e))?;

        let artifact = ctx
            .unit
            .artifact_path(ctx.platform, ctx.toolchain.is_msvc());
        ctx.note(format!("link {}", file_name(&artifact)));

        let command = Self::command(ctx, &state.objects, &artifact);
        ctx.run_tool(&command)
            .map_err(|message| BuildError::LinkFailure {
                output: artifact.clone(),
                message,
            })?;

        state.artifact = Some(artifact);
        Ok(())
    }
}

/// Copies declared configs and protos next to the artifact.
pub struct StageFilesStage;

impl BuildStage for StageFilesStage {
    fn name(&self) -> &'static str {
        "Stage"
    }

    fn applies(&self, unit: &BuildUnit) -> bool {
        !unit.config_files.is_empty() || !unit.proto_files.is_empty()
    }

    fn execute(&self, ctx: &StageContext<'_>, _state: &mut StageState) -> Result<(), BuildError> {
        let unit = ctx.unit;
        let output_dir = &unit.layout.output;

        for src in unit.declared_configs().into_iter().chain(unit.declared_protos()) {
            if !src.is_file() {
                debug!(unit = %unit.name, file = %src.display(), "Nothing to stage");
                continue;
            }
            let dest = output_dir.join(file_name(&src));
            std::fs::copy(&src, &dest).map_err(|e| BuildError::io(&dest, e))?;
            ctx.note(format!("copied {}", file_name(&src)));
        }
        Ok(())
    }
}

fn is_compilable(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SOURCE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// `cl.exe` spelling of a `-std=` value.
pub fn msvc_standard(standard: &str) -> String {
    let standard = standard.replace("gnu++", "c++");
    match standard.as_str() {
        "c++23" | "c++2b" | "c++26" => "c++latest".to_string(),
        _ => standard,
    }
}
