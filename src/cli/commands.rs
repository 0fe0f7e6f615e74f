use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::emit::EmitTarget;

/// Service build orchestration and IDE project generation
#[derive(Parser, Debug)]
#[command(
    name = "svcbuild",
    about = "Discover service build descriptors, build them and generate IDE projects",
    version,
    author,
    long_about = "svcbuild finds `<Unit>.Build.py` and `<Unit>.Build.cs` descriptors under the \
                  project's search roots, compiles each unit with the located C++ toolchain \
                  (running protoc first when the unit declares protos) and generates \
                  compile databases, clangd, Visual Studio and Xcode project files."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        long,
        global = true,
        value_name = "DIR",
        help = "Project root (defaults to SVCBUILD_PROJECT_ROOT or the current directory)"
    )]
    pub project_root: Option<PathBuf>,

    #[arg(
        long = "root",
        global = true,
        value_name = "DIR",
        help = "Descriptor search root, relative to the project root (repeatable)"
    )]
    pub roots: Vec<PathBuf>,

    #[arg(short = 'j', long, global = true, value_name = "N", help = "Units built in parallel")]
    pub jobs: Option<usize>,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Verbose output")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - only warnings and failures"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Build one unit or all units",
        long_about = "Runs protoc, compiles every source and links each unit into its Build \
                      directory. Exits non-zero if any unit failed.\n\n\
                      Examples:\n  \
                      svcbuild build\n  \
                      svcbuild build PlayerService\n  \
                      svcbuild -j 8 build --format json"
    )]
    Build(UnitArgs),

    #[command(about = "Remove build output of one unit or all units")]
    Clean(UnitArgs),

    #[command(about = "Archive build output as <Unit>.tar.gz")]
    Package(UnitArgs),

    #[command(visible_alias = "discover", about = "List discovered units")]
    List(ListArgs),

    #[command(
        about = "Scaffold a new service unit",
        long_about = "Creates Sources, Configs, Protos and Meta for a new unit from built-in \
                      templates. Without --port the next port from 50051 not claimed by an \
                      existing *Config.json is used.\n\n\
                      Examples:\n  \
                      svcbuild generate ChatService\n  \
                      svcbuild generate ChatService --port 50100"
    )]
    Generate(GenerateArgs),

    #[command(about = "Generate IDE and editor project files")]
    Projectfiles(ProjectFilesArgs),

    #[command(about = "Generate Xcode projects and workspace")]
    Xcode,

    #[command(about = "Generate Visual Studio projects and solution")]
    Vs,

    #[command(about = "Generate .clangd files and compile_commands.json")]
    Clangd,
}

#[derive(Args, Debug, Clone)]
pub struct UnitArgs {
    #[arg(value_name = "UNIT", help = "Unit name (omit for all units)")]
    pub unit: Option<String>,

    #[arg(short = 'f', long, value_enum, default_value = "human", help = "Report format")]
    pub format: OutputFormatArg,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    #[arg(short = 'f', long, value_enum, default_value = "human", help = "Output format")]
    pub format: OutputFormatArg,
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    #[arg(value_name = "NAME", help = "Unit name, e.g. ChatService")]
    pub name: String,

    #[arg(short = 'p', long, help = "Listen port written to the unit config")]
    pub port: Option<u16>,

    #[arg(
        long,
        value_name = "DIR",
        default_value = "MicroServices",
        help = "Directory the unit is created in, relative to the project root"
    )]
    pub dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ProjectFilesArgs {
    #[arg(
        short = 't',
        long,
        value_enum,
        default_value = "platform",
        help = "What to generate"
    )]
    pub target: EmitTarget,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Human,
    Json,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => super::output::OutputFormat::Human,
            OutputFormatArg::Json => super::output::OutputFormat::Json,
        }
    }
}
