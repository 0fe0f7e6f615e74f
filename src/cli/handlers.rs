//! Command handlers. Each returns the process exit code.

use std::sync::Arc;
use tracing::{debug, error, info};

use super::commands::{CliArgs, GenerateArgs, ListArgs, UnitArgs};
use super::output::{OutputFormat, OutputFormatter, UnitSummary};
use crate::build::{CompileOrchestrator, RunReport};
use crate::config::SvcbuildConfig;
use crate::context::Context;
use crate::emit::{self, EmitSettings, EmitTarget};
use crate::progress::{ConsoleHandler, FanoutHandler, LoggingHandler, ProgressHandler};
use crate::scaffold::{self, ScaffoldRequest};
use crate::util::paths::normalize;

/// Exit code for bad configuration or arguments
const EXIT_USAGE: i32 = 2;

/// Console output plus structured logs for every progress event. JSON output must stay
/// a single document on stdout, so it gets logs only.
pub fn progress_handler(quiet: bool, format: OutputFormat) -> Arc<dyn ProgressHandler> {
    match format {
        OutputFormat::Json => Arc::new(LoggingHandler),
        OutputFormat::Human => Arc::new(FanoutHandler::new(vec![
            Arc::new(ConsoleHandler::new(quiet)),
            Arc::new(LoggingHandler),
        ])),
    }
}

/// Environment configuration with command-line overrides applied, validated.
pub fn load_config(args: &CliArgs) -> Result<SvcbuildConfig, i32> {
    let mut config = SvcbuildConfig::default();

    if let Some(root) = &args.project_root {
        config.project_root = root.clone();
    }
    if !args.roots.is_empty() {
        config.search_roots = args.roots.clone();
    }
    if let Some(jobs) = args.jobs {
        config.jobs = jobs;
    }
    if let Some(level) = &args.log_level {
        config.log_level = level.to_lowercase();
    }
    // Unit paths are joined onto the root, so `.` and `./x` must not leak into them
    if config.project_root.is_relative() {
        if let Ok(cwd) = std::env::current_dir() {
            config.project_root = normalize(&cwd.join(&config.project_root));
        }
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        eprintln!("Error: {}", e);
        return Err(EXIT_USAGE);
    }

    debug!(root = %config.project_root.display(), jobs = config.jobs, "Configuration loaded");
    Ok(config)
}

fn load_context(args: &CliArgs, progress: &dyn ProgressHandler) -> Result<Context, i32> {
    let config = load_config(args)?;
    Ok(Context::system(config).discover(progress))
}

fn print_report(report: &RunReport, format: OutputFormat) -> i32 {
    match OutputFormatter::new(format).format_report(report) {
        Ok(output) => {
            println!("{}", output);
            report.exit_code()
        }
        Err(e) => {
            error!("Failed to format report: {}", e);
            eprintln!("Error: {}", e);
            1
        }
    }
}

pub fn handle_build(args: &CliArgs, unit_args: &UnitArgs) -> i32 {
    run_units(args, unit_args, |orchestrator, target| orchestrator.build(target))
}

pub fn handle_clean(args: &CliArgs, unit_args: &UnitArgs) -> i32 {
    run_units(args, unit_args, |orchestrator, target| orchestrator.clean(target))
}

pub fn handle_package(args: &CliArgs, unit_args: &UnitArgs) -> i32 {
    run_units(args, unit_args, |orchestrator, target| orchestrator.package(target))
}

fn run_units(
    args: &CliArgs,
    unit_args: &UnitArgs,
    operation: impl FnOnce(&CompileOrchestrator<'_>, Option<&str>) -> RunReport,
) -> i32 {
    let format: OutputFormat = unit_args.format.into();
    let progress = progress_handler(args.quiet, format);
    let ctx = match load_context(args, &*progress) {
        Ok(ctx) => ctx,
        Err(code) => return code,
    };

    let orchestrator = CompileOrchestrator::new(&ctx, progress);
    let report = operation(&orchestrator, unit_args.unit.as_deref());
    print_report(&report, format)
}

pub fn handle_list(args: &CliArgs, list_args: &ListArgs) -> i32 {
    let format: OutputFormat = list_args.format.into();
    let progress = progress_handler(args.quiet, format);
    let ctx = match load_context(args, &*progress) {
        Ok(ctx) => ctx,
        Err(code) => return code,
    };

    let formatter = OutputFormatter::new(format);
    if args.verbose && format == OutputFormat::Human {
        match formatter.format_config(&ctx.config) {
            Ok(output) => println!("{}", output),
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    let units: Vec<UnitSummary> = ctx.units.iter().map(UnitSummary::from).collect();
    match formatter.format_units(&units) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
            0
        }
        Err(e) => {
            error!("Failed to format units: {}", e);
            eprintln!("Error: {}", e);
            1
        }
    }
}

pub fn handle_generate(args: &CliArgs, gen_args: &GenerateArgs) -> i32 {
    let config = match load_config(args) {
        Ok(config) => config,
        Err(code) => return code,
    };

    let parent_dir = config.project_root.join(&gen_args.dir);
    let mut port_search_roots = config.resolved_search_roots();
    if !port_search_roots.iter().any(|root| parent_dir.starts_with(root)) {
        port_search_roots.push(parent_dir.clone());
    }

    let request = ScaffoldRequest {
        name: gen_args.name.clone(),
        port: gen_args.port,
        parent_dir,
        port_search_roots,
    };

    match scaffold::generate(&request) {
        Ok(created) => {
            println!("Created {} at {}", gen_args.name, created.unit_dir.display());
            println!("Listen port: {}", created.port);
            if args.verbose {
                for file in &created.files {
                    println!("  {}", file.display());
                }
            }
            0
        }
        Err(e) => {
            error!("Scaffolding failed: {}", e);
            eprintln!("Error: {}", e);
            1
        }
    }
}

pub fn handle_emit(args: &CliArgs, target: EmitTarget) -> i32 {
    let progress = progress_handler(args.quiet, OutputFormat::Human);
    let ctx = match load_context(args, &*progress) {
        Ok(ctx) => ctx,
        Err(code) => return code,
    };

    let settings = EmitSettings::from_config(&ctx.config, ctx.platform);
    let projects = ctx.projects();
    info!(projects = projects.len(), target = ?target, "Generating project files");

    let result = emit::emit(target, &projects, &settings, &*progress);
    if result.is_success() {
        if !args.quiet {
            println!("Generated {} file(s) for {} project(s)", result.files.len(), projects.len());
        }
        0
    } else {
        for failure in &result.failures {
            eprintln!(
                "Error: {} ({}): {}",
                failure.project,
                failure.path.display(),
                failure.message
            );
        }
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serial_test::serial;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn args(root: &std::path::Path, rest: &[&str]) -> CliArgs {
        let mut argv = vec!["svcbuild", "--project-root", root.to_str().unwrap()];
        argv.extend_from_slice(rest);
        CliArgs::parse_from(argv)
    }

    #[test]
    #[serial]
    fn test_load_config_applies_overrides() {
        let temp = TempDir::new().unwrap();
        let cli = args(temp.path(), &["-j", "3", "--root", "Services", "list"]);

        let config = load_config(&cli).unwrap();
        assert_eq!(config.project_root, temp.path());
        assert_eq!(config.jobs, 3);
        assert_eq!(config.search_roots, vec![PathBuf::from("Services")]);
    }

    #[test]
    #[serial]
    fn test_load_config_makes_dot_root_absolute() {
        let cli = args(std::path::Path::new("."), &["list"]);

        let config = load_config(&cli).unwrap();
        let cwd = std::env::current_dir().unwrap();
        assert!(config.project_root.is_absolute());
        assert_eq!(config.project_root, normalize(&cwd));
    }

    #[test]
    #[serial]
    fn test_load_config_rejects_zero_jobs() {
        let temp = TempDir::new().unwrap();
        let cli = args(temp.path(), &["-j", "0", "list"]);
        assert_eq!(load_config(&cli).unwrap_err(), EXIT_USAGE);
    }

    #[test]
    #[serial]
    fn test_load_config_rejects_missing_root() {
        let cli = args(std::path::Path::new("/definitely/not/here"), &["list"]);
        assert_eq!(load_config(&cli).unwrap_err(), EXIT_USAGE);
    }

    #[test]
    #[serial]
    fn test_generate_then_refuse() {
        let temp = TempDir::new().unwrap();
        let cli = args(temp.path(), &["-q", "generate", "Chat", "--port", "6001"]);
        let gen_args = match &cli.command {
            crate::cli::commands::Commands::Generate(g) => g.clone(),
            _ => unreachable!(),
        };

        assert_eq!(handle_generate(&cli, &gen_args), 0);
        assert!(temp
            .path()
            .join("MicroServices/Chat/Meta/Chat.Build.py")
            .is_file());
        assert_eq!(handle_generate(&cli, &gen_args), 1);
    }
}
