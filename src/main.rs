use svcbuild::cli::commands::{CliArgs, Commands};
use svcbuild::cli::handlers::{
    handle_build, handle_clean, handle_emit, handle_generate, handle_list, handle_package,
};
use svcbuild::emit::EmitTarget;
use svcbuild::util::logging::{config_from_env, init_logging, parse_level};
use svcbuild::VERSION;

use clap::Parser;
use tracing::{debug, Level};

fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("svcbuild v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Build(unit_args) => handle_build(&args, unit_args),
        Commands::Clean(unit_args) => handle_clean(&args, unit_args),
        Commands::Package(unit_args) => handle_package(&args, unit_args),
        Commands::List(list_args) => handle_list(&args, list_args),
        Commands::Generate(gen_args) => handle_generate(&args, gen_args),
        Commands::Projectfiles(pf_args) => handle_emit(&args, pf_args.target),
        Commands::Xcode => handle_emit(&args, EmitTarget::Xcode),
        Commands::Vs => handle_emit(&args, EmitTarget::Vs),
        Commands::Clangd => handle_emit(&args, EmitTarget::Clangd),
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let level = if let Some(level_str) = &args.log_level {
        Some(parse_level(level_str))
    } else if args.verbose {
        Some(Level::DEBUG)
    } else if args.quiet {
        Some(Level::ERROR)
    } else {
        None
    };

    init_logging(config_from_env(level));
}
