//! svcbuild - build orchestration and IDE project generation for C++ service trees
//!
//! A repository is a set of build units. Each unit lives in its own directory with a
//! `Meta/<Unit>.Build.py` (or `.Build.cs`) descriptor naming its sources, include
//! directories, protos and configs. svcbuild discovers those descriptors, compiles each
//! unit with the located C++ toolchain and generates editor and IDE project files from
//! the same model.
//!
//! # Core Concepts
//!
//! - **Descriptor**: a small declarative file in one of two dialects (a literal map, or a
//!   class body assigning `self.*` fields) parsed into a [`UnitSpec`]
//! - **Build unit**: a descriptor plus its on-disk layout (`Sources`, `Protos`,
//!   `Configs`, `Meta`, `Build`, `Intermediate`) and collected files
//! - **Context**: one per invocation; owns the file system, toolchain probe, command
//!   runner and discovery result
//! - **Emitters**: deterministic generators for `compile_commands.json`, `.clangd`,
//!   Visual Studio and Xcode projects and their workspaces
//!
//! # Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use svcbuild::build::CompileOrchestrator;
//! use svcbuild::progress::{ConsoleHandler, ProgressHandler};
//! use svcbuild::{Context, SvcbuildConfig};
//!
//! let progress: Arc<dyn ProgressHandler> = Arc::new(ConsoleHandler::new(false));
//! let ctx = Context::system(SvcbuildConfig::for_root("/work/repo")).discover(&*progress);
//!
//! let report = CompileOrchestrator::new(&ctx, progress).build(Some("PlayerService"));
//! std::process::exit(report.exit_code());
//! ```
//!
//! # Project Structure
//!
//! - [`discovery`]: descriptor search and unit registration
//! - [`meta`]: descriptor dialect parsers
//! - [`build`]: the ProtoGen, Compile, Link and Stage pipeline plus clean and package
//! - [`emit`]: IDE and editor project generation
//! - [`scaffold`]: new service templates

pub mod build;
pub mod cli;
pub mod collector;
pub mod config;
pub mod context;
pub mod discovery;
pub mod emit;
pub mod error;
pub mod fs;
pub mod meta;
pub mod model;
pub mod progress;
pub mod scaffold;
pub mod toolchain;
pub mod util;

// Re-export key types for convenient access
pub use build::{CompileOrchestrator, RunReport, UnitOutcome};
pub use config::{ConfigError, SvcbuildConfig};
pub use context::Context;
pub use emit::{EmitResult, EmitSettings, EmitTarget, Emitter};
pub use error::BuildError;
pub use model::{BuildUnit, Platform, ProjectDescriptor, UnitSpec};
pub use util::{init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
