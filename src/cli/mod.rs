pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{CliArgs, Commands, GenerateArgs, ListArgs, ProjectFilesArgs, UnitArgs};
pub use output::{OutputFormat, OutputFormatter, UnitSummary};
