//! Compile orchestration
//!
//! Each unit goes through ProtoGen, Compile, Link and Stage in order. Units run on a
//! bounded worker pool; sources within a unit compile in parallel and are joined before
//! linking.

pub mod orchestrator;
pub mod package;
pub mod report;
pub mod runner;
pub mod stages;

pub use orchestrator::CompileOrchestrator;
pub use package::PackageOutcome;
pub use report::{OutcomeStatus, RunReport, UnitOutcome};
pub use runner::{CommandOutput, CommandRunner, SystemRunner, ToolCommand};
pub use stages::{BuildStage, StageContext, StageState};
