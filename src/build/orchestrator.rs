//! Build, clean and package over one or all discovered units

use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use super::package::{package_unit, PackageOutcome};
use super::report::{RunReport, UnitOutcome};
use super::stages::{pipeline, proto_inputs, StageContext, StageState};
use crate::context::Context;
use crate::error::BuildError;
use crate::model::BuildUnit;
use crate::progress::{BufferedHandler, Operation, ProgressEvent, ProgressHandler};
use crate::util::paths::relative_to;

pub struct CompileOrchestrator<'a> {
    ctx: &'a Context,
    progress: Arc<dyn ProgressHandler>,
}

impl<'a> CompileOrchestrator<'a> {
    pub fn new(ctx: &'a Context, progress: Arc<dyn ProgressHandler>) -> Self {
        Self { ctx, progress }
    }

    pub fn build(&self, target: Option<&str>) -> RunReport {
        self.run(Operation::Build, target)
    }

    pub fn clean(&self, target: Option<&str>) -> RunReport {
        self.run(Operation::Clean, target)
    }

    pub fn package(&self, target: Option<&str>) -> RunReport {
        self.run(Operation::Package, target)
    }

    /// Runs `operation` on the named unit, or on every unit in discovery order.
    /// A failing unit never stops the others.
    pub fn run(&self, operation: Operation, target: Option<&str>) -> RunReport {
        let mut report = RunReport::default();

        let units: Vec<&BuildUnit> = match target {
            Some(name) => match self.ctx.unit(name) {
                Ok(unit) => vec![unit],
                Err(e) => {
                    self.progress.on_progress(&ProgressEvent::UnitFinished {
                        unit: name.to_string(),
                        operation,
                        success: false,
                        duration: Default::default(),
                        detail: e.to_string(),
                    });
                    report.push(UnitOutcome::failed(name, operation, &e, Default::default()));
                    return report;
                }
            },
            None => self.ctx.units.iter().collect(),
        };

        if units.is_empty() {
            self.progress.on_progress(&ProgressEvent::Warning {
                unit: String::new(),
                message: "no build units discovered".to_string(),
            });
            return report;
        }

        let jobs = self.ctx.config.jobs.max(1);
        let outcomes = match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
            Ok(pool) => pool.install(|| {
                units
                    .par_iter()
                    .map(|unit| self.run_unit(operation, unit))
                    .collect::<Vec<_>>()
            }),
            Err(e) => {
                warn!(error = %e, "Worker pool unavailable, running sequentially");
                units
                    .iter()
                    .map(|unit| self.run_unit(operation, unit))
                    .collect()
            }
        };

        for outcome in outcomes {
            report.push(outcome);
        }
        report
    }

    fn run_unit(&self, operation: Operation, unit: &BuildUnit) -> UnitOutcome {
        let buffer = BufferedHandler::new(self.progress.clone());
        let start = Instant::now();
        buffer.on_progress(&ProgressEvent::UnitStarted {
            unit: unit.name.clone(),
            operation,
        });

        let result = match operation {
            Operation::Build => self.build_unit(unit, &buffer),
            Operation::Clean => self.clean_unit(unit, &buffer),
            Operation::Package => self.package_unit(unit, &buffer),
        };
        let duration = start.elapsed();

        let outcome = match &result {
            Ok(detail) => UnitOutcome::succeeded(&unit.name, operation, detail.clone(), duration),
            Err(e) => UnitOutcome::failed(&unit.name, operation, e, duration),
        };
        buffer.on_progress(&ProgressEvent::UnitFinished {
            unit: unit.name.clone(),
            operation,
            success: result.is_ok(),
            duration,
            detail: match result {
                Ok(detail) => detail,
                Err(e) => e.to_string(),
            },
        });
        buffer.flush();
        outcome
    }

    fn build_unit(
        &self,
        unit: &BuildUnit,
        progress: &dyn ProgressHandler,
    ) -> Result<String, BuildError> {
        let toolchain = self
            .ctx
            .toolchain()
            .map_err(|source| BuildError::ToolchainUnavailable {
                unit: unit.name.clone(),
                source,
            })?;

        let (present_protos, _) = proto_inputs(unit);
        let protoc = if present_protos.is_empty() {
            None
        } else {
            Some(self.ctx.protoc().map_err(|source| BuildError::ToolchainUnavailable {
                unit: unit.name.clone(),
                source,
            })?)
        };

        let stage_ctx = StageContext {
            unit,
            toolchain,
            protoc,
            runner: &*self.ctx.runner,
            progress,
            cxx_standard: &self.ctx.config.cxx_standard,
            project_root: self.ctx.project_root(),
            platform: self.ctx.platform,
        };
        let mut state = StageState::default();

        for stage in pipeline() {
            if !stage.applies(unit) {
                debug!(unit = %unit.name, stage = stage.name(), "Stage skipped");
                continue;
            }
            let started = Instant::now();
            progress.on_progress(&ProgressEvent::StageStarted {
                unit: unit.name.clone(),
                stage: stage.name().to_string(),
            });
            stage.execute(&stage_ctx, &mut state)?;
            progress.on_progress(&ProgressEvent::StageComplete {
                unit: unit.name.clone(),
                stage: stage.name().to_string(),
                duration: started.elapsed(),
            });
        }

        Ok(state
            .artifact
            .map(|a| self.display_path(&a))
            .unwrap_or_default())
    }

    fn clean_unit(
        &self,
        unit: &BuildUnit,
        progress: &dyn ProgressHandler,
    ) -> Result<String, BuildError> {
        let mut removed = Vec::new();
        for dir in [&unit.layout.output, &unit.layout.intermediate] {
            if !dir.exists() {
                continue;
            }
            std::fs::remove_dir_all(dir).map_err(|e| BuildError::io(dir, e))?;
            progress.on_progress(&ProgressEvent::Note {
                unit: unit.name.clone(),
                message: format!("removed {}", self.display_path(dir)),
            });
            removed.push(self.display_path(dir));
        }

        if removed.is_empty() {
            Ok("nothing to clean".to_string())
        } else {
            Ok(format!("removed {}", removed.join(", ")))
        }
    }

    fn package_unit(
        &self,
        unit: &BuildUnit,
        progress: &dyn ProgressHandler,
    ) -> Result<String, BuildError> {
        match package_unit(unit)? {
            PackageOutcome::Archived { archive, files } => {
                let shown = self.display_path(&archive);
                progress.on_progress(&ProgressEvent::Note {
                    unit: unit.name.clone(),
                    message: format!("archived {} file(s) into {}", files, shown),
                });
                Ok(shown)
            }
            PackageOutcome::NothingToPackage => {
                progress.on_progress(&ProgressEvent::Note {
                    unit: unit.name.clone(),
                    message: format!("nothing to package: {} has not been built", unit.name),
                });
                Ok("nothing to package".to_string())
            }
        }
    }

    fn display_path(&self, path: &std::path::Path) -> String {
        relative_to(path, self.ctx.project_root())
            .display()
            .to_string()
    }
}
