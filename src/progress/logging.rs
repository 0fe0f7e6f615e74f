//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{debug, info, warn};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::DiscoveryStarted { roots } => {
                debug!(roots, "Starting discovery");
            }
            ProgressEvent::DiscoveryComplete {
                units,
                warnings,
                duration,
            } => {
                info!(
                    units,
                    warnings,
                    duration_ms = duration.as_millis(),
                    "Discovery complete"
                );
            }
            ProgressEvent::UnitStarted { unit, operation } => {
                debug!(unit = %unit, operation = operation.as_str(), "Unit started");
            }
            ProgressEvent::StageStarted { unit, stage } => {
                debug!(unit = %unit, stage = %stage, "Stage started");
            }
            ProgressEvent::StageComplete {
                unit,
                stage,
                duration,
            } => {
                debug!(
                    unit = %unit,
                    stage = %stage,
                    duration_ms = duration.as_millis(),
                    "Stage complete"
                );
            }
            ProgressEvent::CommandStarted { unit, command } => {
                debug!(unit = %unit, command = %command, "Running tool");
            }
            ProgressEvent::Note { unit, message } => {
                debug!(unit = %unit, "{}", message);
            }
            ProgressEvent::Warning { unit, message } => {
                warn!(unit = %unit, "{}", message);
            }
            ProgressEvent::UnitFinished {
                unit,
                operation,
                success,
                duration,
                detail,
            } => {
                if *success {
                    info!(
                        unit = %unit,
                        operation = operation.as_str(),
                        duration_ms = duration.as_millis(),
                        "Unit succeeded"
                    );
                } else {
                    warn!(
                        unit = %unit,
                        operation = operation.as_str(),
                        error = %detail,
                        "Unit failed"
                    );
                }
            }
            ProgressEvent::EmitterComplete { emitter, files } => {
                info!(emitter = %emitter, files, "Emitter complete");
            }
        }
    }
}
