//! Progress handler trait and events

use std::time::Duration;

/// Which orchestrator operation a unit is going through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Build,
    Clean,
    Package,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Build => "build",
            Operation::Clean => "clean",
            Operation::Package => "package",
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Operation::Build => "Building",
            Operation::Clean => "Cleaning",
            Operation::Package => "Packaging",
        }
    }
}

/// Events emitted while discovering, building and emitting
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    DiscoveryStarted { roots: usize },

    DiscoveryComplete {
        units: usize,
        warnings: usize,
        duration: Duration,
    },

    UnitStarted { unit: String, operation: Operation },

    StageStarted { unit: String, stage: String },

    StageComplete {
        unit: String,
        stage: String,
        duration: Duration,
    },

    /// An external tool invocation (protoc, compiler, linker, archiver)
    CommandStarted { unit: String, command: String },

    /// Free-form informational line attached to a unit
    Note { unit: String, message: String },

    /// Non-fatal condition; `unit` is empty for run-wide warnings
    Warning { unit: String, message: String },

    UnitFinished {
        unit: String,
        operation: Operation,
        success: bool,
        duration: Duration,
        detail: String,
    },

    EmitterComplete { emitter: String, files: usize },
}

/// Receives progress events. Implementations must tolerate calls from several worker
/// threads.
pub trait ProgressHandler: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);

    /// Delivers a batch that belongs together (one unit's whole log).
    fn on_batch(&self, events: &[ProgressEvent]) {
        for event in events {
            self.on_progress(event);
        }
    }
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}
