//! Per-run outcome accumulation

use serde::Serialize;
use std::time::Duration;

use crate::error::BuildError;
use crate::progress::Operation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum OutcomeStatus {
    Succeeded { detail: String },
    Failed { kind: String, message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct UnitOutcome {
    pub unit: String,
    pub operation: &'static str,
    #[serde(flatten)]
    pub status: OutcomeStatus,
    pub duration_ms: u64,
}

impl UnitOutcome {
    pub fn succeeded(
        unit: &str,
        operation: Operation,
        detail: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            unit: unit.to_string(),
            operation: operation.as_str(),
            status: OutcomeStatus::Succeeded {
                detail: detail.into(),
            },
            duration_ms: duration.as_millis() as u64,
        }
    }

    pub fn failed(
        unit: &str,
        operation: Operation,
        error: &BuildError,
        duration: Duration,
    ) -> Self {
        Self {
            unit: unit.to_string(),
            operation: operation.as_str(),
            status: OutcomeStatus::Failed {
                kind: error.kind().to_string(),
                message: error.to_string(),
            },
            duration_ms: duration.as_millis() as u64,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Succeeded { .. })
    }
}

/// Outcomes of one orchestrator call, in iteration order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub outcomes: Vec<UnitOutcome>,
}

impl RunReport {
    pub fn push(&mut self, outcome: UnitOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn failures(&self) -> impl Iterator<Item = &UnitOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.failures().count()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    pub fn get(&self, unit: &str) -> Option<&UnitOutcome> {
        self.outcomes.iter().find(|o| o.unit == unit)
    }

    /// Closing lines printed after every run.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "{} succeeded, {} failed",
            self.succeeded(),
            self.failed()
        )];
        for failure in self.failures() {
            if let OutcomeStatus::Failed { kind, message } = &failure.status {
                lines.push(format!("  {} [{}]: {}", failure.unit, kind, message));
            }
        }
        lines
    }
}
