//! Output formatting for command results
//!
//! Human output is what the console shows after progress lines; JSON output is a
//! single pretty-printed document so that scripts can consume it.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::build::RunReport;
use crate::config::SvcbuildConfig;
use crate::model::{BuildUnit, FileGroup};

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// Human-readable formatted text
    Human,
}

/// One row of `svcbuild list`
#[derive(Debug, Clone, Serialize)]
pub struct UnitSummary {
    pub name: String,
    pub root: String,
    pub kind: &'static str,
    pub output: String,
    pub files: BTreeMap<&'static str, usize>,
}

impl From<&BuildUnit> for UnitSummary {
    fn from(unit: &BuildUnit) -> Self {
        let files = FileGroup::ALL
            .iter()
            .map(|group| (group.as_str(), unit.files_in(*group).count()))
            .collect();
        Self {
            name: unit.name.clone(),
            root: unit.layout.root.display().to_string(),
            kind: unit.output_kind.as_str(),
            output: unit.output_name.clone(),
            files,
        }
    }
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a build, clean or package report
    pub fn format_report(&self, report: &RunReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report)
                .context("Failed to serialize run report to JSON"),
            OutputFormat::Human => Ok(report.summary_lines().join("\n")),
        }
    }

    /// Formats discovered units. Human output is one name per line, sorted.
    pub fn format_units(&self, units: &[UnitSummary]) -> Result<String> {
        let mut sorted: Vec<&UnitSummary> = units.iter().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));

        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&sorted).context("Failed to serialize units to JSON")
            }
            OutputFormat::Human => Ok(sorted
                .iter()
                .map(|u| u.name.as_str())
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    pub fn format_config(&self, config: &SvcbuildConfig) -> Result<String> {
        let config_map: BTreeMap<String, String> = config.to_display_map().into_iter().collect();
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&config_map)
                .context("Failed to serialize config to JSON"),
            OutputFormat::Human => {
                let mut output = String::from("Configuration:\n");
                for (key, value) in &config_map {
                    output.push_str(&format!("  {}: {}\n", key, value));
                }
                Ok(output)
            }
        }
    }
}
