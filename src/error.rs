//! Error taxonomy for discovery and build operations

use std::path::PathBuf;
use thiserror::Error;

use crate::toolchain::ToolchainError;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Malformed build descriptor {path}: {reason}")]
    MalformedDescriptor { path: PathBuf, reason: String },

    #[error("Duplicate unit name '{name}': {replaced} is overridden by {kept}")]
    DuplicateUnitName {
        name: String,
        replaced: PathBuf,
        kept: PathBuf,
    },

    #[error("Toolchain unavailable for unit '{unit}': {source}")]
    ToolchainUnavailable {
        unit: String,
        #[source]
        source: ToolchainError,
    },

    #[error("Protobuf generation failed for {proto}: {message}")]
    ProtoGenFailure { proto: PathBuf, message: String },

    #[error("Compilation failed for {file}: {message}")]
    CompileFailure { file: PathBuf, message: String },

    #[error("Linking {output} failed: {message}")]
    LinkFailure { output: PathBuf, message: String },

    #[error("No source files found for unit '{unit}' in {dir}")]
    NoSourceFiles { unit: String, dir: PathBuf },

    #[error("Unknown unit '{0}'")]
    UnknownUnit(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        BuildError::MalformedDescriptor {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Discovery-time conditions are reported as warnings and never abort a scan.
    pub fn is_discovery_error(&self) -> bool {
        matches!(
            self,
            BuildError::MalformedDescriptor { .. } | BuildError::DuplicateUnitName { .. }
        )
    }

    /// Short machine-friendly tag, used in run summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            BuildError::MalformedDescriptor { .. } => "MalformedDescriptor",
            BuildError::DuplicateUnitName { .. } => "DuplicateUnitName",
            BuildError::ToolchainUnavailable { .. } => "ToolchainUnavailable",
            BuildError::ProtoGenFailure { .. } => "ProtoGenFailure",
            BuildError::CompileFailure { .. } => "CompileFailure",
            BuildError::LinkFailure { .. } => "LinkFailure",
            BuildError::NoSourceFiles { .. } => "NoSourceFiles",
            BuildError::UnknownUnit(_) => "UnknownUnit",
            BuildError::Io { .. } => "IOFailure",
        }
    }
}
