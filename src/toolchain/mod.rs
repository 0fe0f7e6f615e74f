//! Compiler, archiver and protoc location

pub mod locator;
pub mod probe;

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub use locator::ToolchainLocator;
pub use probe::{ExecutableProbe, SystemProbe};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ToolchainError {
    #[error("No C/C++ compiler found (searched: {})", .searched.join(", "))]
    CompilerNotFound { searched: Vec<String> },

    #[error("protoc not found (searched: {})", .searched.join(", "))]
    ProtocNotFound { searched: Vec<String> },
}

/// Command-line convention of the located compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolFlavor {
    Gnu,
    Msvc,
}

impl fmt::Display for ToolFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolFlavor::Gnu => f.write_str("gnu"),
            ToolFlavor::Msvc => f.write_str("msvc"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toolchain {
    pub compiler: PathBuf,
    /// Driver used for executables and shared libraries; the compiler itself on every
    /// supported toolchain.
    pub linker: PathBuf,
    /// `ar` or `lib.exe`
    pub archiver: PathBuf,
    pub object_ext: &'static str,
    pub flavor: ToolFlavor,
}

impl Toolchain {
    pub fn gnu(compiler: PathBuf, archiver: PathBuf) -> Self {
        Self {
            linker: compiler.clone(),
            compiler,
            archiver,
            object_ext: ".o",
            flavor: ToolFlavor::Gnu,
        }
    }

    pub fn msvc(compiler: PathBuf) -> Self {
        let archiver = compiler
            .parent()
            .map(|dir| dir.join("lib.exe"))
            .unwrap_or_else(|| PathBuf::from("lib.exe"));
        Self {
            linker: compiler.clone(),
            compiler,
            archiver,
            object_ext: ".obj",
            flavor: ToolFlavor::Msvc,
        }
    }

    pub fn is_msvc(&self) -> bool {
        self.flavor == ToolFlavor::Msvc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_msvc_archiver_sits_next_to_cl() {
        let tc = Toolchain::msvc(PathBuf::from("C:/VS/bin/Hostx64/x64/cl.exe"));
        assert_eq!(tc.archiver, PathBuf::from("C:/VS/bin/Hostx64/x64/lib.exe"));
        assert_eq!(tc.object_ext, ".obj");
        assert!(tc.is_msvc());
    }

    #[test]
    fn test_error_lists_candidates() {
        let err = ToolchainError::ProtocNotFound {
            searched: vec!["Tools/protoc/bin/protoc".to_string(), "PATH".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "protoc not found (searched: Tools/protoc/bin/protoc, PATH)"
        );
    }
}
