//! Configuration management for svcbuild
//!
//! Settings are loaded from environment variables with defaults; CLI flags override
//! individual fields afterwards.
//!
//! # Environment Variables
//!
//! - `SVCBUILD_PROJECT_ROOT`: project root - default: current directory
//! - `SVCBUILD_SEARCH_ROOTS`: descriptor search roots relative to the project root,
//!   separated by `,` `;` or `:` - default: "Source,MicroServices,ServiceAllocate"
//! - `SVCBUILD_CXX_STANDARD`: C++ language standard - default: "c++20"
//! - `SVCBUILD_JOBS`: build workers - default: available CPU cores
//! - `SVCBUILD_BIN`: command IDE build steps invoke - default: "svcbuild"
//! - `SVCBUILD_PROJECTS_DIR`: IDE project output directory - default: "Projects"
//! - `SVCBUILD_WORKSPACE_NAME`: solution/workspace name - default: project root name
//! - `SVCBUILD_LOG_LEVEL`: logging level - default: "info"

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::thread;
use thiserror::Error;

const DEFAULT_SEARCH_ROOTS: &[&str] = &["Source", "MicroServices", "ServiceAllocate"];
const DEFAULT_CXX_STANDARD: &str = "c++20";
const DEFAULT_BIN: &str = "svcbuild";
const DEFAULT_PROJECTS_DIR: &str = "Projects";
const DEFAULT_LOG_LEVEL: &str = "info";
const MAX_JOBS: usize = 256;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Project root does not exist: {0}")]
    MissingProjectRoot(PathBuf),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },
}

#[derive(Debug, Clone)]
pub struct SvcbuildConfig {
    pub project_root: PathBuf,

    /// Search roots relative to `project_root`, scanned in order
    pub search_roots: Vec<PathBuf>,

    pub cxx_standard: String,

    /// Worker count for builds; 1 means strictly sequential
    pub jobs: usize,

    /// Orchestrator command embedded in generated IDE build steps
    pub orchestrator_bin: String,

    pub projects_dir: PathBuf,

    pub workspace_name: Option<String>,

    pub log_level: String,
}

impl Default for SvcbuildConfig {
    /// Loads `SVCBUILD_*` variables, falling back to defaults for anything unset
    fn default() -> Self {
        let project_root = env::var("SVCBUILD_PROJECT_ROOT")
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));

        let search_roots = env::var("SVCBUILD_SEARCH_ROOTS")
            .ok()
            .map(|v| split_list(&v))
            .filter(|roots| !roots.is_empty())
            .unwrap_or_else(|| DEFAULT_SEARCH_ROOTS.iter().map(PathBuf::from).collect());

        let cxx_standard = env::var("SVCBUILD_CXX_STANDARD")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_CXX_STANDARD.to_string());

        let jobs = env::var("SVCBUILD_JOBS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or_else(default_jobs);

        let orchestrator_bin = env::var("SVCBUILD_BIN")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BIN.to_string());

        let projects_dir = env::var("SVCBUILD_PROJECTS_DIR")
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROJECTS_DIR));

        let workspace_name = env::var("SVCBUILD_WORKSPACE_NAME")
            .ok()
            .filter(|v| !v.is_empty());

        let log_level = env::var("SVCBUILD_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Self {
            project_root,
            search_roots,
            cxx_standard,
            jobs,
            orchestrator_bin,
            projects_dir,
            workspace_name,
            log_level,
        }
    }
}

fn split_list(value: &str) -> Vec<PathBuf> {
    value
        .split([',', ';', ':'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

fn default_jobs() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl SvcbuildConfig {
    /// Configuration rooted at `project_root` with every other field at its default.
    pub fn for_root(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            search_roots: DEFAULT_SEARCH_ROOTS.iter().map(PathBuf::from).collect(),
            cxx_standard: DEFAULT_CXX_STANDARD.to_string(),
            jobs: 1,
            orchestrator_bin: DEFAULT_BIN.to_string(),
            projects_dir: PathBuf::from(DEFAULT_PROJECTS_DIR),
            workspace_name: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.project_root.is_dir() {
            return Err(ConfigError::MissingProjectRoot(self.project_root.clone()));
        }

        if self.jobs == 0 || self.jobs > MAX_JOBS {
            return Err(ConfigError::ValidationFailed(format!(
                "Job count must be between 1 and {}",
                MAX_JOBS
            )));
        }

        if !self.cxx_standard.starts_with("c++") && !self.cxx_standard.starts_with("gnu++") {
            return Err(ConfigError::ParseError {
                field: "cxx_standard".to_string(),
                error: format!("'{}' is not a C++ standard (e.g. c++20)", self.cxx_standard),
            });
        }

        if self.orchestrator_bin.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Orchestrator command cannot be empty".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    /// Absolute search roots that exist on disk. When none of the configured roots
    /// exist the project root itself is searched.
    pub fn resolved_search_roots(&self) -> Vec<PathBuf> {
        let existing: Vec<PathBuf> = self
            .search_roots
            .iter()
            .map(|r| self.resolve(r))
            .filter(|r| r.is_dir())
            .collect();

        if existing.is_empty() {
            vec![self.project_root.clone()]
        } else {
            existing
        }
    }

    pub fn projects_path(&self) -> PathBuf {
        self.resolve(&self.projects_dir)
    }

    pub fn workspace_name(&self) -> String {
        self.workspace_name.clone().unwrap_or_else(|| {
            self.project_root
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "Workspace".to_string())
        })
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }

    pub fn to_display_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();

        map.insert(
            "project_root".to_string(),
            self.project_root.display().to_string(),
        );
        map.insert(
            "search_roots".to_string(),
            self.search_roots
                .iter()
                .map(|r| r.display().to_string())
                .collect::<Vec<_>>()
                .join(","),
        );
        map.insert("cxx_standard".to_string(), self.cxx_standard.clone());
        map.insert("jobs".to_string(), self.jobs.to_string());
        map.insert("orchestrator_bin".to_string(), self.orchestrator_bin.clone());
        map.insert(
            "projects_dir".to_string(),
            self.projects_dir.display().to_string(),
        );
        map.insert("workspace_name".to_string(), self.workspace_name());
        map.insert("log_level".to_string(), self.log_level.clone());

        map
    }
}

impl fmt::Display for SvcbuildConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Svcbuild Configuration:")?;
        writeln!(f, "  Project Root: {}", self.project_root.display())?;
        writeln!(
            f,
            "  Search Roots: {}",
            self.search_roots
                .iter()
                .map(|r| r.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )?;
        writeln!(f, "  C++ Standard: {}", self.cxx_standard)?;
        writeln!(f, "  Jobs: {}", self.jobs)?;
        writeln!(f, "  Orchestrator: {}", self.orchestrator_bin)?;
        writeln!(f, "  Projects Dir: {}", self.projects_dir.display())?;
        writeln!(f, "  Workspace: {}", self.workspace_name())?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}
