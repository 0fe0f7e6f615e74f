//! Run-wide state shared by every component
//!
//! One `Context` is built per invocation. It owns the collaborators (file system,
//! toolchain probe, command runner), the discovery result and the lazily resolved
//! toolchain, which is located at most once per run.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use crate::build::runner::{CommandRunner, SystemRunner};
use crate::collector::FileCollector;
use crate::config::SvcbuildConfig;
use crate::discovery::{MetaDiscoverer, ProjectBuilder, UnitSet};
use crate::error::BuildError;
use crate::fs::{FileSystem, RealFileSystem};
use crate::model::{BuildUnit, Platform, ProjectDescriptor};
use crate::progress::{ProgressEvent, ProgressHandler};
use crate::toolchain::{ExecutableProbe, SystemProbe, Toolchain, ToolchainError, ToolchainLocator};

pub struct Context {
    pub config: SvcbuildConfig,
    pub file_system: Arc<dyn FileSystem>,
    pub probe: Arc<dyn ExecutableProbe>,
    pub runner: Arc<dyn CommandRunner>,
    pub platform: Platform,
    /// Absolute roots scanned by [`Context::discover`]
    pub search_roots: Vec<PathBuf>,
    pub units: UnitSet,
    pub managed: Vec<PathBuf>,
    /// Discovery-time diagnostics; never fatal
    pub warnings: Vec<BuildError>,
    compiler: OnceLock<Result<Toolchain, ToolchainError>>,
    protoc: OnceLock<Result<PathBuf, ToolchainError>>,
}

impl Context {
    pub fn new(
        config: SvcbuildConfig,
        file_system: Arc<dyn FileSystem>,
        probe: Arc<dyn ExecutableProbe>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        let search_roots = config.resolved_search_roots();
        Self {
            config,
            file_system,
            probe,
            runner,
            platform: Platform::current(),
            search_roots,
            units: UnitSet::new(),
            managed: Vec::new(),
            warnings: Vec::new(),
            compiler: OnceLock::new(),
            protoc: OnceLock::new(),
        }
    }

    /// Context over the real file system, `PATH` and process spawning.
    pub fn system(config: SvcbuildConfig) -> Self {
        Self::new(
            config,
            Arc::new(RealFileSystem::new()),
            Arc::new(SystemProbe),
            Arc::new(SystemRunner),
        )
    }

    pub fn with_search_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.search_roots = roots;
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn project_root(&self) -> &Path {
        &self.config.project_root
    }

    /// Scans the search roots, parses every descriptor and collects each unit's files.
    pub fn discover(mut self, progress: &dyn ProgressHandler) -> Self {
        let start = Instant::now();
        progress.on_progress(&ProgressEvent::DiscoveryStarted {
            roots: self.search_roots.len(),
        });

        let discovery = MetaDiscoverer::new(&*self.file_system).discover_all(&self.search_roots);
        let collector = FileCollector::new(&*self.file_system);
        self.units = discovery.units.map_units(|unit| collector.collect(unit));
        self.managed = discovery.managed;
        self.warnings = discovery.warnings;

        for warning in &self.warnings {
            progress.on_progress(&ProgressEvent::Warning {
                unit: String::new(),
                message: warning.to_string(),
            });
        }
        progress.on_progress(&ProgressEvent::DiscoveryComplete {
            units: self.units.len(),
            warnings: self.warnings.len(),
            duration: start.elapsed(),
        });
        self
    }

    pub fn unit(&self, name: &str) -> Result<&BuildUnit, BuildError> {
        self.units
            .get(name)
            .ok_or_else(|| BuildError::UnknownUnit(name.to_string()))
    }

    /// Emitter input: native projects in discovery order, then managed projects.
    pub fn projects(&self) -> Vec<ProjectDescriptor> {
        ProjectBuilder::new(&*self.file_system, &self.search_roots, self.project_root())
            .build(&self.units, &self.managed)
    }

    fn locator(&self) -> ToolchainLocator<'_> {
        ToolchainLocator::new(&*self.probe, self.project_root()).with_platform(self.platform)
    }

    pub fn toolchain(&self) -> Result<&Toolchain, ToolchainError> {
        self.compiler
            .get_or_init(|| self.locator().find_compiler())
            .as_ref()
            .map_err(Clone::clone)
    }

    pub fn protoc(&self) -> Result<&Path, ToolchainError> {
        self.protoc
            .get_or_init(|| self.locator().find_protoc())
            .as_ref()
            .map(PathBuf::as_path)
            .map_err(Clone::clone)
    }
}
