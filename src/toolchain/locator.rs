//! Ordered, platform-conditioned search for a working toolchain
//!
//! The first viable candidate wins. Nothing here installs or rewrites anything; the only
//! processes spawned are `--version` probes and, on Windows, `reg query`.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{ExecutableProbe, Toolchain, ToolchainError};
use crate::model::Platform;

const VS_INSTALL_ROOT: &str = "C:/Program Files/Microsoft Visual Studio/2022";
const VS_EDITIONS: &[&str] = &["Community", "Professional", "Enterprise", "BuildTools"];
const VS_REGISTRY_KEY: &str = r"HKLM\SOFTWARE\Microsoft\VisualStudio\SxS\VS7";
const VS_REGISTRY_VALUE: &str = "17.0";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Candidate {
    Env(&'static str),
    OnPath(&'static str),
    File(PathBuf),
    VisualStudioEditions,
    VisualStudioRegistry,
}

impl Candidate {
    fn label(&self) -> String {
        match self {
            Candidate::Env(var) => format!("${}", var),
            Candidate::OnPath(name) => format!("PATH:{}", name),
            Candidate::File(path) => path.display().to_string(),
            Candidate::VisualStudioEditions => format!("{}/<edition>", VS_INSTALL_ROOT),
            Candidate::VisualStudioRegistry => {
                format!("{}\\{}", VS_REGISTRY_KEY, VS_REGISTRY_VALUE)
            }
        }
    }
}

pub struct ToolchainLocator<'a> {
    probe: &'a dyn ExecutableProbe,
    project_root: PathBuf,
    platform: Platform,
}

impl<'a> ToolchainLocator<'a> {
    pub fn new(probe: &'a dyn ExecutableProbe, project_root: impl Into<PathBuf>) -> Self {
        Self {
            probe,
            project_root: project_root.into(),
            platform: Platform::current(),
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    fn exe(&self, name: &str) -> String {
        if self.platform == Platform::Windows {
            format!("{}.exe", name)
        } else {
            name.to_string()
        }
    }

    fn compiler_candidates(&self) -> Vec<Candidate> {
        // `$CXX` is an explicit override and only yields to the bundled toolchain
        let mut candidates = vec![
            Candidate::File(self.project_root.join("Tools/llvm/bin").join(self.exe("clang++"))),
            Candidate::Env("CXX"),
        ];

        match self.platform {
            Platform::Windows => {
                candidates.extend([
                    Candidate::OnPath("g++.exe"),
                    Candidate::OnPath("clang++.exe"),
                    Candidate::File(PathBuf::from("C:/MinGW/bin/g++.exe")),
                    Candidate::File(PathBuf::from("C:/msys64/mingw64/bin/g++.exe")),
                    Candidate::OnPath("cl.exe"),
                    Candidate::VisualStudioEditions,
                    Candidate::VisualStudioRegistry,
                ]);
            }
            Platform::MacOs | Platform::Linux => {
                candidates.extend([
                    Candidate::OnPath("g++"),
                    Candidate::OnPath("clang++"),
                    Candidate::OnPath("c++"),
                    Candidate::File(PathBuf::from("/usr/bin/g++")),
                    Candidate::File(PathBuf::from("/usr/bin/clang++")),
                    Candidate::File(PathBuf::from("/usr/local/bin/g++")),
                    Candidate::File(PathBuf::from("/usr/local/bin/clang++")),
                ]);
                if self.platform == Platform::MacOs {
                    candidates.extend([
                        Candidate::File(PathBuf::from("/opt/homebrew/opt/llvm/bin/clang++")),
                        Candidate::File(PathBuf::from(
                            "/Library/Developer/CommandLineTools/usr/bin/clang++",
                        )),
                    ]);
                }
            }
        }

        candidates
    }

    fn protoc_candidates(&self) -> Vec<Candidate> {
        vec![
            Candidate::File(self.project_root.join("Tools/protoc/bin").join(self.exe("protoc"))),
            Candidate::Env("PROTOC"),
            Candidate::OnPath(if self.platform == Platform::Windows {
                "protoc.exe"
            } else {
                "protoc"
            }),
        ]
    }

    fn resolve(&self, candidate: &Candidate) -> Option<PathBuf> {
        match candidate {
            Candidate::Env(var) => {
                let value = self.probe.env_var(var)?;
                let path = PathBuf::from(&value);
                if self.probe.is_file(&path) {
                    Some(path)
                } else {
                    self.probe.find_on_path(&value)
                }
            }
            Candidate::OnPath(name) => self.probe.find_on_path(name),
            Candidate::File(path) => self.probe.is_file(path).then(|| path.clone()),
            Candidate::VisualStudioEditions => VS_EDITIONS
                .iter()
                .find_map(|edition| self.msvc_in(&Path::new(VS_INSTALL_ROOT).join(edition))),
            Candidate::VisualStudioRegistry => {
                let install = self.probe.registry_value(VS_REGISTRY_KEY, VS_REGISTRY_VALUE)?;
                let install = install.trim_end_matches(&['\\', '/'][..]);
                self.msvc_in(Path::new(install))
            }
        }
    }

    /// Newest `cl.exe` below `<install>/VC/Tools/MSVC/<version>`.
    fn msvc_in(&self, install: &Path) -> Option<PathBuf> {
        let mut versions = self.probe.subdirs(&install.join("VC/Tools/MSVC"));
        versions.sort();
        versions.reverse();
        versions
            .into_iter()
            .map(|v| v.join("bin/Hostx64/x64/cl.exe"))
            .find(|cl| self.probe.is_file(cl))
    }

    fn first_match(&self, candidates: &[Candidate]) -> Result<PathBuf, Vec<String>> {
        for candidate in candidates {
            if let Some(path) = self.resolve(candidate) {
                debug!(
                    candidate = %candidate.label(),
                    path = %path.display(),
                    "Toolchain candidate matched"
                );
                return Ok(path);
            }
        }
        Err(candidates.iter().map(Candidate::label).collect())
    }

    pub fn find_compiler(&self) -> Result<Toolchain, ToolchainError> {
        let compiler = self
            .first_match(&self.compiler_candidates())
            .map_err(|searched| ToolchainError::CompilerNotFound { searched })?;

        let toolchain = if is_msvc_driver(&compiler) {
            Toolchain::msvc(compiler)
        } else {
            let archiver = self.find_archiver(&compiler);
            Toolchain::gnu(compiler, archiver)
        };

        match self.probe.version(&toolchain.compiler) {
            Some(version) => {
                info!(compiler = %toolchain.compiler.display(), %version, "Using compiler")
            }
            None => info!(compiler = %toolchain.compiler.display(), "Using compiler"),
        }
        Ok(toolchain)
    }

    pub fn find_protoc(&self) -> Result<PathBuf, ToolchainError> {
        let protoc = self
            .first_match(&self.protoc_candidates())
            .map_err(|searched| ToolchainError::ProtocNotFound { searched })?;
        info!(protoc = %protoc.display(), "Using protoc");
        Ok(protoc)
    }

    fn find_archiver(&self, compiler: &Path) -> PathBuf {
        let name = self.exe("ar");
        compiler
            .parent()
            .map(|dir| dir.join(&name))
            .filter(|sibling| self.probe.is_file(sibling))
            .or_else(|| self.probe.find_on_path(&name))
            .unwrap_or_else(|| PathBuf::from(name))
    }
}

fn is_msvc_driver(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.eq_ignore_ascii_case("cl"))
        .unwrap_or(false)
}
