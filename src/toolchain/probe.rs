use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::trace;

/// Host queries the locator needs. Implementations must not modify anything.
pub trait ExecutableProbe: Send + Sync {
    fn env_var(&self, key: &str) -> Option<String>;

    /// First `PATH` entry containing `program`.
    fn find_on_path(&self, program: &str) -> Option<PathBuf>;

    fn is_file(&self, path: &Path) -> bool;

    /// Immediate subdirectories of `dir`, unsorted.
    fn subdirs(&self, dir: &Path) -> Vec<PathBuf>;

    /// Windows registry string value, if the key exists.
    fn registry_value(&self, key: &str, value: &str) -> Option<String>;

    /// First line of `<program> --version`, when the program runs successfully.
    fn version(&self, program: &Path) -> Option<String>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProbe;

impl ExecutableProbe for SystemProbe {
    fn env_var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.trim().is_empty())
    }

    fn find_on_path(&self, program: &str) -> Option<PathBuf> {
        let path = std::env::var_os("PATH")?;
        std::env::split_paths(&path)
            .map(|dir| dir.join(program))
            .find(|candidate| candidate.is_file())
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn subdirs(&self, dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .map(|e| e.path())
                    .filter(|p| p.is_dir())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn registry_value(&self, key: &str, value: &str) -> Option<String> {
        let output = Command::new("reg")
            .args(["query", key, "/v", value])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        parse_reg_query(&String::from_utf8_lossy(&output.stdout), value)
    }

    fn version(&self, program: &Path) -> Option<String> {
        let output = Command::new(program)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .ok()?;
        if !output.status.success() {
            trace!(program = %program.display(), "Version probe exited unsuccessfully");
            return None;
        }
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .map(|l| l.trim().to_string())
    }
}

/// Extracts the data column of a `reg query /v <value>` line:
/// `    17.0    REG_SZ    C:\Program Files\Microsoft Visual Studio\2022\Community\`
pub fn parse_reg_query(output: &str, value: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let line = line.trim();
        let rest = line.strip_prefix(value)?.trim_start();
        let rest = rest.strip_prefix("REG_SZ")?.trim();
        if rest.is_empty() {
            None
        } else {
            Some(rest.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reg_query() {
        let output = "\r\nHKEY_LOCAL_MACHINE\\SOFTWARE\\Microsoft\\VisualStudio\\SxS\\VS7\r\n    17.0    REG_SZ    C:\\Program Files\\Microsoft Visual Studio\\2022\\Community\\\r\n\r\n";
        assert_eq!(
            parse_reg_query(output, "17.0").as_deref(),
            Some("C:\\Program Files\\Microsoft Visual Studio\\2022\\Community\\")
        );
        assert_eq!(parse_reg_query(output, "16.0"), None);
    }

    #[test]
    fn test_system_probe_missing_program() {
        let probe = SystemProbe;
        assert!(probe.find_on_path("definitely-not-a-real-tool-xyz").is_none());
        assert!(probe
            .version(Path::new("/nonexistent/definitely-not-a-real-tool"))
            .is_none());
    }
}
