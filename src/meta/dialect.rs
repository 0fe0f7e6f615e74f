//! Dialect detection from descriptor file names

use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Syntactic convention of a descriptor file. Resolved from the compound suffix only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DialectTag {
    /// `<X>.Build.py`: a top-level binding to a literal mapping
    Literal,
    /// `<X>.Build.cs`: a class deriving from a target marker type
    Class,
}

const LITERAL_SUFFIX: &str = ".Build.py";
const CLASS_SUFFIX: &str = ".Build.cs";

impl DialectTag {
    /// Returns the dialect for a descriptor file name, or `None` when the file is not a
    /// build descriptor (including `<X>.Docker.py` and `<X>.Kubernetes.py`).
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        Self::from_file_name(name)
    }

    pub fn from_file_name(name: &str) -> Option<Self> {
        if name.len() > LITERAL_SUFFIX.len() && name.ends_with(LITERAL_SUFFIX) {
            Some(DialectTag::Literal)
        } else if name.len() > CLASS_SUFFIX.len() && name.ends_with(CLASS_SUFFIX) {
            Some(DialectTag::Class)
        } else {
            None
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            DialectTag::Literal => LITERAL_SUFFIX,
            DialectTag::Class => CLASS_SUFFIX,
        }
    }

    /// Unit name implied by the file name (`PlayerService.Build.py` -> `PlayerService`).
    pub fn stem<'a>(&self, file_name: &'a str) -> &'a str {
        file_name.strip_suffix(self.suffix()).unwrap_or(file_name)
    }
}

impl fmt::Display for DialectTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialectTag::Literal => f.write_str("literal"),
            DialectTag::Class => f.write_str("class"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_by_suffix() {
        assert_eq!(
            DialectTag::from_path(Path::new("/r/Svc/Meta/PlayerService.Build.py")),
            Some(DialectTag::Literal)
        );
        assert_eq!(
            DialectTag::from_path(Path::new("Nut.Build.cs")),
            Some(DialectTag::Class)
        );
    }

    #[test]
    fn test_non_descriptors() {
        assert_eq!(DialectTag::from_file_name("PlayerService.Docker.py"), None);
        assert_eq!(DialectTag::from_file_name("PlayerService.Kubernetes.py"), None);
        assert_eq!(DialectTag::from_file_name("Build.py"), None);
        assert_eq!(DialectTag::from_file_name(".Build.py"), None);
        assert_eq!(DialectTag::from_file_name("Player.build.py"), None);
        assert_eq!(DialectTag::from_file_name("App.csproj"), None);
    }

    #[test]
    fn test_stem() {
        assert_eq!(DialectTag::Literal.stem("LibNut.Build.py"), "LibNut");
        assert_eq!(DialectTag::Class.stem("Core.Build.cs"), "Core");
    }
}
