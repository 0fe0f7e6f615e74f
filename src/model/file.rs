//! File classification types shared by the collector and the emitters

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Classification bucket every collected file lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FileGroup {
    Headers,
    Sources,
    Meta,
    Configs,
}

impl FileGroup {
    pub const ALL: [FileGroup; 4] = [
        FileGroup::Headers,
        FileGroup::Sources,
        FileGroup::Meta,
        FileGroup::Configs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileGroup::Headers => "Headers",
            FileGroup::Sources => "Sources",
            FileGroup::Meta => "Meta",
            FileGroup::Configs => "Configs",
        }
    }
}

impl fmt::Display for FileGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic file type, used to pick IDE-specific type strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileKind {
    CHeader,
    CppHeader,
    CSource,
    CppSource,
    CSharp,
    Python,
    Json,
    Xml,
    Yaml,
    Ini,
    Proto,
    Markdown,
    PlainText,
    Other,
}

impl FileKind {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("h") => FileKind::CHeader,
            Some("hpp" | "hxx" | "hh") => FileKind::CppHeader,
            Some("c") => FileKind::CSource,
            Some("cpp" | "cxx" | "cc") => FileKind::CppSource,
            Some("cs") => FileKind::CSharp,
            Some("py") => FileKind::Python,
            Some("json") => FileKind::Json,
            Some("xml") => FileKind::Xml,
            Some("yaml" | "yml") => FileKind::Yaml,
            Some("ini") => FileKind::Ini,
            Some("proto") => FileKind::Proto,
            Some("md") => FileKind::Markdown,
            Some("txt") => FileKind::PlainText,
            _ => FileKind::Other,
        }
    }

    /// Xcode `lastKnownFileType` value.
    pub fn xcode_type(&self) -> &'static str {
        match self {
            FileKind::CHeader => "sourcecode.c.h",
            FileKind::CppHeader => "sourcecode.cpp.h",
            FileKind::CSource => "sourcecode.c.c",
            FileKind::CppSource => "sourcecode.cpp.cpp",
            FileKind::CSharp => "sourcecode.cs",
            FileKind::Python => "text.script.python",
            FileKind::Json => "text.json",
            FileKind::Xml => "text.xml",
            FileKind::PlainText => "text.plain",
            FileKind::Yaml
            | FileKind::Ini
            | FileKind::Proto
            | FileKind::Markdown
            | FileKind::Other => "text",
        }
    }

    pub fn is_compilable(&self) -> bool {
        matches!(self, FileKind::CSource | FileKind::CppSource)
    }
}

/// A classified member file of a build unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Path relative to the owning unit's root directory.
    pub relative: PathBuf,
    pub group: FileGroup,
    pub kind: FileKind,
}

impl SourceFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(FileKind::from_path(Path::new("a/b.hpp")), FileKind::CppHeader);
        assert_eq!(FileKind::from_path(Path::new("Main.CPP")), FileKind::CppSource);
        assert_eq!(FileKind::from_path(Path::new("x.proto")), FileKind::Proto);
        assert_eq!(FileKind::from_path(Path::new("Makefile")), FileKind::Other);
    }

    #[test]
    fn test_xcode_types() {
        assert_eq!(FileKind::CHeader.xcode_type(), "sourcecode.c.h");
        assert_eq!(FileKind::CppSource.xcode_type(), "sourcecode.cpp.cpp");
        assert_eq!(FileKind::Proto.xcode_type(), "text");
    }

    #[test]
    fn test_group_order_is_stable() {
        let names: Vec<&str> = FileGroup::ALL.iter().map(|g| g.as_str()).collect();
        assert_eq!(names, vec!["Headers", "Sources", "Meta", "Configs"]);
    }
}
