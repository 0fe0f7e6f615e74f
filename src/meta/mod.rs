//! Descriptor parsing
//!
//! Each dialect has one parser that turns file text into a [`UnitSpec`]. The dialect is
//! picked from the file name alone (see [`DialectTag::from_path`]); downstream code only
//! ever sees the dialect-neutral result.

pub mod class;
pub mod dialect;
pub mod literal;

use std::path::Path;

use crate::error::BuildError;
use crate::fs::FileSystem;
use crate::model::UnitSpec;

pub use class::ClassParser;
pub use dialect::DialectTag;
pub use literal::{LiteralParseError, LiteralParser};

pub trait DescriptorParser: Send + Sync {
    fn parse(&self, path: &Path, text: &str) -> Result<UnitSpec, BuildError>;
}

pub fn parser_for(dialect: DialectTag) -> &'static dyn DescriptorParser {
    match dialect {
        DialectTag::Literal => &LiteralParser,
        DialectTag::Class => &ClassParser,
    }
}

/// Reads and parses one descriptor file.
pub fn parse_descriptor(
    fs: &dyn FileSystem,
    path: &Path,
    dialect: DialectTag,
) -> Result<UnitSpec, BuildError> {
    let text = fs
        .read_to_string(path)
        .map_err(|e| BuildError::malformed(path, format!("unreadable: {:#}", e)))?;
    parser_for(dialect).parse(path, &text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;

    #[test]
    fn test_dispatch_reads_through_file_system() {
        let fs = MockFileSystem::new();
        fs.add_file("A/Meta/A.Build.py", "ServiceMeta = {\"name\": \"A\"}");
        fs.add_file("B/Meta/B.Build.cs", "class BTarget : NutTarget {}");

        let a = parse_descriptor(&fs, Path::new("/mock/A/Meta/A.Build.py"), DialectTag::Literal)
            .unwrap();
        assert_eq!(a.name, "A");

        let b = parse_descriptor(&fs, Path::new("/mock/B/Meta/B.Build.cs"), DialectTag::Class)
            .unwrap();
        assert_eq!(b.name, "B");
    }

    #[test]
    fn test_unreadable_file_is_malformed() {
        let fs = MockFileSystem::new();
        let err = parse_descriptor(&fs, Path::new("/mock/X.Build.py"), DialectTag::Literal)
            .unwrap_err();
        assert!(err.is_discovery_error());
    }
}
