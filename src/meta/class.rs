//! Class-declaration descriptors (`<X>.Build.cs`)
//!
//! The unit is declared as `class <Name>Target : <Marker>`; only the declaration line
//! is read, the class body is ignored.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

use super::DescriptorParser;
use crate::error::BuildError;
use crate::model::{OutputKind, UnitSpec};

const TARGET_SUFFIX: &str = "Target";

/// Recognized base types and the output kind each one fixes, if any
const MARKERS: &[(&str, Option<OutputKind>)] = &[
    ("NutTarget", None),
    ("ExecutableTarget", Some(OutputKind::Executable)),
    ("StaticLibraryTarget", Some(OutputKind::StaticLibrary)),
    ("SharedLibraryTarget", Some(OutputKind::SharedLibrary)),
];

fn class_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\bclass\s+([A-Za-z_][A-Za-z0-9_]*)\s*:\s*(?:public\s+)?([A-Za-z_][A-Za-z0-9_.]*)")
            .expect("class declaration pattern is valid")
    })
}

fn strip_line_comments(text: &str) -> String {
    text.lines()
        .map(|line| match line.find("//") {
            Some(idx) => &line[..idx],
            None => line,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Derives `(unit name, declared kind)` from a class name and its marker base type.
pub fn classify(class_name: &str, base: &str) -> Option<(String, Option<OutputKind>)> {
    let base = base.rsplit('.').next().unwrap_or(base);
    let (_, marker_kind) = *MARKERS.iter().find(|(marker, _)| *marker == base)?;

    let name = class_name
        .strip_suffix(TARGET_SUFFIX)
        .filter(|n| !n.is_empty())
        .unwrap_or(class_name)
        .to_string();

    let kind = marker_kind.or_else(|| {
        if name.ends_with("Lib") || name.ends_with("Library") {
            Some(OutputKind::StaticLibrary)
        } else {
            None
        }
    });

    Some((name, kind))
}

/// Parser for `<X>.Build.cs` descriptors
#[derive(Debug, Default, Clone, Copy)]
pub struct ClassParser;

impl DescriptorParser for ClassParser {
    fn parse(&self, path: &Path, text: &str) -> Result<UnitSpec, BuildError> {
        let text = strip_line_comments(text);

        let (name, kind) = class_pattern()
            .captures_iter(&text)
            .find_map(|caps| classify(&caps[1], &caps[2]))
            .ok_or_else(|| {
                BuildError::malformed(
                    path,
                    "no class deriving from NutTarget, ExecutableTarget, StaticLibraryTarget or SharedLibraryTarget",
                )
            })?;

        let mut spec = UnitSpec::new(name);
        spec.kind = kind;
        spec.discover_protos = true;
        Ok(spec)
    }
}
