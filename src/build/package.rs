//! Deployment archives
//!
//! An archive holds the top-level regular files of a unit's output directory under
//! their bare file names; subdirectories are not descended into.

use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::BuildError;
use crate::model::BuildUnit;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageOutcome {
    Archived { archive: PathBuf, files: usize },
    /// Output directory absent
    NothingToPackage,
}

pub fn archive_path(unit: &BuildUnit) -> PathBuf {
    unit.layout.root.join(format!("{}.tar.gz", unit.name))
}

/// Top-level regular files of `dir`, sorted by name.
pub fn archive_members(dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut members = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| BuildError::io(dir, e))? {
        let path = entry.map_err(|e| BuildError::io(dir, e))?.path();
        if path.is_file() {
            members.push(path);
        }
    }
    members.sort();
    Ok(members)
}

/// An existing output directory is always archived, even when it yields an empty archive.
pub fn package_unit(unit: &BuildUnit) -> Result<PackageOutcome, BuildError> {
    if !unit.layout.output.is_dir() {
        return Ok(PackageOutcome::NothingToPackage);
    }
    let members = archive_members(&unit.layout.output)?;

    let archive = archive_path(unit);
    write_archive(&archive, &members).map_err(|e| BuildError::io(&archive, e))?;

    Ok(PackageOutcome::Archived {
        archive,
        files: members.len(),
    })
}

fn write_archive(archive: &Path, members: &[PathBuf]) -> std::io::Result<()> {
    let file = File::create(archive)?;
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));

    for member in members {
        let name = member.file_name().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "member without a file name")
        })?;
        builder.append_path_with_name(member, name)?;
    }

    builder.into_inner()?.finish()?;
    Ok(())
}
