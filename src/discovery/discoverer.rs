use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::scan::{self, ScanResult};
use crate::error::BuildError;
use crate::fs::FileSystem;
use crate::meta::{self, DialectTag};
use crate::model::BuildUnit;

/// Discovered units keyed by name, iterated in insertion order.
///
/// Re-inserting a name replaces the earlier unit in place.
#[derive(Debug, Clone, Default)]
pub struct UnitSet {
    units: Vec<BuildUnit>,
    index: HashMap<String, usize>,
}

impl UnitSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `unit`, returning the unit it replaced, if any.
    pub fn insert(&mut self, unit: BuildUnit) -> Option<BuildUnit> {
        match self.index.get(&unit.name) {
            Some(&i) => Some(std::mem::replace(&mut self.units[i], unit)),
            None => {
                self.index.insert(unit.name.clone(), self.units.len());
                self.units.push(unit);
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&BuildUnit> {
        self.index.get(name).map(|&i| &self.units[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &BuildUnit> {
        self.units.iter()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Names sorted for display
    pub fn sorted_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.units.iter().map(|u| u.name.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn map_units(self, f: impl FnMut(BuildUnit) -> BuildUnit) -> Self {
        let units: Vec<BuildUnit> = self.units.into_iter().map(f).collect();
        Self {
            units,
            index: self.index,
        }
    }
}

impl<'a> IntoIterator for &'a UnitSet {
    type Item = &'a BuildUnit;
    type IntoIter = std::slice::Iter<'a, BuildUnit>;

    fn into_iter(self) -> Self::IntoIter {
        self.units.iter()
    }
}

/// Result of one discovery pass. Warnings never abort the pass.
#[derive(Debug, Default)]
pub struct Discovery {
    pub units: UnitSet,
    /// `.csproj` files found alongside the descriptors
    pub managed: Vec<PathBuf>,
    pub warnings: Vec<BuildError>,
}

pub struct MetaDiscoverer<'a> {
    fs: &'a dyn FileSystem,
}

impl<'a> MetaDiscoverer<'a> {
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        Self { fs }
    }

    /// Scans each root in order and unions the results; later roots override earlier
    /// ones on name collision.
    pub fn discover_all(&self, roots: &[PathBuf]) -> Discovery {
        let mut scans = Vec::new();
        let mut warnings = Vec::new();

        for root in roots {
            match scan::execute(self.fs, root) {
                Ok(result) => scans.push(result),
                Err(e) => {
                    warn!(root = %root.display(), error = %e, "Skipping unreadable search root");
                    warnings.push(BuildError::io(
                        root,
                        std::io::Error::new(std::io::ErrorKind::Other, format!("{:#}", e)),
                    ));
                }
            }
        }

        let mut discovery = self.discover_scans(&scans);
        warnings.append(&mut discovery.warnings);
        discovery.warnings = warnings;
        discovery
    }

    pub fn discover_scans(&self, scans: &[ScanResult]) -> Discovery {
        let mut discovery = Discovery::default();

        for scan in scans {
            for project in scan.managed_projects() {
                if !discovery.managed.contains(&project) {
                    discovery.managed.push(project);
                }
            }
            for (root, descriptors) in group_by_project_root(scan.descriptors()) {
                debug!(
                    project = %root.display(),
                    descriptors = descriptors.len(),
                    "Parsing descriptors"
                );
                for (path, dialect) in descriptors {
                    self.discover_one(&path, dialect, &mut discovery);
                }
            }
        }

        discovery
    }

    fn discover_one(&self, path: &Path, dialect: DialectTag, discovery: &mut Discovery) {
        let spec = match meta::parse_descriptor(self.fs, path, dialect) {
            Ok(spec) => spec,
            Err(e) => {
                warn!("{}", e);
                discovery.warnings.push(e);
                return;
            }
        };

        let unit = BuildUnit::from_spec(spec, path);
        debug!(
            unit = %unit.name,
            dialect = %dialect,
            descriptor = %path.display(),
            "Discovered unit"
        );

        if let Some(replaced) = discovery.units.insert(unit) {
            if replaced.descriptor != path {
                let err = BuildError::DuplicateUnitName {
                    name: replaced.name.clone(),
                    replaced: replaced.descriptor.clone(),
                    kept: path.to_path_buf(),
                };
                warn!("{}", err);
                discovery.warnings.push(err);
            }
        }
    }
}

/// Groups descriptors by their project root (the descriptor's parent-of-parent).
fn group_by_project_root(
    descriptors: Vec<(PathBuf, DialectTag)>,
) -> BTreeMap<PathBuf, Vec<(PathBuf, DialectTag)>> {
    let mut grouped: BTreeMap<PathBuf, Vec<(PathBuf, DialectTag)>> = BTreeMap::new();
    for (path, dialect) in descriptors {
        let root = path
            .parent()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_default();
        grouped.entry(root).or_default().push((path, dialect));
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;
    use crate::model::OutputKind;

    fn descriptor(name: &str) -> String {
        format!(
            "ServiceMeta = {{\n    \"name\": \"{}\",\n    \"sources\": [\"../Sources/{}Main.cpp\"],\n    \"output\": \"{}Main\"\n}}\n",
            name, name, name
        )
    }

    #[test]
    fn test_empty_tree_yields_nothing() {
        let fs = MockFileSystem::new();
        fs.add_file("Source/README.md", "");

        let discovery = MetaDiscoverer::new(&fs).discover_all(&[PathBuf::from("/mock/Source")]);
        assert!(discovery.units.is_empty());
        assert!(discovery.managed.is_empty());
        assert!(discovery.warnings.is_empty());
    }

    #[test]
    fn test_managed_projects_are_recorded_once() {
        let fs = MockFileSystem::new();
        fs.add_file("Source/Programs/Tool/Tool.csproj", "");

        let discovery = MetaDiscoverer::new(&fs).discover_all(&[
            PathBuf::from("/mock/Source"),
            PathBuf::from("/mock/Source/Programs"),
        ]);
        assert_eq!(
            discovery.managed,
            vec![PathBuf::from("/mock/Source/Programs/Tool/Tool.csproj")]
        );
    }

    #[test]
    fn test_discovers_both_dialects() {
        let fs = MockFileSystem::new();
        fs.add_file("Source/Runtime/Player/Meta/Player.Build.py", &descriptor("Player"));
        fs.add_file(
            "Source/Runtime/NutLib/Meta/NutLib.Build.cs",
            "class NutLibTarget : NutTarget {}",
        );

        let discovery = MetaDiscoverer::new(&fs).discover_all(&[PathBuf::from("/mock/Source")]);
        assert_eq!(discovery.units.len(), 2);

        let player = discovery.units.get("Player").unwrap();
        assert_eq!(player.layout.root, PathBuf::from("/mock/Source/Runtime/Player"));
        assert_eq!(player.output_name, "PlayerMain");

        let lib = discovery.units.get("NutLib").unwrap();
        assert_eq!(lib.output_kind, OutputKind::StaticLibrary);
    }

    #[test]
    fn test_malformed_descriptor_is_skipped() {
        let fs = MockFileSystem::new();
        fs.add_file("Source/Good/Meta/Good.Build.py", &descriptor("Good"));
        fs.add_file("Source/Bad/Meta/Bad.Build.py", "ServiceMeta = {\"name\": compute()}");

        let discovery = MetaDiscoverer::new(&fs).discover_all(&[PathBuf::from("/mock/Source")]);
        assert_eq!(discovery.units.sorted_names(), vec!["Good"]);
        assert_eq!(discovery.warnings.len(), 1);
        assert!(matches!(
            &discovery.warnings[0],
            BuildError::MalformedDescriptor { path, .. } if path.ends_with("Bad.Build.py")
        ));
    }

    #[test]
    fn test_later_root_overrides_with_warning() {
        let fs = MockFileSystem::new();
        fs.add_file("MicroServices/Alloc/Meta/Alloc.Build.py", &descriptor("Alloc"));
        fs.add_file("MicroServices/Other/Meta/Other.Build.py", &descriptor("Other"));
        fs.add_file("ServiceAllocate/Alloc/Meta/Alloc.Build.py", &descriptor("Alloc"));

        let discovery = MetaDiscoverer::new(&fs).discover_all(&[
            PathBuf::from("/mock/MicroServices"),
            PathBuf::from("/mock/ServiceAllocate"),
        ]);

        let names: Vec<&str> = discovery.units.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["Alloc", "Other"]);
        assert_eq!(
            discovery.units.get("Alloc").unwrap().layout.root,
            PathBuf::from("/mock/ServiceAllocate/Alloc")
        );
        assert_eq!(discovery.warnings.len(), 1);
        assert_eq!(discovery.warnings[0].kind(), "DuplicateUnitName");
    }

    #[test]
    fn test_overlapping_roots_do_not_warn() {
        let fs = MockFileSystem::new();
        fs.add_file("Source/Runtime/A/Meta/A.Build.py", &descriptor("A"));

        let discovery = MetaDiscoverer::new(&fs).discover_all(&[
            PathBuf::from("/mock/Source"),
            PathBuf::from("/mock/Source/Runtime"),
        ]);
        assert_eq!(discovery.units.len(), 1);
        assert!(discovery.warnings.is_empty());
    }

    #[test]
    fn test_unit_set_replace_keeps_position() {
        let mut set = UnitSet::new();
        let make = |name: &str, root: &str| {
            BuildUnit::from_spec(
                crate::model::UnitSpec::new(name),
                &PathBuf::from(root).join("Meta/x.Build.py"),
            )
        };
        assert!(set.insert(make("B", "/1/B")).is_none());
        assert!(set.insert(make("A", "/1/A")).is_none());
        assert!(set.insert(make("B", "/2/B")).is_some());

        let names: Vec<&str> = set.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(set.sorted_names(), vec!["A", "B"]);
        assert_eq!(set.get("B").unwrap().layout.root, PathBuf::from("/2/B"));
    }
}
