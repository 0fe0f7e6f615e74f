//! Lexical path helpers
//!
//! None of these functions touch the filesystem, so they are safe to use on paths that
//! do not exist yet (IDE output locations, descriptor-relative declarations).

use std::path::{Component, Path, PathBuf};

/// Collapses `.` and `..` components without resolving symlinks.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Expresses `path` relative to `base`, walking up with `..` where needed.
///
/// Both paths are normalized first. Paths on different roots (e.g. other drive letters)
/// are returned unchanged.
pub fn relative_to(path: &Path, base: &Path) -> PathBuf {
    let path = normalize(path);
    let base = normalize(base);

    let mut path_iter = path.components().peekable();
    let mut base_iter = base.components().peekable();

    match (path_iter.peek(), base_iter.peek()) {
        (Some(Component::Prefix(a)), Some(Component::Prefix(b))) if a != b => return path,
        _ => {}
    }

    while let (Some(a), Some(b)) = (path_iter.peek(), base_iter.peek()) {
        if a != b {
            break;
        }
        path_iter.next();
        base_iter.next();
    }

    let mut out = PathBuf::new();
    for _ in base_iter {
        out.push("..");
    }
    for component in path_iter {
        out.push(component.as_os_str());
    }

    if out.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        out
    }
}

/// Forward-slash rendering, used for JSON, YAML and Xcode output.
pub fn to_forward_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Backslash rendering, used for Visual Studio project files.
pub fn to_backslashes(path: &Path) -> String {
    path.to_string_lossy().replace('/', "\\")
}

/// True for names beginning with a dot (`.git`, `.DS_Store`).
pub fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.') && n.len() > 1)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_parent_components() {
        assert_eq!(
            normalize(Path::new("/repo/Svc/Meta/../Sources/Main.cpp")),
            PathBuf::from("/repo/Svc/Sources/Main.cpp")
        );
        assert_eq!(
            normalize(Path::new("/repo/LibNut/Meta/../../ThirdParty/spdlog/include")),
            PathBuf::from("/repo/ThirdParty/spdlog/include")
        );
        assert_eq!(normalize(Path::new("a/./b")), PathBuf::from("a/b"));
        assert_eq!(normalize(Path::new("../x")), PathBuf::from("../x"));
    }

    #[test]
    fn test_relative_to_sibling_tree() {
        assert_eq!(
            relative_to(
                Path::new("/repo/Source/Runtime/Player/Sources/Main.cpp"),
                Path::new("/repo/Projects/Runtime")
            ),
            PathBuf::from("../../Source/Runtime/Player/Sources/Main.cpp")
        );
    }

    #[test]
    fn test_relative_to_descendant_and_self() {
        assert_eq!(
            relative_to(Path::new("/repo/a/b"), Path::new("/repo")),
            PathBuf::from("a/b")
        );
        assert_eq!(relative_to(Path::new("/repo"), Path::new("/repo")), PathBuf::from("."));
    }

    #[test]
    fn test_slash_rendering() {
        assert_eq!(to_backslashes(Path::new("../Sources/Main.cpp")), "..\\Sources\\Main.cpp");
        assert_eq!(to_forward_slashes(Path::new("a\\b")), "a/b");
    }

    #[test]
    fn test_is_hidden() {
        assert!(is_hidden(Path::new("/x/.DS_Store")));
        assert!(!is_hidden(Path::new("/x/Main.cpp")));
        assert!(!is_hidden(Path::new(".")));
    }
}
