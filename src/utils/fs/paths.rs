//! Path normalization and lookup helpers.

use std::path::{Component, Path, PathBuf};

/// Normalizes a path by resolving `.` and `..` components lexically.
///
/// The file system is not consulted, so symlinks are not followed and the
/// path does not need to exist. Dependency graph keys and template origins
/// all go through this so the same file always maps to the same key.
///
/// # Examples
///
/// ```rust
/// use pugcheck_cli::utils::fs::normalize_path;
/// use std::path::{Path, PathBuf};
///
/// let path = Path::new("/views/pages/../partials/./nav.pug");
/// assert_eq!(normalize_path(path), PathBuf::from("/views/partials/nav.pug"));
/// ```
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            c => components.push(c),
        }
    }

    components.iter().collect()
}

/// Makes `path` absolute against `base` (when relative) and normalizes it.
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(&base.join(path))
    }
}

/// Walks up from `start` looking for a directory containing `file_name`.
pub fn find_upwards(start: &Path, file_name: &str) -> Option<PathBuf> {
    let mut current = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());
    loop {
        let candidate = current.join(file_name);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Path of `path` relative to `base` for display, falling back to `path` itself.
pub fn display_relative(path: &Path, base: &Path) -> String {
    path.strip_prefix(base).unwrap_or(path).display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(Path::new("/a/b/../c/./d.pug")), PathBuf::from("/a/c/d.pug"));
        assert_eq!(normalize_path(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize_path(Path::new("../a/b/..")), PathBuf::from("../a"));
    }

    #[test]
    fn test_absolutize() {
        assert_eq!(absolutize(Path::new("views/a.pug"), Path::new("/proj")), PathBuf::from("/proj/views/a.pug"));
        assert_eq!(absolutize(Path::new("/x/./y"), Path::new("/proj")), PathBuf::from("/x/y"));
    }

    #[test]
    fn test_find_upwards() {
        let temp = tempdir().unwrap();
        let nested = temp.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(temp.path().join("pugcheck.toml"), "").unwrap();

        let found = find_upwards(&nested, "pugcheck.toml").unwrap();
        assert_eq!(found.file_name().unwrap(), "pugcheck.toml");
        assert!(find_upwards(&nested, "missing.toml").is_none());
    }

    #[test]
    fn test_display_relative() {
        assert_eq!(display_relative(Path::new("/p/views/a.pug"), Path::new("/p")), "views/a.pug");
        assert_eq!(display_relative(Path::new("/q/a.pug"), Path::new("/p")), "/q/a.pug");
    }
}
