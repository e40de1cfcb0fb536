//! Lexical path helpers. None of these touch the filesystem.

use std::path::{Component, Path, PathBuf};

/// Normalize a path by processing `.` and `..` components lexically.
/// This does not access the filesystem and does not follow symlinks.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // At the root (or an empty relative path) the `..` is kept.
                if !result.pop() {
                    result.push(component);
                }
            }
            _ => result.push(component),
        }
    }
    result
}

/// Check if `path` is `dir` or lies below it, comparing normalized components.
///
/// `/home/user/.al/../../etc` is NOT under `/home/user/.al`.
pub fn is_path_under(path: &Path, dir: &Path) -> bool {
    let normalized_path = normalize_path(path);
    let normalized_dir = normalize_path(dir);

    let path_components: Vec<_> = normalized_path.components().collect();
    let dir_components: Vec<_> = normalized_dir.components().collect();

    if path_components.len() < dir_components.len() {
        return false;
    }

    dir_components
        .iter()
        .zip(path_components.iter())
        .all(|(d, p)| d == p)
}

/// Resolve `relative_path` against `base_dir` and normalize the result.
/// Absolute inputs are only normalized.
pub fn resolve_relative_path(base_dir: &Path, relative_path: &Path) -> PathBuf {
    if relative_path.is_absolute() {
        normalize_path(relative_path)
    } else {
        normalize_path(&base_dir.join(relative_path))
    }
}

/// True if the path was written with a trailing separator (`dir/`).
/// Must be checked on the raw input, before any join or normalization drops it.
pub fn has_trailing_separator(path: &Path) -> bool {
    let path_str = path.to_string_lossy();
    let trimmed = path_str.trim_end_matches(' ');
    trimmed.ends_with('/') || (cfg!(windows) && trimmed.ends_with('\\'))
}
