//! Path containment for extraction directories
//!
//! Paths are normalized lexically (no filesystem access), so a traversal
//! attempt is rejected before anything is created, written or opened.

use std::path::{Component, Path, PathBuf};

use crate::document::{DocumentError, Result};

/// Resolve `.` and `..` components without touching the filesystem
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `/..` is `/`
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Check that `path` normalizes to somewhere strictly inside `root`
pub fn ensure_within(root: &Path, path: &Path) -> Result<PathBuf> {
    let root = normalize(root);
    let candidate = normalize(path);
    if candidate != root && candidate.starts_with(&root) {
        Ok(candidate)
    } else {
        Err(DocumentError::PathEscape(path.display().to_string()))
    }
}

/// Join `relative` onto `root`, rejecting results outside `root`
pub fn contain(root: &Path, relative: impl AsRef<Path>) -> Result<PathBuf> {
    let relative = relative.as_ref();
    ensure_within(root, &root.join(relative))
        .map_err(|_| DocumentError::PathEscape(relative.display().to_string()))
}

/// Express `path` relative to `root` with forward slashes
///
/// Returns `None` when `path` is not inside `root`.
pub fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
    let root = normalize(root);
    let path = normalize(path);
    let rel = path.strip_prefix(&root).ok()?;
    let segments: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}
