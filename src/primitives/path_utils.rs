//! Path utilities for comparison and normalization.
//!
//! Drive roots and history entries are matched the way Windows matches
//! them: ignoring case and ignoring trailing separators.

use std::path::{Component, Path, PathBuf};

/// Remove trailing `\` and `/` from a path, but never reduce a root
/// (`/`, `C:\`) to nothing.
pub fn trim_trailing_separators(path: &Path) -> PathBuf {
    let text = path.to_string_lossy();
    let trimmed = text.trim_end_matches(['\\', '/']);
    if trimmed.is_empty() {
        return path.to_path_buf();
    }
    // "C:" on its own means "current directory of drive C", keep the separator
    if is_bare_drive(trimmed) && trimmed.len() < text.len() {
        return PathBuf::from(&text[..trimmed.len() + 1]);
    }
    PathBuf::from(trimmed)
}

fn is_bare_drive(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Case-insensitive key for a path, with trailing separators removed
pub fn path_key(path: &Path) -> String {
    path.to_string_lossy()
        .trim_end_matches(['\\', '/'])
        .to_lowercase()
}

/// Compare two paths ignoring case and trailing separators
pub fn paths_equal_ignore_case(a: &Path, b: &Path) -> bool {
    path_key(a) == path_key(b)
}

/// Compare two file names ignoring case
pub fn names_equal_ignore_case(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// Drive designator of a path ("C:" for `c:\Users`), if it has one
pub fn drive_designator(path: &Path) -> Option<String> {
    let text = path.to_string_lossy();
    let head = text.get(..2)?;
    if is_bare_drive(head) {
        Some(head.to_uppercase())
    } else {
        None
    }
}

/// Last path segment, or the whole path for roots
pub fn file_name_lossy(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// If `path` lies under `root` (compared case-insensitively), return the
/// remaining segments in order.
pub fn relative_segments_ignore_case(path: &Path, root: &Path) -> Option<Vec<String>> {
    let mut path_parts = normal_parts(path);
    let root_parts = normal_parts(root);
    if root_parts.len() > path_parts.len() {
        return None;
    }
    let matches = root_parts
        .iter()
        .zip(path_parts.iter())
        .all(|(r, p)| names_equal_ignore_case(r, p));
    if !matches {
        return None;
    }
    Some(path_parts.split_off(root_parts.len()))
}

fn normal_parts(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|c| match c {
            Component::Prefix(p) => Some(p.as_os_str().to_string_lossy().into_owned()),
            Component::RootDir | Component::CurDir => None,
            Component::ParentDir => Some("..".to_string()),
            Component::Normal(n) => Some(n.to_string_lossy().into_owned()),
        })
        .collect()
}
