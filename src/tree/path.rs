//! Slash-separated path handling.

use crate::errors::{KeyTreeError, Result};

/// Separator between path segments.
pub const SEPARATOR: char = '/';

/// Most segments a path may have.  The payload codec refuses deeper
/// trees, so anything longer could be set but never read back.
pub const MAX_DEPTH: usize = 64;

/// Split `path` into its segments.
///
/// Leading and trailing slashes are ignored, so `/email/gmail/` and
/// `email/gmail` address the same node.  A path with no segments, or
/// with an empty segment in the middle (`a//b`), is rejected, and so is
/// one with more than [`MAX_DEPTH`] segments.
pub fn split(path: &str) -> Result<Vec<&str>> {
    let trimmed = path.trim_matches(SEPARATOR);
    if trimmed.is_empty() {
        return Err(KeyTreeError::InvalidPath(path.to_string()));
    }

    let segments: Vec<&str> = trimmed.split(SEPARATOR).collect();
    if segments.iter().any(|s| s.is_empty()) || segments.len() > MAX_DEPTH {
        return Err(KeyTreeError::InvalidPath(path.to_string()));
    }
    Ok(segments)
}

/// Join a parent path and a child label.
pub fn join(parent: &str, label: &str) -> String {
    if parent.is_empty() {
        label.to_string()
    } else {
        format!("{parent}{SEPARATOR}{label}")
    }
}

/// Whether `label` is usable as a single edge label.
pub fn is_valid_label(label: &str) -> bool {
    !label.is_empty() && !label.contains(SEPARATOR)
}
