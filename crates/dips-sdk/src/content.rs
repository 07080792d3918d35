//! Resolution of file content locations.
//!
//! A file's `content_location` points outside the archive. Only local
//! `file:` URIs and bare paths are supported.

use std::path::PathBuf;

use crate::error::{ArchiveError, ArchiveResult};

const FILE_SCHEME: &str = "file:";

/// Rewrite `file:` locations whose path carries a `:` into `file:///path`.
///
/// `file:C:/data/x`, `file:/C:/data/x` and `file://C:/data/x` all become
/// `file:///C:/data/x`. Other locations are returned unchanged.
pub fn normalize_location(location: &str) -> String {
    if let Some(rest) = strip_scheme(location) {
        let path = strip_local_authority(rest).trim_start_matches('/');
        if is_drive_rooted(path) {
            return format!("file:///{path}");
        }
    }
    location.to_string()
}

/// Turn a content location into a local filesystem path.
pub fn resolve_location(location: &str) -> ArchiveResult<PathBuf> {
    let normalized = normalize_location(location);
    let Some(rest) = strip_scheme(&normalized) else {
        if has_foreign_scheme(&normalized) {
            return Err(ArchiveError::UnsupportedLocation(location.to_string()));
        }
        return Ok(PathBuf::from(normalized));
    };

    let path = if let Some(authority_and_path) = rest.strip_prefix("//") {
        let (host, path) = match authority_and_path.find('/') {
            Some(i) => authority_and_path.split_at(i),
            None => (authority_and_path, ""),
        };
        if !(host.is_empty() || host.eq_ignore_ascii_case("localhost")) {
            return Err(ArchiveError::UnsupportedLocation(location.to_string()));
        }
        // A drive letter keeps its own root: "/C:/x" -> "C:/x".
        let trimmed = path.trim_start_matches('/');
        if is_drive_rooted(trimmed) {
            trimmed.to_string()
        } else {
            path.to_string()
        }
    } else {
        rest.to_string()
    };

    if path.is_empty() {
        return Err(ArchiveError::UnsupportedLocation(location.to_string()));
    }
    Ok(PathBuf::from(path))
}

/// Drop a leading `//localhost` authority, keeping the path that follows.
fn strip_local_authority(rest: &str) -> &str {
    let Some(authority_and_path) = rest.strip_prefix("//") else {
        return rest;
    };
    let end = authority_and_path.find('/').unwrap_or(authority_and_path.len());
    if authority_and_path[..end].eq_ignore_ascii_case("localhost") {
        &authority_and_path[end..]
    } else {
        rest
    }
}

/// `C:`, `C:/...` or `C:\...`.
fn is_drive_rooted(path: &str) -> bool {
    let bytes = path.as_bytes();
    match bytes {
        [letter, b':'] => letter.is_ascii_alphabetic(),
        [letter, b':', sep, ..] => letter.is_ascii_alphabetic() && matches!(*sep, b'/' | b'\\'),
        _ => false,
    }
}

fn strip_scheme(location: &str) -> Option<&str> {
    let head = location.get(..FILE_SCHEME.len())?;
    if head.eq_ignore_ascii_case(FILE_SCHEME) {
        location.get(FILE_SCHEME.len()..)
    } else {
        None
    }
}

/// `scheme:` with a scheme of two or more characters. A single letter is a
/// drive, not a scheme.
fn has_foreign_scheme(location: &str) -> bool {
    let Some((scheme, _)) = location.split_once(':') else {
        return false;
    };
    scheme.len() > 1
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
