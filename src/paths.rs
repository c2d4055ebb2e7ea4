//! Lexical path helpers.
//!
//! Paths in the hierarchy are plain strings with `/` separators so that
//! prefix lookups in the layout tree stay simple string operations. Nothing
//! here touches the filesystem.

use std::fmt::Write;
use std::path::Path;

const SEPARATOR: char = '/';

/// Converts an OS path to the string form used in the hierarchy.
///
/// Bytes that are not valid UTF-8 become `\xNN` escapes and, on unix, a
/// literal backslash becomes `\\`, so distinct paths stay distinct.
pub fn from_os(path: &Path) -> String {
    let bytes = path.as_os_str().as_encoded_bytes();
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        for c in chunk.valid().chars() {
            if c == '\\' && cfg!(unix) {
                out.push_str("\\\\");
            } else {
                out.push(c);
            }
        }
        for byte in chunk.invalid() {
            let _ = write!(out, "\\x{byte:02x}");
        }
    }
    out
}

/// Returns the shortest lexically equivalent path.
///
/// Repeated separators collapse, `.` segments disappear and `..` segments
/// eat the preceding real segment. `..` at the start of a relative path is
/// kept; `..` directly under the root is dropped. An empty result becomes `.`.
pub fn clean(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }

    let rooted = path.starts_with(SEPARATOR);
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split(SEPARATOR) {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if rooted => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

pub fn is_clean(path: &str) -> bool {
    clean(path) == path
}

/// Everything but the last segment, cleaned. `.` when there is no separator.
pub fn dir(path: &str) -> String {
    match path.rfind(SEPARATOR) {
        Some(idx) => clean(&path[..=idx]),
        None => ".".to_string(),
    }
}

/// The last segment, ignoring trailing separators. `/` for the root.
pub fn name(path: &str) -> &str {
    if path.is_empty() {
        return ".";
    }
    let trimmed = path.trim_end_matches(SEPARATOR);
    if trimmed.is_empty() {
        return "/";
    }
    match trimmed.rfind(SEPARATOR) {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// Joins a child name onto a clean parent.
pub fn join(parent: &str, child: &str) -> String {
    clean(&format!("{parent}/{child}"))
}
