//! Job id → relative cache path.

use std::path::PathBuf;

/// Used when an id has no usable segment at all (e.g. `""` or `"../.."`).
const EMPTY_KEY: &str = "_";

/// Maps a job id to a path relative to the cache root.
///
/// `/` separates hierarchy levels. Empty, `.` and `..` segments are dropped so
/// the result always stays under the root; each remaining segment has NUL,
/// `\` and control characters replaced with `_`.
///
/// The mapping is not injective: ids that differ only in dropped segments or
/// replaced characters (`a/../b` and `a/b`, `a\b` and `a_b`) share one cache
/// entry and one marker. Callers that need distinct entries must pick ids that
/// are already clean.
pub fn key_path(id: &str) -> PathBuf {
    let mut path = PathBuf::new();
    for segment in id.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            continue;
        }
        path.push(sanitize_segment(segment));
    }
    if path.as_os_str().is_empty() {
        path.push(EMPTY_KEY);
    }
    path
}

fn sanitize_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| if c == '\0' || c == '\\' || c.is_control() { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn hierarchy_is_preserved() {
        assert_eq!(key_path("vanilla/1.20/data.json"), Path::new("vanilla/1.20/data.json"));
        assert_eq!(key_path("x"), Path::new("x"));
    }

    #[test]
    fn traversal_segments_are_dropped() {
        assert_eq!(key_path("../../etc/passwd"), Path::new("etc/passwd"));
        assert_eq!(key_path("/abs//./x"), Path::new("abs/x"));
    }

    #[test]
    fn empty_ids_get_a_placeholder() {
        assert_eq!(key_path(""), Path::new("_"));
        assert_eq!(key_path("../.."), Path::new("_"));
    }

    #[test]
    fn control_chars_and_backslash_replaced() {
        assert_eq!(key_path("a\\b\x00c\nd"), Path::new("a_b_c_d"));
    }

    #[test]
    fn sanitized_ids_can_share_an_entry() {
        assert_eq!(key_path("a/../b"), key_path("a/b"));
        assert_eq!(key_path("a\\b"), key_path("a_b"));
    }
}
