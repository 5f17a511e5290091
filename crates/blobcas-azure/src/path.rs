//! Mapping between content identifiers and backend object names.
//!
//! A block with identifier `id` is stored as `root + id.to_hex()`. The root
//! is canonicalized once, at construction, so that it never starts with a
//! separator and always ends with one (the container root is `""`).

use blobcas_types::ContentId;

/// Virtual directory separator in object names.
pub const SEPARATOR: char = '/';

/// Normalize a configured root prefix.
///
/// Strips a single leading separator and appends a trailing one, unless
/// nothing is left, which denotes the container root.
///
/// ```
/// use blobcas_azure::path::canonicalize_root;
///
/// assert_eq!(canonicalize_root("/a/b"), "a/b/");
/// assert_eq!(canonicalize_root("a/b/"), "a/b/");
/// assert_eq!(canonicalize_root("/"), "");
/// ```
pub fn canonicalize_root(path: &str) -> String {
    let path = path.strip_prefix(SEPARATOR).unwrap_or(path);
    if path.is_empty() || path.ends_with(SEPARATOR) {
        path.to_string()
    } else {
        format!("{path}{SEPARATOR}")
    }
}

/// Object name for `id` under the canonical `root`.
pub fn encode(root: &str, id: &ContentId) -> String {
    format!("{root}{}", id.to_hex())
}

/// Identifier encoded in the last segment of `name`, if any.
///
/// Returns `None` rather than an error for names that are not block names,
/// so callers can filter foreign objects. Only the lowercase hex produced
/// by [`encode`] is accepted.
pub fn decode(name: &str) -> Option<ContentId> {
    let segment = last_segment(name);
    if !is_lower_hex(segment) {
        return None;
    }
    ContentId::from_hex(segment).ok()
}

/// The part of `name` below `root`, if `name` lies under it.
pub fn relative_name<'a>(root: &str, name: &'a str) -> Option<&'a str> {
    name.strip_prefix(root)
}

/// Final `/`-separated segment of `name`.
pub fn last_segment(name: &str) -> &str {
    name.rsplit(SEPARATOR).next().unwrap_or(name)
}

fn is_lower_hex(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
