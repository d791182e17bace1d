//! Key path composition over the flat key space.
//!
//! A table path is either empty (the root) or starts with exactly one
//! [`PATH_SEPARATOR`] and never ends with one. Absolute keys are formed by
//! appending the separator and a relative key to a table path.

#[cfg(test)]
mod path_test;

use crate::constants::PATH_SEPARATOR;

/// Joins a table path and a relative key into an absolute key.
///
/// `relative_key` is not validated and may itself contain separators.
pub fn absolute(
    table_path: &str,
    relative_key: &str,
) -> String {
    let mut key = String::with_capacity(table_path.len() + 1 + relative_key.len());
    key.push_str(table_path);
    key.push(PATH_SEPARATOR);
    key.push_str(relative_key);
    key
}

/// Path of the subtable `key` below `table_path`.
///
/// Trailing separators are dropped, so an empty key names the table itself.
pub fn child(
    table_path: &str,
    key: &str,
) -> String {
    let mut path = absolute(table_path, key);
    path.truncate(path.trim_end_matches(PATH_SEPARATOR).len());
    path
}

/// Prefix every direct or nested entry of the table starts with.
pub fn prefix(table_path: &str) -> String {
    absolute(table_path, "")
}

/// Normalizes a root table name into a table path.
///
/// Empty names and names already starting with the separator are kept as is;
/// anything else gets one leading separator.
pub fn root_path(name: &str) -> String {
    if name.is_empty() || name.starts_with(PATH_SEPARATOR) {
        name.to_string()
    } else {
        absolute("", name)
    }
}

/// Strips `prefix_len` bytes from an absolute key.
///
/// Returns `None` if the key is shorter than the prefix or the cut does not
/// fall on a char boundary. Callers only pass keys already matched against
/// the prefix.
pub fn relative(
    absolute_key: &str,
    prefix_len: usize,
) -> Option<&str> {
    absolute_key.get(prefix_len..)
}

/// Splits a relative key at its first separator.
///
/// Returns the leading segment and whether anything followed it, i.e. whether
/// the key names a descendant through an intermediate subtable.
pub fn first_segment(key: &str) -> (&str, bool) {
    match key.find(PATH_SEPARATOR) {
        Some(end) => (&key[..end], true),
        None => (key, false),
    }
}

/// Key length to strip from entries of the table at `table_path`.
#[inline]
pub fn prefix_len(table_path: &str) -> usize {
    table_path.len() + PATH_SEPARATOR.len_utf8()
}
