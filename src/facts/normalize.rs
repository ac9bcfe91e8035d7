//! Country key normalization.

/// Turn a raw path segment into a table key.
///
/// Lowercases the input and replaces every `-` with a single space. No
/// trimming or collapsing is done, so `" Japan"` stays distinct from `"japan"`.
pub fn normalize(raw: &str) -> String {
    raw.to_lowercase().replace('-', " ")
}
