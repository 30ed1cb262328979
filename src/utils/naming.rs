//! File-name sanitization and suffix generation.

/// Replaces every character outside `[A-Za-z0-9_]` with `_`.
///
/// Generated download names must survive every filesystem and HTTP header
/// they pass through, so anything exotic is flattened.
pub fn replace_non_alphanumeric(input: &str) -> String {
    input
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Returns 8 random bytes in hex, for de-duplicating generated file names.
pub fn random_suffix() -> String {
    format!("{:016x}", rand::random::<u64>())
}
