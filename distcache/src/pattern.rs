//! Key pattern helpers.

/// Characters with a meaning in Redis glob patterns.
const GLOB_SPECIAL: &[char] = &['*', '?', '[', ']', '\\'];

/// Escape `literal` so it matches only itself inside a glob pattern.
pub fn escape_glob(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len());
    for c in literal.chars() {
        if GLOB_SPECIAL.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Glob matching every key that contains `substring`, case-sensitively.
pub fn contains_glob(substring: &str) -> String {
    format!("*{}*", escape_glob(substring))
}

/// Glob matching every key.
pub const MATCH_ALL: &str = "*";
