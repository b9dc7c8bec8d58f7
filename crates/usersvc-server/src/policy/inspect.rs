//! Suspicious input detection.
//!
//! Detection only: matches are logged and counted, the request itself is
//! judged by validation.

const SUSPICIOUS_PATTERNS: [&str; 12] = [
    "'",
    "--",
    ";",
    "drop ",
    "delete from",
    "insert into",
    "<script",
    "javascript:",
    "onerror=",
    "../",
    "..\\",
    "etc/passwd",
];

/// First suspicious marker found in any of `values` (case-insensitive).
pub fn find_suspicious<'a, I>(values: I) -> Option<&'static str>
where
    I: IntoIterator<Item = &'a str>,
{
    values.into_iter().find_map(|v| {
        let lower = v.to_lowercase();
        SUSPICIOUS_PATTERNS
            .iter()
            .copied()
            .find(|p| lower.contains(p))
    })
}
