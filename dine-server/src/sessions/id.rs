//! Session id wire format
//!
//! Current: `session-{table}-{13 digit ms timestamp}-{6..15 alnum}`
//! Legacy:  `session-{13 digit ms timestamp}-{6..15 alnum}`
//!
//! Table numbers are 1..=32 ASCII alphanumerics, so `-` only ever separates
//! segments.

use rand::Rng;
use rand::distributions::Alphanumeric;

const PREFIX: &str = "session-";
const TIMESTAMP_DIGITS: usize = 13;
const SUFFIX_LEN: usize = 9;
const SUFFIX_MIN: usize = 6;
const SUFFIX_MAX: usize = 15;
const MAX_TABLE_LEN: usize = 32;

/// Decoded session id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionIdParts<'a> {
    /// `None` for legacy ids
    pub table_number: Option<&'a str>,
    pub timestamp: i64,
    pub suffix: &'a str,
}

pub fn is_valid_table_number(table_number: &str) -> bool {
    !table_number.is_empty()
        && table_number.len() <= MAX_TABLE_LEN
        && table_number.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// New current-format id for a table
pub fn generate_id(table_number: &str) -> String {
    generate_id_at(table_number, shared::util::now_millis())
}

pub(crate) fn generate_id_at(table_number: &str, now_ms: i64) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("{PREFIX}{table_number}-{now_ms:013}-{suffix}")
}

pub fn parse(id: &str) -> Option<SessionIdParts<'_>> {
    let rest = id.strip_prefix(PREFIX)?;
    let segments: Vec<&str> = rest.split('-').collect();
    let (table_number, timestamp, suffix) = match segments.as_slice() {
        [table, timestamp, suffix] => (Some(*table), *timestamp, *suffix),
        [timestamp, suffix] => (None, *timestamp, *suffix),
        _ => return None,
    };

    if table_number.is_some_and(|t| !is_valid_table_number(t)) {
        return None;
    }
    if timestamp.len() != TIMESTAMP_DIGITS || !timestamp.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !(SUFFIX_MIN..=SUFFIX_MAX).contains(&suffix.len())
        || !suffix.bytes().all(|b| b.is_ascii_alphanumeric())
    {
        return None;
    }

    Some(SessionIdParts {
        table_number,
        timestamp: timestamp.parse().ok()?,
        suffix,
    })
}

/// Accepts both the current and the legacy format
pub fn validate(id: &str) -> bool {
    parse(id).is_some()
}

/// Table segment of a current-format id; `None` for legacy or malformed ids
pub fn extract_table_number(id: &str) -> Option<&str> {
    parse(id)?.table_number
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_compatibility() {
        assert!(validate("session-A1-1700000000000-abc123"));
        assert!(validate("session-1700000000000-abc123"));
        assert!(!validate("session-A1-abc"));
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(!validate(""));
        assert!(!validate("sess-A1-1700000000000-abc123"));
        assert!(!validate("session-A1-170000000000-abc123"));
        assert!(!validate("session-A1-1700000000000-abc12"));
        assert!(!validate("session-A1-1700000000000-abcdefghijklmnop"));
        assert!(!validate("session-A-1-1700000000000-abc123"));
        assert!(!validate("session-A1-1700000000000-abc_23"));
        assert!(!validate("session--1700000000000-abc123"));
    }

    #[test]
    fn test_extract_table_number() {
        assert_eq!(extract_table_number("session-A1-1700000000000-abc123"), Some("A1"));
        assert_eq!(extract_table_number("session-1700000000000-abc123"), None);
        assert_eq!(extract_table_number("garbage"), None);
    }

    #[test]
    fn test_generated_ids_parse() {
        let id = generate_id_at("T12", 1_700_000_000_123);
        let parts = parse(&id).unwrap();
        assert_eq!(parts.table_number, Some("T12"));
        assert_eq!(parts.timestamp, 1_700_000_000_123);
        assert_eq!(parts.suffix.len(), SUFFIX_LEN);

        assert_ne!(generate_id("T12"), generate_id("T12"));
    }

    #[test]
    fn test_table_number_rules() {
        assert!(is_valid_table_number("A1"));
        assert!(is_valid_table_number("12"));
        assert!(!is_valid_table_number(""));
        assert!(!is_valid_table_number("A 1"));
        assert!(!is_valid_table_number("A-1"));
        assert!(!is_valid_table_number(&"9".repeat(33)));
    }
}
