//! SQLite helper utilities for type conversion
//!
//! SQLite has no native timestamp or boolean column types. This module keeps the
//! conversions between Rust types and the TEXT/INTEGER representations in one place.

use anyhow::{Result, anyhow};
use chrono::{DateTime, SecondsFormat, Utc};

// ============================================================================
// Timestamp Helpers (stored as RFC 3339 TEXT in SQLite)
// ============================================================================

/// Current UTC timestamp as a fixed-width RFC 3339 string.
///
/// Fixed width keeps `ORDER BY` on the text column chronological.
#[inline]
pub fn now_iso8601() -> String {
    datetime_to_str(Utc::now())
}

#[inline]
pub fn datetime_to_str(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse an RFC 3339 string to DateTime
#[inline]
pub fn str_to_datetime(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Rows written by hand through the sqlite3 shell use datetime('now')
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .map(|ndt| ndt.and_utc())
                .map_err(|e| anyhow!("Invalid datetime '{}': {}", s, e))
        })
}

// ============================================================================
// Boolean Helpers (SQLite uses 0/1 integers)
// ============================================================================

#[inline]
pub fn bool_to_int(b: bool) -> i32 {
    if b { 1 } else { 0 }
}

#[inline]
pub fn int_to_bool(i: i32) -> bool {
    i != 0
}

// ============================================================================
// Query Building Helpers
// ============================================================================

/// Build a `column IN (?, ?, ...)` fragment for `count` bind parameters.
///
/// An empty list yields a predicate that is always false.
pub fn in_list_sql(column: &str, count: usize) -> String {
    if count == 0 {
        return "1=0".to_string();
    }

    let placeholders: Vec<&str> = (0..count).map(|_| "?").collect();
    format!("{} IN ({})", column, placeholders.join(", "))
}

/// Escape `%`, `_` and `\` so user input matches literally inside `LIKE ... ESCAPE '\'`.
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};

    #[test]
    fn test_datetime_parsing() {
        let dt = str_to_datetime("2024-03-15T10:30:00Z").unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.month(), 3);
        assert_eq!(dt.day(), 15);

        let dt = str_to_datetime("2024-03-15 10:30:00").unwrap();
        assert_eq!(dt.year(), 2024);

        assert!(str_to_datetime("yesterday").is_err());
    }

    #[test]
    fn test_timestamps_sort_as_text() {
        let earlier = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let later = earlier + chrono::Duration::microseconds(1500);

        let a = datetime_to_str(earlier);
        let b = datetime_to_str(later);
        assert_eq!(a.len(), b.len());
        assert!(a < b);
        assert_eq!(str_to_datetime(&b).unwrap(), later);
    }

    #[test]
    fn test_bool_conversion() {
        assert_eq!(bool_to_int(true), 1);
        assert_eq!(bool_to_int(false), 0);
        assert!(int_to_bool(1));
        assert!(!int_to_bool(0));
        assert!(int_to_bool(42));
    }

    #[test]
    fn test_in_list_sql() {
        assert_eq!(in_list_sql("cg.content_id", 0), "1=0");
        assert_eq!(in_list_sql("cg.content_id", 1), "cg.content_id IN (?)");
        assert_eq!(in_list_sql("id", 3), "id IN (?, ?, ?)");
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("orbit"), "orbit");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b\\c"), "a\\_b\\\\c");
    }
}
