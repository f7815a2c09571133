use chrono::NaiveDateTime;

use crate::error::{MarketError, Result};

/// Patterns accepted for the `timestamp` column, tried in order.
const FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a scan timestamp such as `2019-09-02 07:03:00`.
///
/// The scan files record local store time without an offset, so the result
/// is a naive date-time. Empty or unrecognised strings are an error; there is
/// no fallback value.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(MarketError::TimestampParse(raw.to_string()));
    }

    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .ok_or_else(|| MarketError::TimestampParse(raw.to_string()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
