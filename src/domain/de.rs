//! Serde helpers for the date formats that show up in comic records.

use chrono::{DateTime, Datelike, FixedOffset};
use serde::{Deserialize, Deserializer};

/// Upstream timestamps look like `2019-01-02T00:00:00-0500` (no colon in the offset).
const UPSTREAM_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Parse either RFC 3339 (what we persist) or the upstream format.
///
/// Upstream marks unknown dates with year `-0001`; those come back as `None`.
pub fn parse_datetime(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, UPSTREAM_FORMAT))
        .ok()
        .filter(|d| d.year() > 0)
}

/// Accept a date string or null; anything unparseable becomes `None` instead of an error.
pub fn opt_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<FixedOffset>>, D::Error>
where
    D: Deserializer<'de>,
{
    let val: Option<String> = Option::deserialize(deserializer)?;
    Ok(val.as_deref().and_then(parse_datetime))
}
