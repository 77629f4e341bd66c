// src/models/timestamp.rs

//! Lenient timestamp reading. Older records store ISO timestamps without an
//! offset (`2024-05-01T10:00:00.123456`); those are taken as UTC.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, de::Error};

/// Parses an RFC 3339 timestamp, or a naive ISO one read as UTC.
pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// True when `raw` is already in the form this crate writes.
pub fn is_canonical(raw: &str) -> bool {
    DateTime::parse_from_rfc3339(raw).is_ok()
}

/// `deserialize_with` helper for required timestamps.
pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| D::Error::custom(format!("unrecognized timestamp: {raw}")))
}

/// `deserialize_with` helper for optional timestamps.
pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse(&raw)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("unrecognized timestamp: {raw}"))),
        None => Ok(None),
    }
}
