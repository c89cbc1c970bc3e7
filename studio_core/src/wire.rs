//! Boundary parsing for ISO-8601 dates and instants.
//!
//! Everything crosses the JSON/CLI boundary as text. Inside the crate all
//! instants are `NaiveDateTime` in the studio's single implicit timezone.

use crate::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer};

const DATE_FORMAT: &str = "%Y-%m-%d";
const INSTANT_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a calendar date. Accepts a bare `YYYY-MM-DD` or a full instant,
/// in which case only the calendar day is kept.
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    let text = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, DATE_FORMAT) {
        return Ok(date);
    }
    parse_instant(text).map(|instant| instant.date())
}

/// Parse an instant. A bare date means midnight of that day.
pub fn parse_instant(text: &str) -> Result<NaiveDateTime> {
    let text = text.trim();
    // Trailing zone markers are dropped: the studio runs on one implicit zone.
    let local = text.strip_suffix('Z').unwrap_or(text);

    for format in INSTANT_FORMATS {
        if let Ok(instant) = NaiveDateTime::parse_from_str(local, format) {
            return Ok(instant);
        }
    }

    NaiveDate::parse_from_str(local, DATE_FORMAT)
        .map(|date| date.and_time(NaiveTime::MIN))
        .map_err(|_| Error::InvalidDate(text.to_string()))
}

/// Parse a time of day, `HH:MM` or `HH:MM:SS`.
pub fn parse_time(text: &str) -> Result<NaiveTime> {
    let text = text.trim();
    NaiveTime::parse_from_str(text, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M:%S"))
        .map_err(|_| Error::InvalidDate(text.to_string()))
}

pub(crate) fn deserialize_instant<'de, D>(deserializer: D) -> std::result::Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_instant(&text).map_err(serde::de::Error::custom)
}

pub(crate) fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(text) if !text.trim().is_empty() => parse_date(&text)
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}
