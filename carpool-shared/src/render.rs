//! Flat, null-safe rendering of optional values for listing projections.
//!
//! Listings render absent dates, times and timestamps as `""` rather than `null`
//! so clients can display every field without checking for missing values.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

pub fn date(value: Option<NaiveDate>) -> String {
    value
        .map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

pub fn time(value: Option<NaiveTime>) -> String {
    value
        .map(|t| t.format(TIME_FORMAT).to_string())
        .unwrap_or_default()
}

pub fn timestamp(value: Option<DateTime<Utc>>) -> String {
    value.map(|t| t.to_rfc3339()).unwrap_or_default()
}

pub fn text(value: Option<&str>) -> String {
    value.map(str::to_owned).unwrap_or_default()
}

/// Parses `YYYY-MM-DD`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

/// Parses `HH:MM`, also accepting `HH:MM:SS` as sent by some time pickers.
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}
