//! Time dimension derivation.
//!
//! Event logs carry timestamps as milliseconds since the Unix epoch. Each
//! distinct timestamp becomes one row in the `time` dimension with its
//! calendar fields broken out for analytical grouping.

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};

/// One derived row for the `time` dimension table.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeRow {
    /// Event timestamp, the dimension's primary key
    pub start_time: DateTime<Utc>,
    /// Hour of day (0-23)
    pub hour: i32,
    /// Day of month (1-31)
    pub day: i32,
    /// ISO week of year (1-53)
    pub week: i32,
    /// Month (1-12)
    pub month: i32,
    /// Calendar year
    pub year: i32,
    /// Weekday name ("Monday".."Sunday")
    pub weekday: String,
}

impl TimeRow {
    /// Derive the full time-dimension row from an event timestamp in
    /// milliseconds since the Unix epoch.
    pub fn from_event_millis(ts: i64) -> Self {
        let start_time = millis_to_datetime(ts);
        TimeRow {
            start_time,
            hour: start_time.hour() as i32,
            day: start_time.day() as i32,
            week: start_time.iso_week().week() as i32,
            month: start_time.month() as i32,
            year: start_time.year(),
            weekday: start_time.format("%A").to_string(),
        }
    }
}

/// Convert milliseconds since the Unix epoch to a UTC datetime.
pub fn millis_to_datetime(ts: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ts)
        .single()
        .unwrap_or_else(|| Utc.timestamp_millis_opt(0).single().expect("unix epoch"))
}
