//! Source record types and NDJSON parsing.
//!
//! Two kinds of input files feed the warehouse: song metadata files holding a
//! single JSON record each, and event log files holding one JSON record per
//! line. Both are newline-delimited JSON; parsing failures surface the file
//! path and line number.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{EtlError, EtlResult};

/// One song-metadata record as it appears on disk.
///
/// Carries both the song fields and the denormalized artist fields; the
/// loaders split it across the `songs` and `artists` dimensions.
#[derive(Debug, Clone, Deserialize)]
pub struct SongRecord {
    /// Catalog identifier for the song
    pub song_id: String,
    /// Song title
    #[serde(default)]
    pub title: Option<String>,
    /// Catalog identifier for the artist
    #[serde(default)]
    pub artist_id: Option<String>,
    /// Release year (0 when unknown in the source data)
    #[serde(default)]
    pub year: Option<i32>,
    /// Track length in seconds
    #[serde(default)]
    pub duration: Option<f64>,
    /// Artist display name
    #[serde(default)]
    pub artist_name: Option<String>,
    /// Artist home location
    #[serde(default)]
    pub artist_location: Option<String>,
    /// Artist latitude
    #[serde(default)]
    pub artist_latitude: Option<f64>,
    /// Artist longitude
    #[serde(default)]
    pub artist_longitude: Option<f64>,
}

/// One playback event record from a log file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    /// Page that generated the event; only "NextSong" events are loaded
    #[serde(default)]
    pub page: Option<String>,
    /// Event timestamp in milliseconds since the Unix epoch
    pub ts: i64,
    /// User identifier; logged-out events carry an empty string
    #[serde(default, deserialize_with = "flexible_user_id")]
    pub user_id: Option<i64>,
    /// User first name
    #[serde(default)]
    pub first_name: Option<String>,
    /// User last name
    #[serde(default)]
    pub last_name: Option<String>,
    /// User gender
    #[serde(default)]
    pub gender: Option<String>,
    /// Subscription level at event time ("free" or "paid")
    #[serde(default)]
    pub level: Option<String>,
    /// Played song title
    #[serde(default)]
    pub song: Option<String>,
    /// Played artist name
    #[serde(default)]
    pub artist: Option<String>,
    /// Played track length in seconds
    #[serde(default)]
    pub length: Option<f64>,
    /// Listening session identifier
    #[serde(default)]
    pub session_id: Option<i64>,
    /// User location string
    #[serde(default)]
    pub location: Option<String>,
    /// Browser user agent
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl LogEvent {
    /// Whether this event records a song being played.
    pub fn is_next_song(&self) -> bool {
        self.page.as_deref() == Some("NextSong")
    }

    /// Replace empty-string field values with `None`.
    pub fn normalize(&mut self) {
        for field in [
            &mut self.page,
            &mut self.first_name,
            &mut self.last_name,
            &mut self.gender,
            &mut self.level,
            &mut self.song,
            &mut self.artist,
            &mut self.location,
            &mut self.user_agent,
        ] {
            if matches!(field.as_deref(), Some("")) {
                *field = None;
            }
        }
    }
}

/// One deduplicated row destined for the `users` dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRow {
    /// User identifier
    pub user_id: i64,
    /// First name as seen on the user's retained event
    pub first_name: Option<String>,
    /// Last name as seen on the user's retained event
    pub last_name: Option<String>,
    /// Gender as seen on the user's retained event
    pub gender: Option<String>,
    /// Subscription level as seen on the user's retained event
    pub level: Option<String>,
}

/// The source file format allows `userId` to arrive as a JSON number, a
/// numeric string, or an empty string for logged-out events.
fn flexible_user_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().parse().ok(),
        _ => None,
    })
}

/// Parse a song-metadata file.
///
/// Each song file is expected to hold exactly one record; only the first
/// non-empty line is used when more are present.
pub fn parse_song_file(path: &Path) -> EtlResult<SongRecord> {
    let contents = fs::read_to_string(path)?;
    let line = contents
        .lines()
        .find(|line| !line.trim().is_empty())
        .ok_or_else(|| EtlError::ParseError(format!("{}: no records found", path.display())))?;
    serde_json::from_str(line)
        .map_err(|e| EtlError::ParseError(format!("{}: {}", path.display(), e)))
}

/// Parse an event log file into its full list of records.
pub fn parse_log_file(path: &Path) -> EtlResult<Vec<LogEvent>> {
    let contents = fs::read_to_string(path)?;
    let mut events = Vec::new();
    for (line_num, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let event: LogEvent = serde_json::from_str(line).map_err(|e| {
            EtlError::ParseError(format!("{} line {}: {}", path.display(), line_num + 1, e))
        })?;
        events.push(event);
    }
    Ok(events)
}

/// Filter events to song plays and normalize empty-string fields, preserving
/// input order.
pub fn next_song_events(events: Vec<LogEvent>) -> Vec<LogEvent> {
    events
        .into_iter()
        .filter(LogEvent::is_next_song)
        .map(|mut event| {
            event.normalize();
            event
        })
        .collect()
}

/// Reduce events to one row per user, keeping the most recent by timestamp.
///
/// Events are sorted ascending by `ts` with a stable sort, so for equal
/// timestamps the later record in input order wins. Events without a user id
/// are dropped. Returned rows are ordered by user id.
pub fn latest_user_rows(events: &[LogEvent]) -> Vec<UserRow> {
    let mut by_ts: Vec<&LogEvent> = events.iter().collect();
    by_ts.sort_by_key(|event| event.ts);

    let mut latest: BTreeMap<i64, UserRow> = BTreeMap::new();
    for event in by_ts {
        let Some(user_id) = event.user_id else {
            continue;
        };
        latest.insert(
            user_id,
            UserRow {
                user_id,
                first_name: event.first_name.clone(),
                last_name: event.last_name.clone(),
                gender: event.gender.clone(),
                level: event.level.clone(),
            },
        );
    }
    latest.into_values().collect()
}
