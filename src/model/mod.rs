//! Dimensional row types and the record-to-row mapper.
//!
//! The star schema is shared by every pipeline: a `songplays` fact table
//! referencing `users`, `songs`, `artists` and `time` dimensions. Mapping a
//! raw record to rows is a pure function; resolving song/artist foreign keys
//! against already-loaded data is the loader's job, so `SongplayRow` leaves
//! them unset here.

use crate::records::{LogEvent, SongRecord};
use chrono::{DateTime, Datelike, NaiveDateTime, Timelike, Weekday};

/// Timestamp format used by the row-oriented warehouse (keeps milliseconds).
pub const START_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

#[derive(Debug, Clone, PartialEq)]
pub struct SongRow {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    pub year: i32,
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArtistRow {
    pub artist_id: String,
    pub name: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Missing fields stay `None` so the destination's NOT NULL constraints are
/// what rejects an incomplete event, not the mapper.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRow {
    pub user_id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SongplayRow {
    pub start_time: NaiveDateTime,
    pub user_id: Option<i64>,
    pub level: Option<String>,
    pub song_id: Option<String>,
    pub artist_id: Option<String>,
    pub session_id: i64,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

/// Row counts after a completed pipeline run, one per destination table.
/// `matched_plays` counts fact rows whose song/artist keys resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableCounts {
    pub songs: i64,
    pub artists: i64,
    pub users: i64,
    pub time: i64,
    pub songplays: i64,
    pub matched_plays: i64,
}

/// Calendar decomposition of one event timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeParts {
    pub start_time: NaiveDateTime,
    pub hour: u32,
    pub day: u32,
    pub week: u32,
    pub month: u32,
    pub year: i32,
    pub weekday: Weekday,
}

impl TimeParts {
    /// Decompose an epoch-millisecond timestamp. Returns `None` only for
    /// timestamps outside the representable calendar range.
    pub fn from_epoch_ms(ms: i64) -> Option<Self> {
        let start_time = DateTime::from_timestamp_millis(ms)?.naive_utc();
        Some(Self {
            start_time,
            hour: start_time.hour(),
            day: start_time.day(),
            week: start_time.iso_week().week(),
            month: start_time.month(),
            year: start_time.year(),
            weekday: start_time.weekday(),
        })
    }

    /// Weekday numbered with Sunday = 0, the warehouse convention.
    pub fn weekday_number(&self) -> u32 {
        self.weekday.num_days_from_sunday()
    }

    /// Full English day name, the columnar-output convention.
    pub fn weekday_name(&self) -> &'static str {
        match self.weekday {
            Weekday::Mon => "Monday",
            Weekday::Tue => "Tuesday",
            Weekday::Wed => "Wednesday",
            Weekday::Thu => "Thursday",
            Weekday::Fri => "Friday",
            Weekday::Sat => "Saturday",
            Weekday::Sun => "Sunday",
        }
    }
}

/// Project a song record into its songs and artists rows. Straight field
/// projection, no transformation.
pub fn map_song(record: &SongRecord) -> (SongRow, ArtistRow) {
    let song = SongRow {
        song_id: record.song_id.clone(),
        title: record.title.clone(),
        artist_id: record.artist_id.clone(),
        year: record.year,
        duration: record.duration,
    };
    let artist = ArtistRow {
        artist_id: record.artist_id.clone(),
        name: record.artist_name.clone(),
        location: record.artist_location.clone(),
        latitude: record.artist_latitude,
        longitude: record.artist_longitude,
    };
    (song, artist)
}

/// Map one NextSong event to its user, time and songplay rows.
///
/// Returns `None` for events that are not NextSong plays, and for timestamps
/// that cannot be represented as a calendar time.
pub fn map_play(event: &LogEvent) -> Option<(UserRow, TimeParts, SongplayRow)> {
    if !event.is_next_song() {
        return None;
    }
    let time = TimeParts::from_epoch_ms(event.ts)?;

    let user = UserRow {
        user_id: event.user_id,
        first_name: event.first_name.clone(),
        last_name: event.last_name.clone(),
        gender: event.gender.clone(),
        level: event.level.clone(),
    };
    let songplay = SongplayRow {
        start_time: time.start_time,
        user_id: event.user_id,
        level: event.level.clone(),
        song_id: None,
        artist_id: None,
        session_id: event.session_id,
        location: event.location.clone(),
        user_agent: event.user_agent.clone(),
    };
    Some((user, time, songplay))
}
