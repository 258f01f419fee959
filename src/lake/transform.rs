//! Pure table-building transforms for the columnar export.
//!
//! The same logical mapping as the warehouse load, expressed as explicit
//! projection/join/dedup functions over in-memory record batches. Nothing
//! here touches storage; the writer handles partition layout.

use crate::model::{map_play, map_song, ArtistRow, SongRow, SongplayRow, TimeParts, UserRow};
use crate::records::{LogEvent, SongRecord};
use std::collections::{HashMap, HashSet};

/// Fact row enriched with its partition columns and surrogate key.
#[derive(Debug, Clone, PartialEq)]
pub struct LakeSongplayRow {
    pub songplay_id: i64,
    pub row: SongplayRow,
    pub year: i32,
    pub month: u32,
}

/// All five output tables, built in one pass over the raw records.
#[derive(Debug, Default)]
pub struct LakeTables {
    pub songs: Vec<SongRow>,
    pub artists: Vec<ArtistRow>,
    pub users: Vec<UserRow>,
    pub time: Vec<TimeParts>,
    pub songplays: Vec<LakeSongplayRow>,
}

/// Surrogate ids: strictly increasing, unique, and deliberately
/// non-contiguous: the id space is chunked so each partition of rows gets
/// its own range, the way a distributed engine would hand them out.
pub(crate) const ID_PARTITION_SHIFT: u32 = 33;
pub(crate) const ID_PARTITION_ROWS: usize = 8192;

pub(crate) fn surrogate_ids(count: usize, rows_per_partition: usize) -> Vec<i64> {
    (0..count)
        .map(|index| {
            let partition = (index / rows_per_partition) as i64;
            let offset = (index % rows_per_partition) as i64;
            (partition << ID_PARTITION_SHIFT) | offset
        })
        .collect()
}

/// Songs table: exact projection of song records, first-seen song_id wins.
pub fn build_songs(records: &[SongRecord]) -> Vec<SongRow> {
    let mut seen = HashSet::new();
    records
        .iter()
        .map(|record| map_song(record).0)
        .filter(|song| seen.insert(song.song_id.clone()))
        .collect()
}

/// Artists table: exact projection, first-seen artist_id wins.
pub fn build_artists(records: &[SongRecord]) -> Vec<ArtistRow> {
    let mut seen = HashSet::new();
    records
        .iter()
        .map(|record| map_song(record).1)
        .filter(|artist| seen.insert(artist.artist_id.clone()))
        .collect()
}

/// Users table: one row per user_id, keeping the level of the latest
/// NextSong event (last-write-wins, same as the warehouse upsert).
pub fn build_users(events: &[LogEvent]) -> Vec<UserRow> {
    let mut latest: HashMap<i64, (i64, UserRow)> = HashMap::new();
    for event in events.iter().filter(|e| e.is_next_song()) {
        let Some(user_id) = event.user_id else {
            continue;
        };
        let Some((user, _, _)) = map_play(event) else {
            continue;
        };
        match latest.get(&user_id) {
            Some((ts, _)) if *ts >= event.ts => {}
            _ => {
                latest.insert(user_id, (event.ts, user));
            }
        }
    }
    let mut users: Vec<_> = latest.into_values().map(|(_, user)| user).collect();
    users.sort_by_key(|user| user.user_id);
    users
}

/// Time table: calendar decomposition of each distinct NextSong timestamp.
pub fn build_time(events: &[LogEvent]) -> Vec<TimeParts> {
    let mut seen = HashSet::new();
    let mut time = Vec::new();
    for event in events.iter().filter(|e| e.is_next_song()) {
        if !seen.insert(event.ts) {
            continue;
        }
        if let Some(parts) = TimeParts::from_epoch_ms(event.ts) {
            time.push(parts);
        }
    }
    time
}

/// Key for the play-resolution join: exact match on title, artist name and
/// duration (compared bitwise, as SQL float equality would).
fn song_key(title: &str, artist_name: &str, duration: f64) -> (String, String, u64) {
    (title.to_string(), artist_name.to_string(), duration.to_bits())
}

/// Songplays fact table: NextSong events enriched against the song records
/// by hash join. Unmatched plays are retained with NULL song/artist keys.
pub fn build_songplays(records: &[SongRecord], events: &[LogEvent]) -> Vec<LakeSongplayRow> {
    let lookup: HashMap<(String, String, u64), (String, String)> = records
        .iter()
        .map(|record| {
            (
                song_key(&record.title, &record.artist_name, record.duration),
                (record.song_id.clone(), record.artist_id.clone()),
            )
        })
        .collect();

    let plays: Vec<(TimeParts, SongplayRow, &LogEvent)> = events
        .iter()
        .filter_map(|event| map_play(event).map(|(_, time, play)| (time, play, event)))
        .collect();

    let ids = surrogate_ids(plays.len(), ID_PARTITION_ROWS);
    plays
        .into_iter()
        .zip(ids)
        .map(|((time, mut row, event), songplay_id)| {
            if let (Some(song), Some(artist), Some(length)) =
                (&event.song, &event.artist, event.length)
            {
                if let Some((song_id, artist_id)) = lookup.get(&song_key(song, artist, length)) {
                    row.song_id = Some(song_id.clone());
                    row.artist_id = Some(artist_id.clone());
                }
            }
            LakeSongplayRow {
                songplay_id,
                row,
                year: time.year,
                month: time.month,
            }
        })
        .collect()
}

/// Build all five tables from the raw record sets.
pub fn build_tables(records: &[SongRecord], events: &[LogEvent]) -> LakeTables {
    LakeTables {
        songs: build_songs(records),
        artists: build_artists(records),
        users: build_users(events),
        time: build_time(events),
        songplays: build_songplays(records, events),
    }
}
