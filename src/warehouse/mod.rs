//! Row-oriented warehouse load.
//!
//! Reads raw song and log NDJSON files row by row, maps each record to its
//! dimension/fact rows, and issues one parameterized statement per row.
//! Song files load first so play events can resolve song/artist keys against
//! already-loaded data.

mod schema;
mod store;

pub use schema::WAREHOUSE_TABLES;
pub use store::WarehouseStore;

use crate::config::EtlConfig;
use crate::model::{map_play, map_song, TableCounts};
use crate::records::{load_log_events, load_song_records};
use anyhow::Result;
use tracing::info;

/// Run the full pipeline: drop/recreate the schema, load song files, then
/// load log files. The first unrecoverable error aborts the run.
pub fn run(config: &EtlConfig) -> Result<TableCounts> {
    let store = WarehouseStore::open(&config.warehouse_db)?;
    store.recreate_schema()?;

    let song_records = load_song_records(&config.song_data_dir)?;
    info!("Loaded {} song records", song_records.len());
    for record in &song_records {
        let (song, artist) = map_song(record);
        store.insert_song(&song)?;
        store.insert_artist(&artist)?;
    }

    let events = load_log_events(&config.log_data_dir)?;
    info!("Loaded {} log events", events.len());

    let mut matched_plays = 0i64;
    for event in &events {
        let Some((user, time, mut songplay)) = map_play(event) else {
            continue;
        };

        store.upsert_user(&user)?;
        store.insert_time(&time)?;

        // Exact-match lookup against loaded songs; unmatched plays keep
        // NULL song/artist keys.
        if let (Some(song), Some(artist), Some(length)) =
            (&event.song, &event.artist, event.length)
        {
            if let Some((song_id, artist_id)) = store.find_song(song, artist, length)? {
                songplay.song_id = Some(song_id);
                songplay.artist_id = Some(artist_id);
                matched_plays += 1;
            }
        }
        store.insert_songplay(&songplay)?;
    }

    let summary = TableCounts {
        songs: store.count_rows("songs")?,
        artists: store.count_rows("artists")?,
        users: store.count_rows("users")?,
        time: store.count_rows("time")?,
        songplays: store.count_rows("songplays")?,
        matched_plays,
    };
    info!(
        "Warehouse load done: {} songs, {} artists, {} users, {} time rows, {} songplays ({} matched)",
        summary.songs,
        summary.artists,
        summary.users,
        summary.time,
        summary.songplays,
        summary.matched_plays
    );
    Ok(summary)
}
