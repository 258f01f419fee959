//! Bulk warehouse load.
//!
//! Raw NDJSON lands unshaped in two staging tables, then five set-based
//! `INSERT ... SELECT` transformations populate the same dimensional schema
//! the row-oriented warehouse uses: dedup via DISTINCT, play resolution via a
//! left join on (artist name, song title, duration), date parts in SQL.

mod schema;
mod store;

pub use schema::STAGING_TABLES;
pub use store::StagingStore;

use crate::config::EtlConfig;
use crate::model::TableCounts;
use crate::records::{load_log_events, load_song_records};
use anyhow::Result;
use tracing::info;

/// Run the full pipeline: recreate schema, bulk-copy both staging tables,
/// then transform into the dimensional tables.
pub fn run(config: &EtlConfig) -> Result<TableCounts> {
    let mut store = StagingStore::open(&config.staging_db)?;
    store.recreate_schema()?;

    let song_records = load_song_records(&config.song_data_dir)?;
    store.copy_song_records(&song_records)?;
    info!("Copied {} song records into staging_songs", song_records.len());

    let events = load_log_events(&config.log_data_dir)?;
    store.copy_log_events(&events)?;
    info!("Copied {} log events into staging_events", events.len());

    store.transform()?;

    let summary = TableCounts {
        songs: store.count_rows("songs")?,
        artists: store.count_rows("artists")?,
        users: store.count_rows("users")?,
        time: store.count_rows("time")?,
        songplays: store.count_rows("songplays")?,
        matched_plays: store.count_matched_songplays()?,
    };
    info!(
        "Staged load done: {} songs, {} artists, {} users, {} time rows, {} songplays ({} matched)",
        summary.songs,
        summary.artists,
        summary.users,
        summary.time,
        summary.songplays,
        summary.matched_plays
    );
    Ok(summary)
}
