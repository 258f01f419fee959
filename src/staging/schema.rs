//! Staging tables for the bulk warehouse load.
//!
//! One flat table per source record shape, one column per source field,
//! everything nullable: the bulk copy lands raw records as-is and all
//! shaping happens in the set-based transform afterwards.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table};

const STAGING_EVENTS_TABLE: Table = Table {
    name: "staging_events",
    columns: &[
        sqlite_column!("artist", &SqlType::Text),
        sqlite_column!("auth", &SqlType::Text),
        sqlite_column!("first_name", &SqlType::Text),
        sqlite_column!("gender", &SqlType::Text),
        sqlite_column!("item_in_session", &SqlType::Integer),
        sqlite_column!("last_name", &SqlType::Text),
        sqlite_column!("length", &SqlType::Real),
        sqlite_column!("level", &SqlType::Text),
        sqlite_column!("location", &SqlType::Text),
        sqlite_column!("method", &SqlType::Text),
        sqlite_column!("page", &SqlType::Text),
        sqlite_column!("registration", &SqlType::Real),
        sqlite_column!("session_id", &SqlType::Integer),
        sqlite_column!("song", &SqlType::Text),
        sqlite_column!("status", &SqlType::Integer),
        sqlite_column!("ts", &SqlType::Integer),
        sqlite_column!("user_agent", &SqlType::Text),
        sqlite_column!("user_id", &SqlType::Integer),
    ],
    indices: &[("idx_staging_events_page", "page")],
};

const STAGING_SONGS_TABLE: Table = Table {
    name: "staging_songs",
    columns: &[
        sqlite_column!("num_songs", &SqlType::Integer),
        sqlite_column!("artist_id", &SqlType::Text),
        sqlite_column!("artist_latitude", &SqlType::Real),
        sqlite_column!("artist_longitude", &SqlType::Real),
        sqlite_column!("artist_location", &SqlType::Text),
        sqlite_column!("artist_name", &SqlType::Text),
        sqlite_column!("song_id", &SqlType::Text),
        sqlite_column!("title", &SqlType::Text),
        sqlite_column!("duration", &SqlType::Real),
        sqlite_column!("year", &SqlType::Integer),
    ],
    indices: &[("idx_staging_songs_title", "title")],
};

pub const STAGING_TABLES: &[Table] = &[STAGING_EVENTS_TABLE, STAGING_SONGS_TABLE];
