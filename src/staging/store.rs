//! Staging store: bulk copy plus set-based transforms.
//!
//! The copy step appends raw records to the two staging tables inside one
//! transaction per input batch. The transform step is five `INSERT ... SELECT`
//! statements, one per dimensional table. A failed statement aborts the run.

use super::schema::STAGING_TABLES;
use crate::records::{LogEvent, SongRecord};
use crate::sqlite_persistence::recreate_tables;
use crate::warehouse::WAREHOUSE_TABLES;
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use std::path::Path;

/// Latest observed level wins per user. `DISTINCT` alone would leave two
/// rows for a user whose subscription tier changed mid-load, so rank the
/// NextSong events per user by timestamp and keep the newest.
const USERS_INSERT: &str = "
    INSERT INTO users (user_id, first_name, last_name, gender, level)
    SELECT user_id, first_name, last_name, gender, level
    FROM (
        SELECT user_id, first_name, last_name, gender, level,
               ROW_NUMBER() OVER (PARTITION BY user_id ORDER BY ts DESC) AS recency
        FROM staging_events
        WHERE page = 'NextSong' AND user_id IS NOT NULL
    )
    WHERE recency = 1;";

const SONGS_INSERT: &str = "
    INSERT OR IGNORE INTO songs (song_id, title, artist_id, year, duration)
    SELECT DISTINCT song_id, title, artist_id, year, duration
    FROM staging_songs;";

const ARTISTS_INSERT: &str = "
    INSERT OR IGNORE INTO artists (artist_id, name, location, latitude, longitude)
    SELECT DISTINCT artist_id, artist_name, artist_location, artist_latitude, artist_longitude
    FROM staging_songs;";

/// Epoch-millisecond reconstruction plus calendar decomposition in SQL.
/// `%w` numbers weekdays with Sunday = 0; `%W` is the Monday-first week of
/// the year.
const TIME_INSERT: &str = "
    INSERT OR IGNORE INTO time (start_time, hour, day, week, month, year, weekday)
    SELECT start_time,
           CAST(strftime('%H', start_time) AS INTEGER),
           CAST(strftime('%d', start_time) AS INTEGER),
           CAST(strftime('%W', start_time) AS INTEGER),
           CAST(strftime('%m', start_time) AS INTEGER),
           CAST(strftime('%Y', start_time) AS INTEGER),
           CAST(strftime('%w', start_time) AS INTEGER)
    FROM (
        SELECT DISTINCT datetime(ts / 1000, 'unixepoch') AS start_time
        FROM staging_events
        WHERE page = 'NextSong'
    );";

/// Left join keeps unmatched plays, with NULL song/artist keys.
const SONGPLAYS_INSERT: &str = "
    INSERT INTO songplays (start_time, user_id, level, song_id, artist_id,
                           session_id, location, user_agent)
    SELECT DISTINCT datetime(se.ts / 1000, 'unixepoch'),
           se.user_id, se.level, ss.song_id, ss.artist_id,
           se.session_id, se.location, se.user_agent
    FROM staging_events se
    LEFT OUTER JOIN staging_songs ss
      ON se.artist = ss.artist_name
     AND se.song = ss.title
     AND se.length = ss.duration
    WHERE se.page = 'NextSong';";

pub struct StagingStore {
    conn: Connection,
}

impl StagingStore {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path.as_ref())
            .with_context(|| format!("Failed to open staging database {:?}", db_path.as_ref()))?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Drop and recreate the staging tables and the dimensional tables.
    pub fn recreate_schema(&self) -> Result<()> {
        recreate_tables(&self.conn, STAGING_TABLES)?;
        recreate_tables(&self.conn, WAREHOUSE_TABLES)
    }

    /// Bulk-append song records to `staging_songs`.
    pub fn copy_song_records(&mut self, records: &[SongRecord]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO staging_songs (num_songs, artist_id, artist_latitude,
                     artist_longitude, artist_location, artist_name, song_id, title,
                     duration, year)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            for record in records {
                stmt.execute(params![
                    record.num_songs,
                    record.artist_id,
                    record.artist_latitude,
                    record.artist_longitude,
                    record.artist_location,
                    record.artist_name,
                    record.song_id,
                    record.title,
                    record.duration,
                    record.year,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Bulk-append log events to `staging_events`, NextSong or otherwise.
    pub fn copy_log_events(&mut self, events: &[LogEvent]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO staging_events (artist, auth, first_name, gender,
                     item_in_session, last_name, length, level, location, method,
                     page, registration, session_id, song, status, ts, user_agent,
                     user_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                         ?14, ?15, ?16, ?17, ?18)",
            )?;
            for event in events {
                stmt.execute(params![
                    event.artist,
                    event.auth,
                    event.first_name,
                    event.gender,
                    event.item_in_session,
                    event.last_name,
                    event.length,
                    event.level,
                    event.location,
                    event.method,
                    event.page,
                    event.registration,
                    event.session_id,
                    event.song,
                    event.status,
                    event.ts,
                    event.user_agent,
                    event.user_id,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Populate the dimensional tables from the staging tables.
    pub fn transform(&self) -> Result<()> {
        for (table, sql) in [
            ("users", USERS_INSERT),
            ("songs", SONGS_INSERT),
            ("artists", ARTISTS_INSERT),
            ("time", TIME_INSERT),
            ("songplays", SONGPLAYS_INSERT),
        ] {
            self.conn
                .execute(sql, [])
                .with_context(|| format!("Transform into {} failed", table))?;
        }
        Ok(())
    }

    pub fn count_rows(&self, table: &str) -> Result<i64> {
        let count = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))?;
        Ok(count)
    }

    pub fn count_matched_songplays(&self) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM songplays WHERE song_id IS NOT NULL AND artist_id IS NOT NULL",
            [],
            |r| r.get(0),
        )?;
        Ok(count)
    }
}
