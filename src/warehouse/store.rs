//! Row-oriented warehouse store.
//!
//! One parameterized statement per mapped row. Write policies per table:
//! insert-or-ignore for songs and artists, upsert-with-overwrite for users
//! (latest `level` wins), insert-or-ignore for time (keyed on start_time),
//! plain append for songplays. Constraint violations are not caught here,
//! they abort the run.

use super::schema::WAREHOUSE_TABLES;
use crate::model::{ArtistRow, SongRow, SongplayRow, TimeParts, UserRow, START_TIME_FORMAT};
use crate::sqlite_persistence::recreate_tables;
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use std::path::Path;

pub struct WarehouseStore {
    conn: Connection,
}

impl WarehouseStore {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path.as_ref())
            .with_context(|| format!("Failed to open warehouse database {:?}", db_path.as_ref()))?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Drop and recreate all five dimensional tables.
    pub fn recreate_schema(&self) -> Result<()> {
        recreate_tables(&self.conn, WAREHOUSE_TABLES)
    }

    pub fn insert_song(&self, song: &SongRow) -> Result<()> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT OR IGNORE INTO songs (song_id, title, artist_id, year, duration)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        stmt.execute(params![
            song.song_id,
            song.title,
            song.artist_id,
            song.year,
            song.duration
        ])?;
        Ok(())
    }

    pub fn insert_artist(&self, artist: &ArtistRow) -> Result<()> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT OR IGNORE INTO artists (artist_id, name, location, latitude, longitude)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        stmt.execute(params![
            artist.artist_id,
            artist.name,
            artist.location,
            artist.latitude,
            artist.longitude
        ])?;
        Ok(())
    }

    /// Insert the user, or refresh `level` if the user already exists. A
    /// user's most recently observed subscription tier wins.
    pub fn upsert_user(&self, user: &UserRow) -> Result<()> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO users (user_id, first_name, last_name, gender, level)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(user_id) DO UPDATE SET level = excluded.level",
        )?;
        stmt.execute(params![
            user.user_id,
            user.first_name,
            user.last_name,
            user.gender,
            user.level
        ])?;
        Ok(())
    }

    pub fn insert_time(&self, time: &TimeParts) -> Result<()> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT OR IGNORE INTO time (start_time, hour, day, week, month, year, weekday)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        stmt.execute(params![
            time.start_time.format(START_TIME_FORMAT).to_string(),
            time.hour,
            time.day,
            time.week,
            time.month,
            time.year,
            time.weekday_number(),
        ])?;
        Ok(())
    }

    pub fn insert_songplay(&self, songplay: &SongplayRow) -> Result<()> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO songplays (start_time, user_id, level, song_id, artist_id, session_id, location, user_agent)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        stmt.execute(params![
            songplay.start_time.format(START_TIME_FORMAT).to_string(),
            songplay.user_id,
            songplay.level,
            songplay.song_id,
            songplay.artist_id,
            songplay.session_id,
            songplay.location,
            songplay.user_agent,
        ])?;
        Ok(())
    }

    /// Resolve a play against loaded songs: exact match on title, artist name
    /// and duration. Returns the (song_id, artist_id) pair, or `None` when no
    /// loaded song matches.
    pub fn find_song(
        &self,
        title: &str,
        artist_name: &str,
        duration: f64,
    ) -> Result<Option<(String, String)>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT s.song_id, s.artist_id
             FROM songs s
             INNER JOIN artists a ON s.artist_id = a.artist_id
             WHERE s.title = ?1
               AND a.name = ?2
               AND s.duration = ?3",
        )?;
        match stmt.query_row(params![title, artist_name, duration], |row| {
            Ok((row.get(0)?, row.get(1)?))
        }) {
            Ok(pair) => Ok(Some(pair)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn count_rows(&self, table: &str) -> Result<i64> {
        let count = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::map_song;
    use crate::records::SongRecord;

    fn create_test_store() -> WarehouseStore {
        let store = WarehouseStore::open_in_memory().unwrap();
        store.recreate_schema().unwrap();
        store
    }

    fn test_song_record() -> SongRecord {
        serde_json::from_str(
            r#"{"num_songs":1,"artist_id":"AR1","artist_latitude":null,
                "artist_longitude":null,"artist_location":"Memphis, TN",
                "artist_name":"Artist A","song_id":"S1","title":"Song A",
                "duration":210.5,"year":2000}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_insert_song_twice_leaves_one_row() {
        let store = create_test_store();
        let (song, artist) = map_song(&test_song_record());

        store.insert_song(&song).unwrap();
        store.insert_artist(&artist).unwrap();
        store.insert_song(&song).unwrap();
        store.insert_artist(&artist).unwrap();

        assert_eq!(store.count_rows("songs").unwrap(), 1);
        assert_eq!(store.count_rows("artists").unwrap(), 1);
    }

    #[test]
    fn test_upsert_user_level_last_write_wins() {
        let store = create_test_store();
        let mut user = UserRow {
            user_id: Some(7),
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            gender: Some("F".to_string()),
            level: Some("free".to_string()),
        };
        store.upsert_user(&user).unwrap();

        user.level = Some("paid".to_string());
        store.upsert_user(&user).unwrap();

        assert_eq!(store.count_rows("users").unwrap(), 1);
        let level: String = store
            .conn
            .query_row("SELECT level FROM users WHERE user_id = 7", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(level, "paid");
    }

    #[test]
    fn test_find_song_requires_exact_match() {
        let store = create_test_store();
        let (song, artist) = map_song(&test_song_record());
        store.insert_song(&song).unwrap();
        store.insert_artist(&artist).unwrap();

        assert_eq!(
            store.find_song("Song A", "Artist A", 210.5).unwrap(),
            Some(("S1".to_string(), "AR1".to_string()))
        );
        assert_eq!(store.find_song("Song A", "Artist A", 210.6).unwrap(), None);
        assert_eq!(store.find_song("Song A", "Artist B", 210.5).unwrap(), None);
    }

    #[test]
    fn test_insert_time_dedupes_on_start_time() {
        let store = create_test_store();
        let time = TimeParts::from_epoch_ms(1_542_285_000_000).unwrap();

        store.insert_time(&time).unwrap();
        store.insert_time(&time).unwrap();

        assert_eq!(store.count_rows("time").unwrap(), 1);
    }

    #[test]
    fn test_incomplete_user_fails_constraint() {
        let store = create_test_store();
        let user = UserRow {
            user_id: Some(7),
            first_name: None,
            last_name: Some("Lovelace".to_string()),
            gender: Some("F".to_string()),
            level: Some("free".to_string()),
        };
        assert!(store.upsert_user(&user).is_err());
    }
}
