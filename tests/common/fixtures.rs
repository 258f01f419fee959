//! Test fixture creation: NDJSON input trees and a config pointing at them.
//!
//! The fixture set covers every interesting load path: matched and unmatched
//! plays, a user whose level changes mid-load, a duplicated song record, a
//! duplicated timestamp, a non-NextSong event, and plays in two different
//! output partitions (November and December 2018).

use super::constants::*;
use anyhow::Result;
use songmart::config::EtlConfig;
use std::fs;
use tempfile::TempDir;

pub struct TestData {
    // Held for its Drop: the directory lives as long as the test does.
    #[allow(dead_code)]
    pub dir: TempDir,
    pub config: EtlConfig,
}

fn song_line(
    song_id: &str,
    title: &str,
    artist_id: &str,
    artist_name: &str,
    duration: f64,
    year: i32,
) -> String {
    format!(
        r#"{{"num_songs": 1, "artist_id": "{artist_id}", "artist_latitude": null, "artist_longitude": null, "artist_location": "", "artist_name": "{artist_name}", "song_id": "{song_id}", "title": "{title}", "duration": {duration}, "year": {year}}}"#
    )
}

#[allow(clippy::too_many_arguments)]
fn play_line(
    user_id: i64,
    first_name: &str,
    last_name: &str,
    gender: &str,
    level: &str,
    ts: i64,
    session_id: i64,
    song: Option<(&str, &str, f64)>,
) -> String {
    let (song, artist, length) = match song {
        Some((title, artist, length)) => (
            format!("\"{}\"", title),
            format!("\"{}\"", artist),
            length.to_string(),
        ),
        None => ("null".to_string(), "null".to_string(), "null".to_string()),
    };
    format!(
        r#"{{"artist": {artist}, "auth": "Logged In", "firstName": "{first_name}", "gender": "{gender}", "itemInSession": 0, "lastName": "{last_name}", "length": {length}, "level": "{level}", "location": "Testville, TX", "method": "PUT", "page": "NextSong", "registration": 1540558108796.0, "sessionId": {session_id}, "song": {song}, "status": 200, "ts": {ts}, "userAgent": "Mozilla/5.0", "userId": "{user_id}"}}"#
    )
}

fn home_page_line(user_id: i64, ts: i64) -> String {
    format!(
        r#"{{"artist": null, "auth": "Logged In", "firstName": "Lily", "gender": "F", "itemInSession": 0, "lastName": "Koch", "length": null, "level": "free", "location": "Testville, TX", "method": "GET", "page": "Home", "registration": 1540558108796.0, "sessionId": 200, "song": null, "status": 200, "ts": {ts}, "userAgent": "Mozilla/5.0", "userId": "{user_id}"}}"#
    )
}

/// Creates the NDJSON input trees and returns a config with every
/// destination routed into the same temp directory.
pub fn create_test_data() -> Result<TestData> {
    let dir = TempDir::new()?;

    let song_data_dir = dir.path().join("song_data");
    fs::create_dir_all(song_data_dir.join("A/A"))?;
    fs::create_dir_all(song_data_dir.join("A/B"))?;
    fs::write(
        song_data_dir.join("A/A/TRAAA001.json"),
        format!(
            "{}\n",
            song_line(
                SONG_1_ID,
                SONG_1_TITLE,
                ARTIST_1_ID,
                ARTIST_1_NAME,
                SONG_1_DURATION,
                2000,
            )
        ),
    )?;
    // The same song again, in a second file: loads must stay idempotent.
    fs::write(
        song_data_dir.join("A/A/TRAAA002.json"),
        format!(
            "{}\n",
            song_line(
                SONG_1_ID,
                SONG_1_TITLE,
                ARTIST_1_ID,
                ARTIST_1_NAME,
                SONG_1_DURATION,
                2000,
            )
        ),
    )?;
    fs::write(
        song_data_dir.join("A/B/TRAAB001.json"),
        format!(
            "{}\n",
            song_line(
                SONG_2_ID,
                SONG_2_TITLE,
                ARTIST_2_ID,
                ARTIST_2_NAME,
                SONG_2_DURATION,
                0,
            )
        ),
    )?;

    let log_data_dir = dir.path().join("log_data");
    fs::create_dir_all(log_data_dir.join("2018/11"))?;
    let events = [
        play_line(
            USER_1_ID,
            "Jacob",
            "Klein",
            "M",
            "free",
            TS_NOVEMBER_1,
            100,
            Some((SONG_1_TITLE, ARTIST_1_NAME, SONG_1_DURATION)),
        ),
        play_line(
            USER_1_ID,
            "Jacob",
            "Klein",
            "M",
            "paid",
            TS_NOVEMBER_2,
            101,
            Some(("Phantom Track", "Unknown Artist", 99.9)),
        ),
        play_line(
            USER_2_ID,
            "Lily",
            "Koch",
            "F",
            "free",
            TS_NOVEMBER_2,
            102,
            Some((SONG_2_TITLE, ARTIST_2_NAME, SONG_2_DURATION)),
        ),
        play_line(
            USER_2_ID,
            "Lily",
            "Koch",
            "F",
            "free",
            TS_DECEMBER,
            102,
            None,
        ),
        home_page_line(USER_2_ID, TS_DECEMBER),
    ];
    fs::write(
        log_data_dir.join("2018/11/2018-11-events.json"),
        events.join("\n") + "\n",
    )?;

    let config = EtlConfig {
        song_data_dir,
        log_data_dir,
        warehouse_db: dir.path().join("warehouse.db"),
        staging_db: dir.path().join("staging.db"),
        lake_output_dir: dir.path().join("lake"),
    };
    Ok(TestData { dir, config })
}
