//! Raw NDJSON record ingestion.
//!
//! Two source record shapes exist: song metadata files and user-activity log
//! files. Both are newline-delimited JSON, one record per line, spread over a
//! nested directory tree. Files are discovered recursively and parsed in
//! sorted path order so runs are deterministic.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// A song metadata record, one song per line.
#[derive(Debug, Clone, Deserialize)]
pub struct SongRecord {
    pub num_songs: Option<i64>,
    pub artist_id: String,
    pub artist_latitude: Option<f64>,
    pub artist_longitude: Option<f64>,
    pub artist_location: Option<String>,
    pub artist_name: String,
    pub song_id: String,
    pub title: String,
    pub duration: f64,
    pub year: i32,
}

/// A user-activity log event.
///
/// Only `NextSong` events carry a full field set; most fields are optional
/// because auth/navigation events leave them blank.
#[derive(Debug, Clone, Deserialize)]
pub struct LogEvent {
    pub artist: Option<String>,
    pub auth: Option<String>,
    #[serde(rename = "firstName")]
    pub first_name: Option<String>,
    pub gender: Option<String>,
    #[serde(rename = "itemInSession")]
    pub item_in_session: Option<i64>,
    #[serde(rename = "lastName")]
    pub last_name: Option<String>,
    pub length: Option<f64>,
    pub level: Option<String>,
    pub location: Option<String>,
    pub method: Option<String>,
    pub page: String,
    pub registration: Option<f64>,
    #[serde(rename = "sessionId")]
    pub session_id: i64,
    pub song: Option<String>,
    pub status: Option<i64>,
    pub ts: i64,
    #[serde(rename = "userAgent")]
    pub user_agent: Option<String>,
    #[serde(rename = "userId", deserialize_with = "deserialize_user_id", default)]
    pub user_id: Option<i64>,
}

impl LogEvent {
    /// Strict play-event filter: only `NextSong` pages produce dimensional rows.
    pub fn is_next_song(&self) -> bool {
        self.page == "NextSong"
    }
}

/// The source logs serialize user ids inconsistently: as a JSON number, as a
/// numeric string, or as an empty string on anonymous events.
fn deserialize_user_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum UserIdField {
        Number(i64),
        Text(String),
    }

    match Option::<UserIdField>::deserialize(deserializer)? {
        None => Ok(None),
        Some(UserIdField::Number(n)) => Ok(Some(n)),
        Some(UserIdField::Text(s)) if s.is_empty() => Ok(None),
        Some(UserIdField::Text(s)) => s
            .parse::<i64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid user id: {:?}", s))),
    }
}

/// Parse failure for a single NDJSON line, attributed to its file and line.
#[derive(Debug, thiserror::Error)]
#[error("{}:{line}: {source}", .path.display())]
pub struct NdjsonError {
    pub path: PathBuf,
    pub line: usize,
    #[source]
    pub source: serde_json::Error,
}

/// Collect all `*.json` files below `dir`, sorted by path.
pub fn collect_json_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry =
            entry.with_context(|| format!("Failed to walk input directory {:?}", dir))?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == "json")
        {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// Parse one NDJSON file into records, skipping blank lines.
pub fn read_ndjson_file<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<Vec<T>> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Failed to open input file {:?}", path))?;
    let reader = BufReader::new(file);

    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line from {:?}", path))?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|source| NdjsonError {
            path: path.to_path_buf(),
            line: index + 1,
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}

fn load_records<T: DeserializeOwned, P: AsRef<Path>>(dir: P) -> Result<Vec<T>> {
    let files = collect_json_files(&dir)?;
    let mut records = Vec::new();
    for file in &files {
        let mut file_records: Vec<T> = read_ndjson_file(file)?;
        debug!("Read {} records from {:?}", file_records.len(), file);
        records.append(&mut file_records);
    }
    Ok(records)
}

/// Load every song record below `dir`.
pub fn load_song_records<P: AsRef<Path>>(dir: P) -> Result<Vec<SongRecord>> {
    load_records(dir)
}

/// Load every log event below `dir`, NextSong or otherwise.
pub fn load_log_events<P: AsRef<Path>>(dir: P) -> Result<Vec<LogEvent>> {
    load_records(dir)
}
