//! Arrow schemas and batch builders for the columnar export.
//!
//! One schema per output table. Partition columns (year, artist_id, month)
//! are kept in the files as well as in the directory names, so each file is
//! readable on its own.

use super::transform::LakeSongplayRow;
use crate::model::{ArtistRow, SongRow, TimeParts, UserRow};
use anyhow::Result;
use arrow::array::{
    ArrayRef, Float64Array, Int32Array, Int64Array, StringArray, TimestampMillisecondArray,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

fn timestamp_ms() -> DataType {
    DataType::Timestamp(TimeUnit::Millisecond, None)
}

pub fn songs_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("song_id", DataType::Utf8, false),
        Field::new("title", DataType::Utf8, false),
        Field::new("artist_id", DataType::Utf8, false),
        Field::new("year", DataType::Int32, false),
        Field::new("duration", DataType::Float64, false),
    ]))
}

pub fn artists_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("artist_id", DataType::Utf8, false),
        Field::new("name", DataType::Utf8, false),
        Field::new("location", DataType::Utf8, true),
        Field::new("latitude", DataType::Float64, true),
        Field::new("longitude", DataType::Float64, true),
    ]))
}

pub fn users_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("user_id", DataType::Int64, false),
        Field::new("first_name", DataType::Utf8, true),
        Field::new("last_name", DataType::Utf8, true),
        Field::new("gender", DataType::Utf8, true),
        Field::new("level", DataType::Utf8, true),
    ]))
}

pub fn time_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("start_time", timestamp_ms(), false),
        Field::new("hour", DataType::Int32, false),
        Field::new("day", DataType::Int32, false),
        Field::new("week", DataType::Int32, false),
        Field::new("month", DataType::Int32, false),
        Field::new("year", DataType::Int32, false),
        Field::new("weekday", DataType::Utf8, false),
    ]))
}

pub fn songplays_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("songplay_id", DataType::Int64, false),
        Field::new("start_time", timestamp_ms(), false),
        Field::new("user_id", DataType::Int64, true),
        Field::new("level", DataType::Utf8, true),
        Field::new("song_id", DataType::Utf8, true),
        Field::new("artist_id", DataType::Utf8, true),
        Field::new("session_id", DataType::Int64, false),
        Field::new("location", DataType::Utf8, true),
        Field::new("user_agent", DataType::Utf8, true),
        Field::new("year", DataType::Int32, false),
        Field::new("month", DataType::Int32, false),
    ]))
}

pub fn songs_batch(rows: &[&SongRow]) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(|r| r.song_id.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(|r| r.title.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(|r| r.artist_id.as_str()),
        )),
        Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.year))),
        Arc::new(Float64Array::from_iter_values(
            rows.iter().map(|r| r.duration),
        )),
    ];
    Ok(RecordBatch::try_new(songs_schema(), columns)?)
}

pub fn artists_batch(rows: &[ArtistRow]) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(|r| r.artist_id.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(|r| r.name.as_str()),
        )),
        Arc::new(StringArray::from_iter(
            rows.iter().map(|r| r.location.as_deref()),
        )),
        Arc::new(Float64Array::from_iter(rows.iter().map(|r| r.latitude))),
        Arc::new(Float64Array::from_iter(rows.iter().map(|r| r.longitude))),
    ];
    Ok(RecordBatch::try_new(artists_schema(), columns)?)
}

pub fn users_batch(rows: &[UserRow]) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(
            rows.iter().map(|r| r.user_id.unwrap_or_default()),
        )),
        Arc::new(StringArray::from_iter(
            rows.iter().map(|r| r.first_name.as_deref()),
        )),
        Arc::new(StringArray::from_iter(
            rows.iter().map(|r| r.last_name.as_deref()),
        )),
        Arc::new(StringArray::from_iter(
            rows.iter().map(|r| r.gender.as_deref()),
        )),
        Arc::new(StringArray::from_iter(
            rows.iter().map(|r| r.level.as_deref()),
        )),
    ];
    Ok(RecordBatch::try_new(users_schema(), columns)?)
}

pub fn time_batch(rows: &[&TimeParts]) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(TimestampMillisecondArray::from_iter_values(
            rows.iter().map(|r| r.start_time.and_utc().timestamp_millis()),
        )),
        Arc::new(Int32Array::from_iter_values(
            rows.iter().map(|r| r.hour as i32),
        )),
        Arc::new(Int32Array::from_iter_values(
            rows.iter().map(|r| r.day as i32),
        )),
        Arc::new(Int32Array::from_iter_values(
            rows.iter().map(|r| r.week as i32),
        )),
        Arc::new(Int32Array::from_iter_values(
            rows.iter().map(|r| r.month as i32),
        )),
        Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.year))),
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(|r| r.weekday_name()),
        )),
    ];
    Ok(RecordBatch::try_new(time_schema(), columns)?)
}

pub fn songplays_batch(rows: &[&LakeSongplayRow]) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(
            rows.iter().map(|r| r.songplay_id),
        )),
        Arc::new(TimestampMillisecondArray::from_iter_values(
            rows.iter()
                .map(|r| r.row.start_time.and_utc().timestamp_millis()),
        )),
        Arc::new(Int64Array::from_iter(rows.iter().map(|r| r.row.user_id))),
        Arc::new(StringArray::from_iter(
            rows.iter().map(|r| r.row.level.as_deref()),
        )),
        Arc::new(StringArray::from_iter(
            rows.iter().map(|r| r.row.song_id.as_deref()),
        )),
        Arc::new(StringArray::from_iter(
            rows.iter().map(|r| r.row.artist_id.as_deref()),
        )),
        Arc::new(Int64Array::from_iter_values(
            rows.iter().map(|r| r.row.session_id),
        )),
        Arc::new(StringArray::from_iter(
            rows.iter().map(|r| r.row.location.as_deref()),
        )),
        Arc::new(StringArray::from_iter(
            rows.iter().map(|r| r.row.user_agent.as_deref()),
        )),
        Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.year))),
        Arc::new(Int32Array::from_iter_values(
            rows.iter().map(|r| r.month as i32),
        )),
    ];
    Ok(RecordBatch::try_new(songplays_schema(), columns)?)
}
