//! Partitioned Parquet output.
//!
//! Hive-style layout: one directory per partition key/value pair, a
//! `part-00000.parquet` file per leaf. Table directories are removed and
//! rewritten wholesale each run (overwrite semantics).

use super::schema::{songplays_batch, songs_batch, time_batch};
use super::transform::LakeSongplayRow;
use crate::model::{SongRow, TimeParts};
use anyhow::{Context, Result};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Remove any previous output for `table` and return its fresh directory.
pub fn reset_table_dir(root: &Path, table: &str) -> Result<PathBuf> {
    let dir = root.join(table);
    if dir.exists() {
        fs::remove_dir_all(&dir)
            .with_context(|| format!("Failed to clear output directory {:?}", dir))?;
    }
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create output directory {:?}", dir))?;
    Ok(dir)
}

/// Write one batch as `part-00000.parquet` under `dir`.
pub fn write_batch(dir: &Path, batch: &RecordBatch) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create partition directory {:?}", dir))?;
    let path = dir.join("part-00000.parquet");
    let file =
        File::create(&path).with_context(|| format!("Failed to create output file {:?}", path))?;

    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;
    debug!("Wrote {} rows to {:?}", batch.num_rows(), path);
    Ok(())
}

/// Songs, partitioned by (year, artist_id).
pub fn write_songs(root: &Path, songs: &[SongRow]) -> Result<()> {
    let dir = reset_table_dir(root, "songs")?;

    let mut partitions: BTreeMap<(i32, &str), Vec<&SongRow>> = BTreeMap::new();
    for song in songs {
        partitions
            .entry((song.year, song.artist_id.as_str()))
            .or_default()
            .push(song);
    }
    for ((year, artist_id), rows) in partitions {
        let partition_dir = dir
            .join(format!("year={}", year))
            .join(format!("artist_id={}", artist_id));
        write_batch(&partition_dir, &songs_batch(&rows)?)?;
    }
    Ok(())
}

/// Time, partitioned by (year, month).
pub fn write_time(root: &Path, time: &[TimeParts]) -> Result<()> {
    let dir = reset_table_dir(root, "time")?;

    let mut partitions: BTreeMap<(i32, u32), Vec<&TimeParts>> = BTreeMap::new();
    for parts in time {
        partitions
            .entry((parts.year, parts.month))
            .or_default()
            .push(parts);
    }
    for ((year, month), rows) in partitions {
        let partition_dir = dir
            .join(format!("year={}", year))
            .join(format!("month={}", month));
        write_batch(&partition_dir, &time_batch(&rows)?)?;
    }
    Ok(())
}

/// Songplays, partitioned by (year, month).
pub fn write_songplays(root: &Path, songplays: &[LakeSongplayRow]) -> Result<()> {
    let dir = reset_table_dir(root, "songplays")?;

    let mut partitions: BTreeMap<(i32, u32), Vec<&LakeSongplayRow>> = BTreeMap::new();
    for play in songplays {
        partitions
            .entry((play.year, play.month))
            .or_default()
            .push(play);
    }
    for ((year, month), rows) in partitions {
        let partition_dir = dir
            .join(format!("year={}", year))
            .join(format!("month={}", month));
        write_batch(&partition_dir, &songplays_batch(&rows)?)?;
    }
    Ok(())
}
