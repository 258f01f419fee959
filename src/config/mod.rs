//! Run configuration.
//!
//! Settings come from an optional TOML file with CLI flags taking precedence.
//! The resolved `EtlConfig` is read once at startup and passed by value into
//! each pipeline entry point, no global state.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub song_data_dir: Option<String>,
    pub log_data_dir: Option<String>,
    pub warehouse_db: Option<String>,
    pub staging_db: Option<String>,
    pub lake_output_dir: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

/// CLI-provided values; any `Some` wins over the config file.
#[derive(Debug, Default)]
pub struct ConfigOverrides {
    pub song_data_dir: Option<PathBuf>,
    pub log_data_dir: Option<PathBuf>,
    pub warehouse_db: Option<PathBuf>,
    pub staging_db: Option<PathBuf>,
    pub lake_output_dir: Option<PathBuf>,
}

/// Fully resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct EtlConfig {
    pub song_data_dir: PathBuf,
    pub log_data_dir: PathBuf,
    pub warehouse_db: PathBuf,
    pub staging_db: PathBuf,
    pub lake_output_dir: PathBuf,
}

impl EtlConfig {
    pub fn resolve(file: FileConfig, overrides: ConfigOverrides) -> Self {
        fn pick(over: Option<PathBuf>, file: Option<String>, default: &str) -> PathBuf {
            over.or_else(|| file.map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(default))
        }

        Self {
            song_data_dir: pick(
                overrides.song_data_dir,
                file.song_data_dir,
                "data/song_data",
            ),
            log_data_dir: pick(overrides.log_data_dir, file.log_data_dir, "data/log_data"),
            warehouse_db: pick(overrides.warehouse_db, file.warehouse_db, "songmart.db"),
            staging_db: pick(overrides.staging_db, file.staging_db, "songmart-staging.db"),
            lake_output_dir: pick(overrides.lake_output_dir, file.lake_output_dir, "lake"),
        }
    }
}
