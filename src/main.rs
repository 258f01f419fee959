use anyhow::Result;
use clap::{Parser, Subcommand};
use songmart::config::{ConfigOverrides, EtlConfig, FileConfig};
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "songmart", version, about = "Batch ETL for song-play logs")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,

    /// Path to a TOML config file.
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Directory containing song metadata NDJSON files.
    #[clap(long, global = true)]
    song_data: Option<PathBuf>,

    /// Directory containing activity log NDJSON files.
    #[clap(long, global = true)]
    log_data: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Row-oriented load: one parameterized statement per mapped row.
    Warehouse {
        /// Path to the destination SQLite database file.
        #[clap(long)]
        db: Option<PathBuf>,
    },
    /// Bulk load via staging tables and set-based SQL transforms.
    Staging {
        /// Path to the destination SQLite database file.
        #[clap(long)]
        db: Option<PathBuf>,
    },
    /// Partitioned Parquet export.
    Lake {
        /// Output directory for the partitioned table trees.
        #[clap(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    info!(
        "songmart {}-{}",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH")
    );

    let file_config = match &cli_args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let mut overrides = ConfigOverrides {
        song_data_dir: cli_args.song_data.clone(),
        log_data_dir: cli_args.log_data.clone(),
        ..Default::default()
    };

    match cli_args.command {
        Command::Warehouse { db } => {
            overrides.warehouse_db = db;
            let config = EtlConfig::resolve(file_config, overrides);
            songmart::warehouse::run(&config)?;
        }
        Command::Staging { db } => {
            overrides.staging_db = db;
            let config = EtlConfig::resolve(file_config, overrides);
            songmart::staging::run(&config)?;
        }
        Command::Lake { output } => {
            overrides.lake_output_dir = output;
            let config = EtlConfig::resolve(file_config, overrides);
            songmart::lake::run(&config)?;
        }
    }
    Ok(())
}
