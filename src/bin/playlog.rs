//! CLI binary for the playlog star-schema loader.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::info;

use playlog_etl::{run_load, LoadConfig, Warehouse};

#[derive(Parser)]
#[command(author, version, about = "Star-schema loader for music streaming logs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the warehouse tables if they do not exist.
    Init(DbArgs),
    /// Drop and recreate the warehouse tables.
    Reset(DbArgs),
    /// Load song metadata and event logs into the warehouse.
    Load(LoadArgs),
    /// Report per-table row counts.
    Status(DbArgs),
}

#[derive(Args)]
struct DbArgs {
    /// Database connection string (postgres://… or sqlite://…)
    #[arg(long)]
    dsn: String,
}

#[derive(Args)]
struct LoadArgs {
    /// Database connection string (postgres://… or sqlite://…)
    #[arg(long)]
    dsn: String,

    /// Root directory of song-metadata files.
    #[arg(long, default_value = "data/song_data")]
    song_data: PathBuf,

    /// Root directory of event log files.
    #[arg(long, default_value = "data/log_data")]
    log_data: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init(args) => {
            let warehouse = Warehouse::connect(&args.dsn).await?;
            warehouse.ensure_schema().await?;
            println!("Schema ready.");
        }
        Commands::Reset(args) => {
            let warehouse = Warehouse::connect(&args.dsn).await?;
            warehouse.drop_schema().await?;
            warehouse.ensure_schema().await?;
            println!("Schema reset.");
        }
        Commands::Load(args) => {
            info!("starting load");
            let config = LoadConfig {
                dsn: args.dsn,
                song_data: args.song_data,
                log_data: args.log_data,
            };
            let stats = run_load(&config).await?;
            println!("{}", stats.summary());
        }
        Commands::Status(args) => {
            let warehouse = Warehouse::connect(&args.dsn).await?;
            let counts = warehouse.table_counts().await?;
            println!("songplays: {}", counts.songplays);
            println!("songs:     {}", counts.songs);
            println!("artists:   {}", counts.artists);
            println!("users:     {}", counts.users);
            println!("time:      {}", counts.time);
        }
    }

    Ok(())
}
