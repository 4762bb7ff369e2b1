//! Batch driver: walks the source trees and loads every file.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::db::Warehouse;
use crate::error::EtlResult;
use crate::progress::LoadProgress;
use crate::walker;

/// Configuration for a full load run.
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Database connection string
    pub dsn: String,
    /// Root directory of song-metadata files
    pub song_data: PathBuf,
    /// Root directory of event log files
    pub log_data: PathBuf,
}

/// Counters accumulated over one load run.
#[derive(Debug, Clone, Default)]
pub struct LoadStats {
    /// Song files processed
    pub song_files: u64,
    /// Log files processed
    pub log_files: u64,
    /// Song rows offered to the `songs` dimension
    pub songs: u64,
    /// Artist rows offered to the `artists` dimension
    pub artists: u64,
    /// User rows upserted
    pub users: u64,
    /// Time rows offered to the `time` dimension
    pub time_rows: u64,
    /// Fact rows appended to `songplays`
    pub songplays: u64,
    /// Songplays whose song/artist ids resolved against the catalog
    pub resolved_plays: u64,
    /// Songplays left with null song/artist ids
    pub unresolved_plays: u64,
}

impl LoadStats {
    /// Total number of files processed.
    pub fn files_processed(&self) -> u64 {
        self.song_files + self.log_files
    }

    /// Get human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "Loaded {} song files and {} log files: {} songplays ({} resolved, {} unresolved), {} users",
            self.song_files,
            self.log_files,
            self.songplays,
            self.resolved_plays,
            self.unresolved_plays,
            self.users
        )
    }
}

enum FileKind {
    Song,
    Log,
}

/// Run a full load: connect, ensure the schema exists, then load every song
/// file followed by every log file.
pub async fn run_load(config: &LoadConfig) -> EtlResult<LoadStats> {
    let warehouse = Warehouse::connect(&config.dsn).await?;
    warehouse.ensure_schema().await?;

    let mut stats = LoadStats::default();
    process_directory(&warehouse, &config.song_data, FileKind::Song, &mut stats).await?;
    process_directory(&warehouse, &config.log_data, FileKind::Log, &mut stats).await?;

    info!("load complete: {}", stats.summary());
    Ok(stats)
}

/// Process every `*.json` file under `root`, committing after each file.
///
/// Fails fast: the first file that cannot be parsed or loaded aborts the run,
/// and that file's transaction is rolled back.
async fn process_directory(
    warehouse: &Warehouse,
    root: &Path,
    kind: FileKind,
    stats: &mut LoadStats,
) -> EtlResult<()> {
    let files = walker::discover_json_files(root)?;
    let progress = LoadProgress::new(files.len() as u64);
    progress.println(format!("{} files found in {}", files.len(), root.display()));

    for (i, file) in files.iter().enumerate() {
        debug!("processing {}", file.display());
        match kind {
            FileKind::Song => {
                warehouse.load_song_file(file, stats).await?;
                stats.song_files += 1;
            }
            FileKind::Log => {
                warehouse.load_log_file(file, stats).await?;
                stats.log_files += 1;
            }
        }
        progress.inc(file);
        progress.println(format!("{}/{} files processed.", i + 1, files.len()));
    }

    progress.finish();
    Ok(())
}
