//! Warehouse connection and backend dispatch.

use std::path::Path;

use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{PgPool, SqlitePool};
use tracing::debug;

use crate::error::{EtlError, EtlResult};
use crate::loader::LoadStats;
use crate::records;
use crate::{postgres, sqlite};

/// A connected warehouse, selected by DSN scheme.
///
/// The pool is opened once per run and shared by every file load; each file's
/// statements run in their own transaction.
pub enum Warehouse {
    /// PostgreSQL backend (`postgres://` / `postgresql://` DSNs)
    Postgres(PgPool),
    /// SQLite backend (`sqlite://` DSNs)
    Sqlite(SqlitePool),
}

/// Per-table row counts, for status reporting and verification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableCounts {
    /// Rows in the `songplays` fact table
    pub songplays: i64,
    /// Rows in the `songs` dimension
    pub songs: i64,
    /// Rows in the `artists` dimension
    pub artists: i64,
    /// Rows in the `users` dimension
    pub users: i64,
    /// Rows in the `time` dimension
    pub time: i64,
}

impl Warehouse {
    /// Connect to the database named by `dsn`.
    pub async fn connect(dsn: &str) -> EtlResult<Self> {
        if dsn.starts_with("postgres://") || dsn.starts_with("postgresql://") {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(dsn)
                .await
                .map_err(|e| {
                    EtlError::DatabaseError(format!("failed to connect to Postgres: {e}"))
                })?;
            Ok(Warehouse::Postgres(pool))
        } else if dsn.starts_with("sqlite://") {
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .connect(dsn)
                .await
                .map_err(|e| {
                    EtlError::DatabaseError(format!("failed to connect to SQLite: {e}"))
                })?;
            Ok(Warehouse::Sqlite(pool))
        } else {
            Err(EtlError::ConfigError(format!("unsupported DSN: {dsn}")))
        }
    }

    /// Create the star schema tables if they do not already exist.
    pub async fn ensure_schema(&self) -> EtlResult<()> {
        match self {
            Warehouse::Postgres(pool) => postgres::ensure_schema(pool).await,
            Warehouse::Sqlite(pool) => sqlite::ensure_schema(pool).await,
        }
    }

    /// Drop all star schema tables.
    pub async fn drop_schema(&self) -> EtlResult<()> {
        match self {
            Warehouse::Postgres(pool) => postgres::drop_schema(pool).await,
            Warehouse::Sqlite(pool) => sqlite::drop_schema(pool).await,
        }
    }

    /// Parse one song-metadata file and upsert its song and artist rows,
    /// committing both inserts together.
    pub async fn load_song_file(&self, path: &Path, stats: &mut LoadStats) -> EtlResult<()> {
        let song = records::parse_song_file(path)?;
        debug!("loading song {} from {}", song.song_id, path.display());
        match self {
            Warehouse::Postgres(pool) => postgres::load_song(pool, &song).await?,
            Warehouse::Sqlite(pool) => sqlite::load_song(pool, &song).await?,
        }
        stats.songs += 1;
        stats.artists += 1;
        Ok(())
    }

    /// Parse one event log file and load its time, user and songplay rows,
    /// committing the whole file together.
    pub async fn load_log_file(&self, path: &Path, stats: &mut LoadStats) -> EtlResult<()> {
        let events = records::next_song_events(records::parse_log_file(path)?);
        debug!("loading {} events from {}", events.len(), path.display());
        match self {
            Warehouse::Postgres(pool) => postgres::load_events(pool, &events, stats).await,
            Warehouse::Sqlite(pool) => sqlite::load_events(pool, &events, stats).await,
        }
    }

    /// Report current per-table row counts.
    pub async fn table_counts(&self) -> EtlResult<TableCounts> {
        match self {
            Warehouse::Postgres(pool) => postgres::table_counts(pool).await,
            Warehouse::Sqlite(pool) => sqlite::table_counts(pool).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unsupported_dsn_rejected() {
        let result = Warehouse::connect("mysql://localhost/warehouse").await;
        assert!(matches!(result, Err(EtlError::ConfigError(_))));
    }
}
