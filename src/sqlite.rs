//! SQLite load path.
//!
//! Mirrors the PostgreSQL path statement for statement; used for local runs
//! and hermetic integration tests where no database server is available.

use sqlx::sqlite::SqlitePool;
use sqlx::Row;

use crate::db::TableCounts;
use crate::error::{EtlError, EtlResult};
use crate::loader::LoadStats;
use crate::records::{latest_user_rows, LogEvent, SongRecord};
use crate::schema::sqlite as sql;
use crate::timedim::{millis_to_datetime, TimeRow};

pub(crate) async fn ensure_schema(pool: &SqlitePool) -> EtlResult<()> {
    for stmt in sql::CREATE_TABLES {
        sqlx::query(stmt)
            .execute(pool)
            .await
            .map_err(|e| EtlError::DatabaseError(format!("failed to create table: {e}")))?;
    }
    Ok(())
}

pub(crate) async fn drop_schema(pool: &SqlitePool) -> EtlResult<()> {
    for stmt in sql::DROP_TABLES {
        sqlx::query(stmt)
            .execute(pool)
            .await
            .map_err(|e| EtlError::DatabaseError(format!("failed to drop table: {e}")))?;
    }
    Ok(())
}

pub(crate) async fn load_song(pool: &SqlitePool, song: &SongRecord) -> EtlResult<()> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| EtlError::DatabaseError(format!("failed to begin transaction: {e}")))?;

    sqlx::query(sql::INSERT_SONG)
        .bind(&song.song_id)
        .bind(song.title.as_deref())
        .bind(song.artist_id.as_deref())
        .bind(song.year)
        .bind(song.duration)
        .execute(&mut *tx)
        .await
        .map_err(|e| EtlError::DatabaseError(format!("failed to insert song: {e}")))?;

    sqlx::query(sql::INSERT_ARTIST)
        .bind(song.artist_id.as_deref())
        .bind(song.artist_name.as_deref())
        .bind(song.artist_location.as_deref())
        .bind(song.artist_latitude)
        .bind(song.artist_longitude)
        .execute(&mut *tx)
        .await
        .map_err(|e| EtlError::DatabaseError(format!("failed to insert artist: {e}")))?;

    tx.commit()
        .await
        .map_err(|e| EtlError::DatabaseError(format!("failed to commit: {e}")))
}

pub(crate) async fn load_events(
    pool: &SqlitePool,
    events: &[LogEvent],
    stats: &mut LoadStats,
) -> EtlResult<()> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| EtlError::DatabaseError(format!("failed to begin transaction: {e}")))?;

    for event in events {
        let row = TimeRow::from_event_millis(event.ts);
        sqlx::query(sql::INSERT_TIME)
            .bind(row.start_time)
            .bind(row.hour)
            .bind(row.day)
            .bind(row.week)
            .bind(row.month)
            .bind(row.year)
            .bind(&row.weekday)
            .execute(&mut *tx)
            .await
            .map_err(|e| EtlError::DatabaseError(format!("failed to insert time row: {e}")))?;
        stats.time_rows += 1;
    }

    for user in latest_user_rows(events) {
        sqlx::query(sql::UPSERT_USER)
            .bind(user.user_id)
            .bind(user.first_name.as_deref())
            .bind(user.last_name.as_deref())
            .bind(user.gender.as_deref())
            .bind(user.level.as_deref())
            .execute(&mut *tx)
            .await
            .map_err(|e| EtlError::DatabaseError(format!("failed to upsert user: {e}")))?;
        stats.users += 1;
    }

    for event in events {
        let keys = sqlx::query(sql::SELECT_SONGPLAY_KEYS)
            .bind(event.song.as_deref())
            .bind(event.artist.as_deref())
            .bind(event.length)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| EtlError::DatabaseError(format!("failed to resolve song: {e}")))?;

        let (song_id, artist_id) = match keys {
            Some(row) => {
                stats.resolved_plays += 1;
                (
                    Some(row.get::<String, _>(0)),
                    Some(row.get::<String, _>(1)),
                )
            }
            None => {
                stats.unresolved_plays += 1;
                (None, None)
            }
        };

        sqlx::query(sql::INSERT_SONGPLAY)
            .bind(millis_to_datetime(event.ts))
            .bind(event.user_id)
            .bind(event.level.as_deref())
            .bind(song_id)
            .bind(artist_id)
            .bind(event.session_id)
            .bind(event.location.as_deref())
            .bind(event.user_agent.as_deref())
            .execute(&mut *tx)
            .await
            .map_err(|e| EtlError::DatabaseError(format!("failed to insert songplay: {e}")))?;
        stats.songplays += 1;
    }

    tx.commit()
        .await
        .map_err(|e| EtlError::DatabaseError(format!("failed to commit: {e}")))
}

pub(crate) async fn table_counts(pool: &SqlitePool) -> EtlResult<TableCounts> {
    Ok(TableCounts {
        songplays: count(pool, "songplays").await?,
        songs: count(pool, "songs").await?,
        artists: count(pool, "artists").await?,
        users: count(pool, "users").await?,
        time: count(pool, "time").await?,
    })
}

async fn count(pool: &SqlitePool, table: &str) -> EtlResult<i64> {
    let query = format!("SELECT COUNT(*) FROM {table}");
    sqlx::query_scalar(&query)
        .fetch_one(pool)
        .await
        .map_err(|e| EtlError::DatabaseError(format!("failed counting {table}: {e}")))
}
