//! Warehouse schema and statement catalog.
//!
//! The star schema has one fact table (`songplays`) and four dimensions
//! (`users`, `songs`, `artists`, `time`). All DDL is idempotent
//! (`IF NOT EXISTS`) so schema creation is safe to re-run before every load.
//! Conflict policy per table: `songs`, `artists` and `time` ignore duplicate
//! keys; `users` overwrites only `level` so identity fields stay fixed at
//! first insert; `songplays` has no conflict target and is append-only.

/// PostgreSQL dialect.
pub mod postgres {
    /// Fact table: one row per song play event.
    pub const CREATE_SONGPLAYS: &str = r#"
        CREATE TABLE IF NOT EXISTS songplays (
            songplay_id BIGSERIAL PRIMARY KEY,
            start_time  TIMESTAMPTZ,
            user_id     BIGINT,
            level       VARCHAR,
            song_id     VARCHAR,
            artist_id   VARCHAR,
            session_id  BIGINT,
            location    VARCHAR,
            user_agent  VARCHAR
        )"#;

    /// User dimension.
    pub const CREATE_USERS: &str = r#"
        CREATE TABLE IF NOT EXISTS users (
            user_id    BIGINT PRIMARY KEY,
            first_name VARCHAR NOT NULL,
            last_name  VARCHAR NOT NULL,
            gender     VARCHAR,
            level      VARCHAR
        )"#;

    /// Song dimension.
    pub const CREATE_SONGS: &str = r#"
        CREATE TABLE IF NOT EXISTS songs (
            song_id   VARCHAR PRIMARY KEY,
            title     VARCHAR,
            artist_id VARCHAR,
            year      INT,
            duration  DOUBLE PRECISION
        )"#;

    /// Artist dimension.
    pub const CREATE_ARTISTS: &str = r#"
        CREATE TABLE IF NOT EXISTS artists (
            artist_id VARCHAR PRIMARY KEY,
            name      VARCHAR,
            location  VARCHAR,
            latitude  DOUBLE PRECISION,
            longitude DOUBLE PRECISION
        )"#;

    /// Time dimension: one row per distinct event timestamp.
    pub const CREATE_TIME: &str = r#"
        CREATE TABLE IF NOT EXISTS time (
            start_time TIMESTAMPTZ PRIMARY KEY,
            hour       INT NOT NULL,
            day        INT NOT NULL,
            week       INT NOT NULL,
            month      INT NOT NULL,
            year       INT NOT NULL,
            weekday    VARCHAR NOT NULL
        )"#;

    /// All table creation statements, executed in order.
    pub const CREATE_TABLES: &[&str] = &[
        CREATE_SONGPLAYS,
        CREATE_USERS,
        CREATE_SONGS,
        CREATE_ARTISTS,
        CREATE_TIME,
    ];

    /// All table drop statements, executed in order.
    pub const DROP_TABLES: &[&str] = &[
        "DROP TABLE IF EXISTS songplays",
        "DROP TABLE IF EXISTS users",
        "DROP TABLE IF EXISTS songs",
        "DROP TABLE IF EXISTS artists",
        "DROP TABLE IF EXISTS time",
    ];

    /// Append one fact row.
    pub const INSERT_SONGPLAY: &str = r#"
        INSERT INTO songplays
            (start_time, user_id, level, song_id, artist_id, session_id, location, user_agent)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#;

    /// Upsert a user; only the subscription level moves on conflict.
    pub const UPSERT_USER: &str = r#"
        INSERT INTO users (user_id, first_name, last_name, gender, level)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (user_id) DO UPDATE SET level = EXCLUDED.level"#;

    /// Insert a song, first writer wins.
    pub const INSERT_SONG: &str = r#"
        INSERT INTO songs (song_id, title, artist_id, year, duration)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (song_id) DO NOTHING"#;

    /// Insert an artist, first writer wins.
    pub const INSERT_ARTIST: &str = r#"
        INSERT INTO artists (artist_id, name, location, latitude, longitude)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (artist_id) DO NOTHING"#;

    /// Insert a time-dimension row, ignoring duplicate timestamps.
    pub const INSERT_TIME: &str = r#"
        INSERT INTO time (start_time, hour, day, week, month, year, weekday)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (start_time) DO NOTHING"#;

    /// Resolve a played song to catalog ids by exact title, artist name and
    /// duration match.
    pub const SELECT_SONGPLAY_KEYS: &str = r#"
        SELECT s.song_id, a.artist_id
        FROM songs s
        JOIN artists a ON s.artist_id = a.artist_id
        WHERE s.title = $1
          AND a.name = $2
          AND s.duration = $3"#;
}

/// SQLite dialect, used for local runs and hermetic tests.
pub mod sqlite {
    /// Fact table: one row per song play event.
    pub const CREATE_SONGPLAYS: &str = r#"
        CREATE TABLE IF NOT EXISTS songplays (
            songplay_id INTEGER PRIMARY KEY AUTOINCREMENT,
            start_time  TEXT,
            user_id     INTEGER,
            level       TEXT,
            song_id     TEXT,
            artist_id   TEXT,
            session_id  INTEGER,
            location    TEXT,
            user_agent  TEXT
        )"#;

    /// User dimension.
    pub const CREATE_USERS: &str = r#"
        CREATE TABLE IF NOT EXISTS users (
            user_id    INTEGER PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name  TEXT NOT NULL,
            gender     TEXT,
            level      TEXT
        )"#;

    /// Song dimension.
    pub const CREATE_SONGS: &str = r#"
        CREATE TABLE IF NOT EXISTS songs (
            song_id   TEXT PRIMARY KEY,
            title     TEXT,
            artist_id TEXT,
            year      INTEGER,
            duration  REAL
        )"#;

    /// Artist dimension.
    pub const CREATE_ARTISTS: &str = r#"
        CREATE TABLE IF NOT EXISTS artists (
            artist_id TEXT PRIMARY KEY,
            name      TEXT,
            location  TEXT,
            latitude  REAL,
            longitude REAL
        )"#;

    /// Time dimension: one row per distinct event timestamp.
    pub const CREATE_TIME: &str = r#"
        CREATE TABLE IF NOT EXISTS time (
            start_time TEXT PRIMARY KEY,
            hour       INTEGER NOT NULL,
            day        INTEGER NOT NULL,
            week       INTEGER NOT NULL,
            month      INTEGER NOT NULL,
            year       INTEGER NOT NULL,
            weekday    TEXT NOT NULL
        )"#;

    /// All table creation statements, executed in order.
    pub const CREATE_TABLES: &[&str] = &[
        CREATE_SONGPLAYS,
        CREATE_USERS,
        CREATE_SONGS,
        CREATE_ARTISTS,
        CREATE_TIME,
    ];

    /// All table drop statements, executed in order.
    pub const DROP_TABLES: &[&str] = &[
        "DROP TABLE IF EXISTS songplays",
        "DROP TABLE IF EXISTS users",
        "DROP TABLE IF EXISTS songs",
        "DROP TABLE IF EXISTS artists",
        "DROP TABLE IF EXISTS time",
    ];

    /// Append one fact row.
    pub const INSERT_SONGPLAY: &str = r#"
        INSERT INTO songplays
            (start_time, user_id, level, song_id, artist_id, session_id, location, user_agent)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#;

    /// Upsert a user; only the subscription level moves on conflict.
    pub const UPSERT_USER: &str = r#"
        INSERT INTO users (user_id, first_name, last_name, gender, level)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (user_id) DO UPDATE SET level = excluded.level"#;

    /// Insert a song, first writer wins.
    pub const INSERT_SONG: &str = r#"
        INSERT INTO songs (song_id, title, artist_id, year, duration)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (song_id) DO NOTHING"#;

    /// Insert an artist, first writer wins.
    pub const INSERT_ARTIST: &str = r#"
        INSERT INTO artists (artist_id, name, location, latitude, longitude)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (artist_id) DO NOTHING"#;

    /// Insert a time-dimension row, ignoring duplicate timestamps.
    pub const INSERT_TIME: &str = r#"
        INSERT INTO time (start_time, hour, day, week, month, year, weekday)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (start_time) DO NOTHING"#;

    /// Resolve a played song to catalog ids by exact title, artist name and
    /// duration match.
    pub const SELECT_SONGPLAY_KEYS: &str = r#"
        SELECT s.song_id, a.artist_id
        FROM songs s
        JOIN artists a ON s.artist_id = a.artist_id
        WHERE s.title = ?
          AND a.name = ?
          AND s.duration = ?"#;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_five_tables_per_dialect() {
        assert_eq!(postgres::CREATE_TABLES.len(), 5);
        assert_eq!(postgres::DROP_TABLES.len(), 5);
        assert_eq!(sqlite::CREATE_TABLES.len(), 5);
        assert_eq!(sqlite::DROP_TABLES.len(), 5);
    }

    #[test]
    fn test_ddl_is_idempotent() {
        for stmt in postgres::CREATE_TABLES.iter().chain(sqlite::CREATE_TABLES) {
            assert!(stmt.contains("IF NOT EXISTS"), "not idempotent: {stmt}");
        }
    }

    #[test]
    fn test_dimension_conflict_targets() {
        assert!(postgres::INSERT_SONG.contains("ON CONFLICT (song_id) DO NOTHING"));
        assert!(postgres::INSERT_ARTIST.contains("ON CONFLICT (artist_id) DO NOTHING"));
        assert!(postgres::INSERT_TIME.contains("ON CONFLICT (start_time) DO NOTHING"));
        assert!(postgres::UPSERT_USER.contains("DO UPDATE SET level = EXCLUDED.level"));
    }

    #[test]
    fn test_fact_table_has_no_conflict_handling() {
        assert!(!postgres::INSERT_SONGPLAY.contains("ON CONFLICT"));
        assert!(!sqlite::INSERT_SONGPLAY.contains("ON CONFLICT"));
    }

    #[test]
    fn test_lookup_joins_on_artist() {
        for stmt in [postgres::SELECT_SONGPLAY_KEYS, sqlite::SELECT_SONGPLAY_KEYS] {
            assert!(stmt.contains("JOIN artists a ON s.artist_id = a.artist_id"));
        }
    }
}
