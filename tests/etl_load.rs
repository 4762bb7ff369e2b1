//! End-to-end load tests against a scratch SQLite database.

use std::fs;
use std::path::Path;

use anyhow::Result;
use serde_json::json;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tempfile::{tempdir, NamedTempFile, TempDir};

use playlog_etl::{run_load, EtlError, LoadConfig};

const SONG_TITLE: &str = "Setanta matins";
const ARTIST_NAME: &str = "Elena";
const SONG_LENGTH: f64 = 269.58123;

const T1: i64 = 1_541_990_217_796;
const T2: i64 = 1_541_990_410_796;
const T3: i64 = 1_541_991_000_000;

fn song_line(song_id: &str, title: &str, artist_id: &str, artist_name: &str, duration: f64) -> String {
    json!({
        "num_songs": 1,
        "song_id": song_id,
        "title": title,
        "artist_id": artist_id,
        "artist_name": artist_name,
        "artist_location": "Dubai UAE",
        "artist_latitude": 26.90623,
        "artist_longitude": 70.90623,
        "year": 2004,
        "duration": duration
    })
    .to_string()
}

fn play_line(ts: i64, user_id: i64, first_name: &str, level: &str, song: &str, artist: &str, length: f64) -> String {
    json!({
        "artist": artist,
        "auth": "Logged In",
        "firstName": first_name,
        "gender": "F",
        "itemInSession": 0,
        "lastName": "Cruz",
        "length": length,
        "level": level,
        "location": "Washington-Arlington-Alexandria, DC-VA-MD-WV",
        "method": "PUT",
        "page": "NextSong",
        "sessionId": 583,
        "song": song,
        "status": 200,
        "ts": ts,
        "userAgent": "Mozilla/5.0",
        "userId": user_id
    })
    .to_string()
}

fn logged_out_line(ts: i64) -> String {
    json!({
        "artist": null,
        "auth": "Logged Out",
        "firstName": null,
        "gender": null,
        "lastName": null,
        "length": null,
        "level": "free",
        "location": null,
        "method": "GET",
        "page": "Home",
        "sessionId": 584,
        "song": null,
        "status": 200,
        "ts": ts,
        "userAgent": null,
        "userId": ""
    })
    .to_string()
}

fn write_file(root: &Path, rel: &str, lines: &[String]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("parent")).expect("create dirs");
    fs::write(path, lines.join("\n")).expect("write file");
}

/// Build a data tree with two song files and two log files. The first log
/// file's first event exactly matches one catalog song; everything else is
/// unresolvable.
fn build_data_tree() -> TempDir {
    let data = tempdir().expect("data dir");
    let root = data.path();

    write_file(
        root,
        "song_data/A/A/A/TRAAAAW128F429D538.json",
        &[song_line("SOZCTXZ12AB0182364", SONG_TITLE, "AR5KOSW1187FB35FF4", ARTIST_NAME, SONG_LENGTH)],
    );
    write_file(
        root,
        "song_data/A/B/C/TRABCEI128F424C983.json",
        &[song_line("SOUPIRU12A6D4FA1E1", "Der Kleine Dompfaff", "ARJIE2Y1187B994AB7", "Line Renaud", 152.92036)],
    );

    write_file(
        root,
        "log_data/2018/11/2018-11-11-events.json",
        &[
            play_line(T1, 10, "Sylvie", "free", SONG_TITLE, ARTIST_NAME, SONG_LENGTH),
            play_line(T2, 10, "Sylvie", "paid", "Intro", "The Who", 100.0),
            logged_out_line(T2 + 1),
        ],
    );
    write_file(
        root,
        "log_data/2018/11/2018-11-12-events.json",
        &[play_line(T3, 10, "Sylvia", "free", "Intro", "The Who", 100.0)],
    );

    data
}

fn config(data: &TempDir, dsn: &str) -> LoadConfig {
    LoadConfig {
        dsn: dsn.to_string(),
        song_data: data.path().join("song_data"),
        log_data: data.path().join("log_data"),
    }
}

async fn connect(dsn: &str) -> Result<SqlitePool> {
    Ok(SqlitePoolOptions::new()
        .max_connections(1)
        .connect(dsn)
        .await?)
}

async fn count(pool: &SqlitePool, query: &str) -> Result<i64> {
    Ok(sqlx::query_scalar(query).fetch_one(pool).await?)
}

#[tokio::test]
async fn full_load_and_reload() -> Result<()> {
    let data = build_data_tree();
    let db = NamedTempFile::new()?;
    let dsn = format!("sqlite://{}", db.path().display());

    let stats = run_load(&config(&data, &dsn)).await?;
    assert_eq!(stats.song_files, 2);
    assert_eq!(stats.log_files, 2);
    assert_eq!(stats.songplays, 3);
    assert_eq!(stats.resolved_plays, 1);
    assert_eq!(stats.unresolved_plays, 2);

    let pool = connect(&dsn).await?;

    assert_eq!(count(&pool, "SELECT COUNT(*) FROM songs").await?, 2);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM artists").await?, 2);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM users").await?, 1);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM time").await?, 3);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM songplays").await?, 3);

    // Identity fields stay from the first insert; level tracks the most
    // recent event, which lives in the later log file.
    let (first_name, level): (String, String) =
        sqlx::query_as("SELECT first_name, level FROM users WHERE user_id = 10")
            .fetch_one(&pool)
            .await?;
    assert_eq!(first_name, "Sylvie");
    assert_eq!(level, "free");

    // Each fact row keeps the level recorded at event time, in event order.
    let plays: Vec<(Option<String>, Option<String>, Option<String>, Option<i64>)> = sqlx::query_as(
        "SELECT level, song_id, artist_id, user_id FROM songplays ORDER BY start_time",
    )
    .fetch_all(&pool)
    .await?;
    assert_eq!(plays.len(), 3);
    assert_eq!(plays[0].0.as_deref(), Some("free"));
    assert_eq!(plays[1].0.as_deref(), Some("paid"));
    assert_eq!(plays[2].0.as_deref(), Some("free"));
    assert!(plays.iter().all(|p| p.3 == Some(10)));

    // Only the exactly-matching play resolves to catalog ids.
    assert_eq!(plays[0].1.as_deref(), Some("SOZCTXZ12AB0182364"));
    assert_eq!(plays[0].2.as_deref(), Some("AR5KOSW1187FB35FF4"));
    assert_eq!(plays[1].1, None);
    assert_eq!(plays[1].2, None);

    // Reload: dimensions stay put, the fact table doubles.
    run_load(&config(&data, &dsn)).await?;
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM songs").await?, 2);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM artists").await?, 2);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM users").await?, 1);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM time").await?, 3);
    assert_eq!(
        count(&pool, "SELECT COUNT(DISTINCT start_time) FROM time").await?,
        3
    );
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM songplays").await?, 6);

    Ok(())
}

#[tokio::test]
async fn song_coordinates_land_in_named_columns() -> Result<()> {
    let data = build_data_tree();
    let db = NamedTempFile::new()?;
    let dsn = format!("sqlite://{}", db.path().display());

    run_load(&config(&data, &dsn)).await?;

    let pool = connect(&dsn).await?;
    let (latitude, longitude): (f64, f64) = sqlx::query_as(
        "SELECT latitude, longitude FROM artists WHERE artist_id = 'AR5KOSW1187FB35FF4'",
    )
    .fetch_one(&pool)
    .await?;
    assert_eq!(latitude, 26.90623);
    assert_eq!(longitude, 70.90623);
    Ok(())
}

#[tokio::test]
async fn malformed_song_file_aborts_the_run() -> Result<()> {
    let data = tempdir()?;
    write_file(
        data.path(),
        "song_data/A/bad.json",
        &["{not valid json".to_string()],
    );
    fs::create_dir_all(data.path().join("log_data"))?;

    let db = NamedTempFile::new()?;
    let dsn = format!("sqlite://{}", db.path().display());

    let err = run_load(&config(&data, &dsn)).await.unwrap_err();
    assert!(matches!(err, EtlError::ParseError(_)));

    // Nothing from the failing file was committed.
    let pool = connect(&dsn).await?;
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM songs").await?, 0);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM artists").await?, 0);
    Ok(())
}
