//! Database module for listening-history persistence.
//!
//! Uses SQLx with SQLite for lightweight, embedded database storage.
//! Every query function takes an explicit `&mut SqliteConnection`, so the
//! caller decides whether it runs on a pooled connection or inside an open
//! transaction. Imports pass their transaction; chart queries pass a plain
//! connection.
//!
//! Timestamps are stored as UTC unix seconds.
//!
//! # Example
//!
//! ```ignore
//! use scrobble_charts::db::{init_db, find_year_import};
//!
//! let pool = init_db("sqlite:scrobble_charts.db").await?;
//! let mut conn = pool.acquire().await?;
//! let import = find_year_import(&mut conn, "alice", 2024).await?;
//! ```

use chrono::{DateTime, Utc};
use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::{SqliteConnection, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;

use crate::error::{Error, Result};
use crate::model::{self, Artist, PlayedTrack, Track, User, YearImport, YearImportRow};

/// Default database filename.
pub const DEFAULT_DB_NAME: &str = "scrobble_charts.db";

/// Build a SQLite database URL from an optional path.
///
/// If no path is provided, uses [`DEFAULT_DB_NAME`] in the current directory.
pub fn db_url(path: Option<&std::path::Path>) -> String {
    match path {
        Some(p) => format!("sqlite:{}", p.display()),
        None => format!("sqlite:{}", DEFAULT_DB_NAME),
    }
}

/// Initialize the database connection pool and run migrations.
///
/// Creates the database file if it doesn't exist, establishes a connection
/// pool with up to 5 connections, and runs all pending migrations.
///
/// # Errors
///
/// Returns an error if:
/// - Database creation fails
/// - Connection cannot be established
/// - Migration fails
pub async fn init_db(db_url: &str) -> Result<SqlitePool> {
    if !sqlx::Sqlite::database_exists(db_url).await.unwrap_or(false) {
        sqlx::Sqlite::create_database(db_url).await?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::debug!(target: "db", url = db_url, "Database ready");

    Ok(pool)
}

/// Map a unique-key violation to [`Error::ConstraintViolation`].
fn on_unique_violation(err: sqlx::Error, entity: &'static str, key: &str) -> Error {
    let is_unique = err
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation());
    if is_unique {
        Error::constraint(entity, key)
    } else {
        Error::Database(err)
    }
}

// ============================================================================
// Users
// ============================================================================

pub async fn find_user(conn: &mut SqliteConnection, name: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT name FROM users WHERE name = ?")
        .bind(name)
        .fetch_optional(conn)
        .await?;
    Ok(user)
}

pub async fn insert_user(conn: &mut SqliteConnection, name: &str) -> Result<User> {
    sqlx::query("INSERT INTO users (name) VALUES (?)")
        .bind(name)
        .execute(conn)
        .await
        .map_err(|e| on_unique_violation(e, "user", name))?;
    Ok(User {
        name: name.to_string(),
    })
}

// ============================================================================
// Artists and tracks
// ============================================================================

/// Look up an artist by its unique name.
pub async fn find_artist_by_name(conn: &mut SqliteConnection, name: &str) -> Result<Option<Artist>> {
    let artist = sqlx::query_as::<_, Artist>("SELECT id, name FROM artists WHERE name = ?")
        .bind(name)
        .fetch_optional(conn)
        .await?;
    Ok(artist)
}

/// Create an artist. Fails with [`Error::ConstraintViolation`] if the name exists.
pub async fn insert_artist(conn: &mut SqliteConnection, name: &str) -> Result<Artist> {
    let result = sqlx::query("INSERT INTO artists (name) VALUES (?)")
        .bind(name)
        .execute(conn)
        .await
        .map_err(|e| on_unique_violation(e, "artist", name))?;
    Ok(Artist {
        id: result.last_insert_rowid(),
        name: name.to_string(),
    })
}

/// Look up a track by name within one artist.
pub async fn find_track(
    conn: &mut SqliteConnection,
    artist_id: i64,
    name: &str,
) -> Result<Option<Track>> {
    let track = sqlx::query_as::<_, Track>(
        "SELECT id, name, artist_id FROM tracks WHERE artist_id = ? AND name = ?",
    )
    .bind(artist_id)
    .bind(name)
    .fetch_optional(conn)
    .await?;
    Ok(track)
}

/// Create a track. Fails with [`Error::ConstraintViolation`] if the artist
/// already has a track with this name.
pub async fn insert_track(conn: &mut SqliteConnection, artist_id: i64, name: &str) -> Result<Track> {
    let result = sqlx::query("INSERT INTO tracks (name, artist_id) VALUES (?, ?)")
        .bind(name)
        .bind(artist_id)
        .execute(conn)
        .await
        .map_err(|e| on_unique_violation(e, "track", &format!("{artist_id}/{name}")))?;
    Ok(Track {
        id: result.last_insert_rowid(),
        name: name.to_string(),
        artist_id,
    })
}

// ============================================================================
// Year imports
// ============================================================================

pub async fn find_year_import(
    conn: &mut SqliteConnection,
    user_name: &str,
    year: i32,
) -> Result<Option<YearImport>> {
    let row = sqlx::query_as::<_, YearImportRow>(
        "SELECT id, user_name, year, start_at, end_at FROM year_imports WHERE user_name = ? AND year = ?",
    )
    .bind(user_name)
    .bind(year)
    .fetch_optional(conn)
    .await?;
    row.map(YearImport::try_from).transpose()
}

pub async fn insert_year_import(
    conn: &mut SqliteConnection,
    user_name: &str,
    year: i32,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<YearImport> {
    let result = sqlx::query(
        "INSERT INTO year_imports (user_name, year, start_at, end_at) VALUES (?, ?, ?, ?)",
    )
    .bind(user_name)
    .bind(year)
    .bind(start.timestamp())
    .bind(end.timestamp())
    .execute(conn)
    .await
    .map_err(|e| on_unique_violation(e, "year import", &format!("{user_name}/{year}")))?;

    Ok(YearImport {
        id: result.last_insert_rowid(),
        user_name: user_name.to_string(),
        year,
        start,
        end,
    })
}

/// Move the resume cursor forward.
///
/// Returns `false` without writing if `end` would not advance it.
pub async fn advance_year_import_end(
    conn: &mut SqliteConnection,
    id: i64,
    end: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query("UPDATE year_imports SET end_at = ? WHERE id = ? AND end_at < ?")
        .bind(end.timestamp())
        .bind(id)
        .bind(end.timestamp())
        .execute(conn)
        .await?;
    Ok(result.rows_affected() == 1)
}

// ============================================================================
// Played tracks
// ============================================================================

/// Store a play. Returns `false` if the same (track, user, time) already exists.
pub async fn insert_played_track(conn: &mut SqliteConnection, play: &PlayedTrack) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO played_tracks (track_id, user_name, played_at, played_in_year, played_in_week)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (track_id, user_name, played_at) DO NOTHING
        "#,
    )
    .bind(play.track_id)
    .bind(&play.user_name)
    .bind(play.played_at.timestamp())
    .bind(play.played_in_year)
    .bind(play.played_in_week)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn count_played_tracks(conn: &mut SqliteConnection, user_name: &str) -> Result<u64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM played_tracks WHERE user_name = ?")
        .bind(user_name)
        .fetch_one(conn)
        .await?;
    Ok(count as u64)
}

/// Play count and most recent play of one track in one ISO week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackPlays {
    pub track_id: i64,
    pub track_name: String,
    pub artist_name: String,
    pub week: u32,
    pub plays: u32,
    pub last_played_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct TrackPlaysRow {
    track_id: i64,
    track_name: String,
    artist_name: String,
    played_in_week: u32,
    plays: u32,
    last_played_at: i64,
}

impl TryFrom<TrackPlaysRow> for TrackPlays {
    type Error = Error;

    fn try_from(row: TrackPlaysRow) -> Result<Self> {
        Ok(Self {
            track_id: row.track_id,
            track_name: row.track_name,
            artist_name: row.artist_name,
            week: row.played_in_week,
            plays: row.plays,
            last_played_at: model::from_unix(row.last_played_at)?,
        })
    }
}

const TRACK_PLAYS_SELECT: &str = r#"
    SELECT
        pt.track_id,
        t.name AS track_name,
        a.name AS artist_name,
        pt.played_in_week,
        COUNT(*) AS plays,
        MAX(pt.played_at) AS last_played_at
    FROM played_tracks pt
    JOIN tracks t ON t.id = pt.track_id
    JOIN artists a ON a.id = t.artist_id
"#;

/// Per-track play counts of one user in one ISO week of one year.
pub async fn weekly_track_plays(
    conn: &mut SqliteConnection,
    user_name: &str,
    year: i32,
    week: u32,
) -> Result<Vec<TrackPlays>> {
    let sql = format!(
        "{TRACK_PLAYS_SELECT}
        WHERE pt.user_name = ? AND pt.played_in_year = ? AND pt.played_in_week = ?
        GROUP BY pt.track_id, pt.played_in_week"
    );
    let rows = sqlx::query_as::<_, TrackPlaysRow>(&sql)
        .bind(user_name)
        .bind(year)
        .bind(week)
        .fetch_all(conn)
        .await?;
    rows.into_iter().map(TrackPlays::try_from).collect()
}

/// Per-track, per-week play counts of one user across one ISO year.
pub async fn yearly_track_plays_by_week(
    conn: &mut SqliteConnection,
    user_name: &str,
    year: i32,
) -> Result<Vec<TrackPlays>> {
    let sql = format!(
        "{TRACK_PLAYS_SELECT}
        WHERE pt.user_name = ? AND pt.played_in_year = ?
        GROUP BY pt.track_id, pt.played_in_week"
    );
    let rows = sqlx::query_as::<_, TrackPlaysRow>(&sql)
        .bind(user_name)
        .bind(year)
        .fetch_all(conn)
        .await?;
    rows.into_iter().map(TrackPlays::try_from).collect()
}
