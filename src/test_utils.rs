//! Test utilities and fixtures for scrobble-charts tests.
//!
//! This module provides common test helpers, event factories, and
//! database utilities to reduce boilerplate in tests.
//!
//! # Example
//!
//! ```ignore
//! use scrobble_charts::test_utils::{temp_db, played, utc};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let (pool, _dir) = temp_db().await;
//!     let event = played("Teardrop", "Massive Attack", utc(2024, 3, 4));
//!     // ... test logic
//! }
//! ```

use chrono::{DateTime, TimeZone, Utc};
use sqlx::sqlite::SqlitePool;
use tempfile::TempDir;

use crate::calendar::Calendar;
use crate::db;
use crate::model::PlayedTrack;
use crate::source::{NowPlaying, PlayedEvent, RecentEvent, RecentTracksPage};

/// Creates a temporary database for testing.
///
/// The database is created in a temporary directory that is automatically
/// cleaned up when the returned `TempDir` is dropped. Migrations are run
/// automatically.
///
/// Keep the TempDir alive for the duration of your test.
pub async fn temp_db() -> (SqlitePool, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = dir.path().join("test.db");
    let db_url = crate::db::db_url(Some(&db_path));

    let pool = crate::db::init_db(&db_url)
        .await
        .expect("Failed to initialize test database");

    (pool, dir)
}

/// Midnight UTC on the given date.
pub fn utc(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .expect("valid test date")
}

/// A UTC calendar whose clock is stuck at `now`.
pub fn utc_calendar(now: DateTime<Utc>) -> Calendar<Utc> {
    Calendar::pinned(Utc, now)
}

/// A finished play of `name` by `artist` at `at`.
pub fn played(name: &str, artist: &str, at: DateTime<Utc>) -> RecentEvent {
    RecentEvent::Played(PlayedEvent {
        name: name.to_string(),
        artist: artist.to_string(),
        album: "Test Album".to_string(),
        played_at: at,
    })
}

/// The track currently playing.
pub fn now_playing(name: &str, artist: &str) -> RecentEvent {
    RecentEvent::NowPlaying(NowPlaying {
        name: name.to_string(),
        artist: artist.to_string(),
        album: "Test Album".to_string(),
    })
}

/// A fixed page of events, for sources that ignore the query window.
pub fn page(number: u32, total_pages: u32, events: Vec<RecentEvent>) -> RecentTracksPage {
    RecentTracksPage {
        user: "alice".to_string(),
        page: number,
        per_page: 200,
        total_pages,
        total: events.len() as u32,
        events,
    }
}

/// Store plays of `artist` - `track` for `user` at the given instants.
///
/// Creates the user, artist and track as needed and returns the track id.
/// Weeks are ISO weeks in UTC.
pub async fn seed_plays(
    conn: &mut sqlx::SqliteConnection,
    user: &str,
    artist: &str,
    track: &str,
    times: &[DateTime<Utc>],
) -> i64 {
    if db::find_user(conn, user).await.unwrap().is_none() {
        db::insert_user(conn, user).await.unwrap();
    }
    let artist = match db::find_artist_by_name(conn, artist).await.unwrap() {
        Some(artist) => artist,
        None => db::insert_artist(conn, artist).await.unwrap(),
    };
    let track = match db::find_track(conn, artist.id, track).await.unwrap() {
        Some(track) => track,
        None => db::insert_track(conn, artist.id, track).await.unwrap(),
    };

    let calendar = Calendar::new(Utc);
    for &at in times {
        let week = calendar.week_of(at);
        let play = PlayedTrack {
            track_id: track.id,
            user_name: user.to_string(),
            played_at: at,
            played_in_year: week.year(),
            played_in_week: week.week(),
        };
        db::insert_played_track(conn, &play).await.unwrap();
    }
    track.id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_temp_db_creates_valid_pool() {
        let (pool, _dir) = temp_db().await;
        let result: (i32,) = sqlx::query_as("SELECT 1").fetch_one(&pool).await.unwrap();
        assert_eq!(result.0, 1);
    }

    #[tokio::test]
    async fn test_seed_plays_reuses_entities() {
        let (pool, _dir) = temp_db().await;
        let mut conn = pool.acquire().await.unwrap();

        let first = seed_plays(&mut conn, "alice", "Artist", "Song", &[utc(2024, 3, 4)]).await;
        let second = seed_plays(&mut conn, "alice", "Artist", "Song", &[utc(2024, 3, 5)]).await;
        assert_eq!(first, second);
        assert_eq!(db::count_played_tracks(&mut conn, "alice").await.unwrap(), 2);
    }

    #[test]
    fn test_utc_is_midnight() {
        assert_eq!(utc(2024, 3, 4).to_rfc3339(), "2024-03-04T00:00:00+00:00");
    }

    #[test]
    fn test_event_factories() {
        assert!(played("A", "B", utc(2024, 1, 1)).into_played().is_some());
        assert!(now_playing("A", "B").into_played().is_none());
        assert_eq!(utc_calendar(utc(2024, 1, 1)).now(), utc(2024, 1, 1));
    }
}
