//! Core data models for listening history.
//!
//! Defines the persisted entities: [`Artist`], [`Track`], [`User`],
//! [`PlayedTrack`] and [`YearImport`]. Relations are plain foreign-key ids;
//! lookups go through the [`crate::db`] functions.
//!
//! # Database Schema
//!
//! The models map to the following tables:
//! - `artists` - Artist records with unique names
//! - `tracks` - Tracks, unique per (artist, name)
//! - `users` - Users keyed by name
//! - `played_tracks` - One immutable row per play
//! - `year_imports` - Imported time range per user and year

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::calendar::TimeWindow;
use crate::error::{Error, Result};

/// An artist seen in someone's listening history.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Artist {
    /// Database ID (auto-generated)
    pub id: i64,
    /// Artist name (unique)
    pub name: String,
}

/// A track, identified by its name within one artist.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Track {
    /// Database ID (auto-generated)
    pub id: i64,
    /// Track title
    pub name: String,
    /// Foreign key to artists table
    pub artist_id: i64,
}

/// A listener, keyed by user name.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub name: String,
}

/// One play of a track by a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayedTrack {
    pub track_id: i64,
    pub user_name: String,
    pub played_at: DateTime<Utc>,
    /// ISO week-numbering year of the play
    pub played_in_year: i32,
    /// ISO week of the play
    pub played_in_week: u32,
}

/// The imported range of one user's history within one year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearImport {
    pub id: i64,
    pub user_name: String,
    pub year: i32,
    /// Inclusive start
    pub start: DateTime<Utc>,
    /// Exclusive end; the resume cursor
    pub end: DateTime<Utc>,
}

impl YearImport {
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start, self.end)
    }
}

/// Raw `year_imports` row with timestamps as unix seconds.
#[derive(Debug, FromRow)]
pub(crate) struct YearImportRow {
    pub id: i64,
    pub user_name: String,
    pub year: i32,
    pub start_at: i64,
    pub end_at: i64,
}

impl TryFrom<YearImportRow> for YearImport {
    type Error = Error;

    fn try_from(row: YearImportRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            user_name: row.user_name,
            year: row.year,
            start: from_unix(row.start_at)?,
            end: from_unix(row.end_at)?,
        })
    }
}

/// Convert stored unix seconds back to a UTC timestamp.
pub(crate) fn from_unix(secs: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0).ok_or(Error::InvalidTimestamp(secs))
}
