use chrono::{DateTime, Local, TimeZone, Utc};
use sqlx::SqliteConnection;

use super::top_ranked;
use crate::calendar::Calendar;
use crate::db::{self, TrackPlays};
use crate::error::{Error, Result};

/// One position in a weekly chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyChartEntry {
    pub rank: u32,
    pub track_id: i64,
    pub name: String,
    pub artist: String,
    pub plays: u32,
    pub last_played_at: DateTime<Utc>,
}

/// Ranks a user's tracks within one ISO week.
#[derive(Debug, Clone)]
pub struct WeeklyChartAggregator<Tz: TimeZone = Local> {
    calendar: Calendar<Tz>,
}

impl WeeklyChartAggregator {
    pub fn new() -> Self {
        Self::with_calendar(Calendar::local())
    }
}

impl Default for WeeklyChartAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl<Tz: TimeZone> WeeklyChartAggregator<Tz> {
    pub fn with_calendar(calendar: Calendar<Tz>) -> Self {
        Self { calendar }
    }

    /// Top tracks of `user` in ISO week `week` of `year`.
    ///
    /// # Errors
    ///
    /// - [`Error::NoImportForYear`] if nothing was imported for the year
    /// - [`Error::InvalidWeek`] if the year has no such week
    /// - [`Error::IncompleteWeekCoverage`] unless the whole week lies inside
    ///   the imported range
    pub async fn weekly_chart(
        &self,
        conn: &mut SqliteConnection,
        user: &str,
        year: i32,
        week: u32,
    ) -> Result<Vec<WeeklyChartEntry>> {
        let import = db::find_year_import(conn, user, year)
            .await?
            .ok_or_else(|| Error::NoImportForYear {
                user: user.to_string(),
                year,
            })?;

        let week_window = self.calendar.week_window(year, week)?;
        if !import.window().covers(&week_window) {
            return Err(Error::IncompleteWeekCoverage {
                user: user.to_string(),
                year,
                week,
            });
        }

        let rows = db::weekly_track_plays(conn, user, year, week).await?;
        let chart = rank_week(rows);
        tracing::debug!(target: "charts", user, year, week, entries = chart.len(), "Weekly chart");
        Ok(chart)
    }
}

/// Rank one week's per-track play counts.
///
/// Plays descending, then most recent play descending, then track id.
pub(super) fn rank_week(rows: Vec<TrackPlays>) -> Vec<WeeklyChartEntry> {
    top_ranked(rows, |a, b| {
        b.plays
            .cmp(&a.plays)
            .then(b.last_played_at.cmp(&a.last_played_at))
            .then(a.track_id.cmp(&b.track_id))
    })
    .into_iter()
    .map(|(rank, row)| WeeklyChartEntry {
        rank,
        track_id: row.track_id,
        name: row.track_name,
        artist: row.artist_name,
        plays: row.plays,
        last_played_at: row.last_played_at,
    })
    .collect()
}
