use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Local, TimeZone, Utc};
use sqlx::SqliteConnection;

use super::weekly::rank_week;
use super::{points_for_rank, top_ranked};
use crate::calendar::Calendar;
use crate::db::{self, TrackPlays};
use crate::error::{Error, Result};

/// One position in a yearly chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearlyChartEntry {
    pub rank: u32,
    pub track_id: i64,
    pub name: String,
    pub artist: String,
    /// Plays over the whole year
    pub plays: u32,
    /// Sum of weekly chart points
    pub points: u32,
    pub last_played_at: DateTime<Utc>,
}

/// Ranks a user's tracks over a whole ISO year by weekly chart points.
#[derive(Debug, Clone)]
pub struct YearlyChartAggregator<Tz: TimeZone = Local> {
    calendar: Calendar<Tz>,
}

impl YearlyChartAggregator {
    pub fn new() -> Self {
        Self::with_calendar(Calendar::local())
    }
}

impl Default for YearlyChartAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl<Tz: TimeZone> YearlyChartAggregator<Tz> {
    pub fn with_calendar(calendar: Calendar<Tz>) -> Self {
        Self { calendar }
    }

    /// Top tracks of `user` in `year`.
    ///
    /// Only a year imported from its first to its last ISO week can be
    /// ranked; anything else is [`Error::IncompleteYearCoverage`].
    pub async fn yearly_chart(
        &self,
        conn: &mut SqliteConnection,
        user: &str,
        year: i32,
    ) -> Result<Vec<YearlyChartEntry>> {
        let import = db::find_year_import(conn, user, year)
            .await?
            .ok_or_else(|| Error::NoImportForYear {
                user: user.to_string(),
                year,
            })?;

        if import.window() != self.calendar.iso_year_window(year)? {
            return Err(Error::IncompleteYearCoverage {
                user: user.to_string(),
                year,
            });
        }

        let rows = db::yearly_track_plays_by_week(conn, user, year).await?;
        let chart = rank_year(rows);
        tracing::debug!(target: "charts", user, year, entries = chart.len(), "Yearly chart");
        Ok(chart)
    }
}

#[derive(Debug)]
struct Tally {
    name: String,
    artist: String,
    plays: u32,
    points: u32,
    charted: bool,
    last_played_at: DateTime<Utc>,
}

/// Rank a year from per-track, per-week play counts.
pub(super) fn rank_year(rows: Vec<TrackPlays>) -> Vec<YearlyChartEntry> {
    let mut tallies: HashMap<i64, Tally> = HashMap::new();
    let mut weeks: BTreeMap<u32, Vec<TrackPlays>> = BTreeMap::new();

    for row in rows {
        let tally = tallies.entry(row.track_id).or_insert_with(|| Tally {
            name: row.track_name.clone(),
            artist: row.artist_name.clone(),
            plays: 0,
            points: 0,
            charted: false,
            last_played_at: row.last_played_at,
        });
        tally.plays += row.plays;
        tally.last_played_at = tally.last_played_at.max(row.last_played_at);
        weeks.entry(row.week).or_default().push(row);
    }

    for week_rows in weeks.into_values() {
        for entry in rank_week(week_rows) {
            if let Some(tally) = tallies.get_mut(&entry.track_id) {
                tally.points += points_for_rank(entry.rank);
                tally.charted = true;
            }
        }
    }

    let charted: Vec<(i64, Tally)> = tallies.into_iter().filter(|(_, t)| t.charted).collect();
    top_ranked(charted, |(a_id, a), (b_id, b)| {
        b.points
            .cmp(&a.points)
            .then(b.last_played_at.cmp(&a.last_played_at))
            .then(a_id.cmp(b_id))
    })
    .into_iter()
    .map(|(rank, (track_id, tally))| YearlyChartEntry {
        rank,
        track_id,
        name: tally.name,
        artist: tally.artist,
        plays: tally.plays,
        points: tally.points,
        last_played_at: tally.last_played_at,
    })
    .collect()
}
