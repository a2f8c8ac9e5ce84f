//! ISO-8601 week calendar in a chosen time zone.
//!
//! Week boundaries are local midnights (Monday 00:00) converted to UTC, so
//! a week is always the half-open range `[monday, next monday)`. The
//! production calendar uses the machine's local zone; tests pin both the
//! zone and "now".

use std::fmt;

use chrono::{DateTime, Datelike, Days, IsoWeek, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};

use crate::error::{Error, Result};

/// Half-open UTC time range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// Whether `inner` lies fully inside this window.
    ///
    /// Both ends of `inner` are checked against both ends of `self`.
    pub fn covers(&self, inner: &TimeWindow) -> bool {
        self.start <= inner.start
            && inner.start < self.end
            && self.start < inner.end
            && inner.end <= self.end
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// ISO week calendar bound to a time zone and an optional fixed clock.
#[derive(Debug, Clone)]
pub struct Calendar<Tz: TimeZone> {
    tz: Tz,
    pinned_now: Option<DateTime<Utc>>,
}

impl Calendar<chrono::Local> {
    /// Calendar in the machine's local time zone, using the system clock.
    pub fn local() -> Self {
        Self::new(chrono::Local)
    }
}

impl<Tz: TimeZone> Calendar<Tz> {
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            pinned_now: None,
        }
    }

    /// Calendar whose clock always reads `now`.
    pub fn pinned(tz: Tz, now: DateTime<Utc>) -> Self {
        Self {
            tz,
            pinned_now: Some(now),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.pinned_now.unwrap_or_else(Utc::now)
    }

    /// Number of ISO weeks (52 or 53) in `year`.
    pub fn weeks_in_year(year: i32) -> u32 {
        // Dec 28th always falls in the last ISO week of its year.
        NaiveDate::from_ymd_opt(year, 12, 28)
            .map(|d| d.iso_week().week())
            .unwrap_or(52)
    }

    /// `[Monday 00:00, next Monday 00:00)` of ISO week `week` in `year`.
    pub fn week_window(&self, year: i32, week: u32) -> Result<TimeWindow> {
        if week == 0 || week > Self::weeks_in_year(year) {
            return Err(Error::InvalidWeek { year, week });
        }
        let monday = NaiveDate::from_isoywd_opt(year, week, chrono::Weekday::Mon)
            .ok_or(Error::InvalidWeek { year, week })?;
        let next_monday = monday
            .checked_add_days(Days::new(7))
            .ok_or(Error::InvalidWeek { year, week })?;

        let start = self
            .local_midnight(monday)
            .ok_or(Error::InvalidWeek { year, week })?;
        let end = self
            .local_midnight(next_monday)
            .ok_or(Error::InvalidWeek { year, week })?;
        Ok(TimeWindow::new(start, end))
    }

    /// Every ISO week of `year`, from week 1 to the last week.
    pub fn iso_year_window(&self, year: i32) -> Result<TimeWindow> {
        let first = self.week_window(year, 1)?;
        let last = self.week_window(year, Self::weeks_in_year(year))?;
        Ok(TimeWindow::new(first.start, last.end))
    }

    /// The importable part of `year`.
    ///
    /// Equal to [`Self::iso_year_window`] once the year is over. For the
    /// running year the end is capped to the start of the current ISO week,
    /// so a week in progress is never imported as final data.
    pub fn import_window(&self, year: i32) -> Result<TimeWindow> {
        let full = self.iso_year_window(year)?;
        let now = self.now();
        if full.end <= now {
            return Ok(full);
        }

        let current_week_start = self.week_start_of(now).ok_or(Error::EmptyImportWindow { year })?;
        let window = TimeWindow::new(full.start, full.end.min(current_week_start));
        if window.is_empty() {
            return Err(Error::EmptyImportWindow { year });
        }
        Ok(window)
    }

    /// ISO week (and week-numbering year) of `instant` on the local calendar.
    pub fn week_of(&self, instant: DateTime<Utc>) -> IsoWeek {
        instant.with_timezone(&self.tz).iso_week()
    }

    /// Start of the ISO week following `instant`, or `instant` itself when it
    /// already is a week boundary.
    pub fn next_week_boundary(&self, instant: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let week_start = self.week_start_of(instant)?;
        if week_start == instant {
            return Some(instant);
        }
        let monday = instant.with_timezone(&self.tz).date_naive();
        let monday = monday.checked_sub_days(Days::new(
            monday.weekday().num_days_from_monday() as u64,
        ))?;
        self.local_midnight(monday.checked_add_days(Days::new(7))?)
    }

    /// Monday 00:00 of the ISO week containing `instant`.
    fn week_start_of(&self, instant: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let date = instant.with_timezone(&self.tz).date_naive();
        let monday = date.checked_sub_days(Days::new(date.weekday().num_days_from_monday() as u64))?;
        self.local_midnight(monday)
    }

    fn local_midnight(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        let midnight = date.and_time(NaiveTime::MIN);
        // Zones that skip midnight for DST start the day at 01:00.
        self.tz
            .from_local_datetime(&midnight)
            .earliest()
            .or_else(|| {
                self.tz
                    .from_local_datetime(&(midnight + TimeDelta::hours(1)))
                    .earliest()
            })
            .map(|dt| dt.with_timezone(&Utc))
    }
}
