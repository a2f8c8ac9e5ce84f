//! Year import: pulls a user's plays for one ISO year into storage.
//!
//! One import runs inside one transaction. Every early return drops the
//! transaction, so a failed, cancelled or no-op import leaves storage
//! exactly as it was.

use chrono::{Local, TimeZone};
use futures::TryStreamExt;
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;

use super::EntityReconciler;
use crate::calendar::{Calendar, TimeWindow};
use crate::db;
use crate::error::{Error, Result, ResultExt};
use crate::model::PlayedTrack;
use crate::source::lastfm::MAX_PAGE_SIZE;
use crate::source::{HistoryRequest, RecentTracksSource, recent_plays};

/// Who and what to import.
#[derive(Debug, Clone, Copy)]
pub struct ImportRequest<'a> {
    pub user: &'a str,
    pub year: i32,
    pub api_key: &'a str,
}

/// Outcome of [`ImportCoordinator::import_year`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    /// Window requested from the source; `None` when nothing was left to fetch
    pub fetched: Option<TimeWindow>,
    /// Imported range of the year after this run
    pub coverage: TimeWindow,
    /// Newly stored plays
    pub imported: u64,
}

/// Drives year imports from a [`RecentTracksSource`] into SQLite.
pub struct ImportCoordinator<S, Tz: TimeZone = Local> {
    pool: SqlitePool,
    source: S,
    calendar: Calendar<Tz>,
    page_size: u32,
}

impl<S: RecentTracksSource> ImportCoordinator<S> {
    /// Coordinator using the local time zone and the system clock.
    pub fn new(pool: SqlitePool, source: S) -> Self {
        Self::with_calendar(pool, source, Calendar::local())
    }
}

impl<S: RecentTracksSource, Tz: TimeZone> ImportCoordinator<S, Tz> {
    pub fn with_calendar(pool: SqlitePool, source: S, calendar: Calendar<Tz>) -> Self {
        Self {
            pool,
            source,
            calendar,
            page_size: MAX_PAGE_SIZE,
        }
    }

    /// Scrobbles requested per page, clamped to 1..=200.
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Import the not yet imported part of `request.year`.
    ///
    /// Returns without touching the source when the year is already covered
    /// up to the last completed week. Otherwise fetches from the resume
    /// cursor (or the start of the year), stores every new play and moves
    /// the cursor to the end of the importable window, all in one commit.
    pub async fn import_year(
        &self,
        request: &ImportRequest<'_>,
        cancel: &CancellationToken,
    ) -> Result<ImportSummary> {
        let ImportRequest { user, year, api_key } = *request;
        let window = self.calendar.import_window(year)?;
        tracing::debug!(target: "import", user, year, %window, "Import window");

        let mut tx = self.pool.begin().await?;

        if db::find_user(&mut *tx, user).await?.is_none() {
            db::insert_user(&mut *tx, user).await?;
            tracing::debug!(target: "import", user, "Created user");
        }

        let (import_id, coverage_start, fetch) = match db::find_year_import(&mut *tx, user, year).await? {
            Some(existing) if existing.end >= window.end => {
                tracing::info!(
                    target: "import",
                    user,
                    year,
                    coverage = %existing.window(),
                    "Already imported, nothing to do"
                );
                return Ok(ImportSummary {
                    fetched: None,
                    coverage: existing.window(),
                    imported: 0,
                });
            }
            Some(existing) => {
                let resume_at = self
                    .calendar
                    .next_week_boundary(existing.end)
                    .ok_or(Error::InvalidTimestamp(existing.end.timestamp()))?;
                tracing::info!(target: "import", user, year, from = %resume_at, "Resuming import");
                (existing.id, existing.start, TimeWindow::new(resume_at, window.end))
            }
            None => {
                let created = db::insert_year_import(&mut *tx, user, year, window.start, window.end).await?;
                tracing::info!(target: "import", user, year, "Starting new import");
                (created.id, created.start, window)
            }
        };

        let mut reconciler = EntityReconciler::new();
        let mut imported = 0u64;
        let mut skipped = 0u64;

        if !fetch.is_empty() {
            let history = HistoryRequest {
                user,
                api_key,
                window: fetch,
                page_size: self.page_size,
            };
            let plays = recent_plays(&self.source, history, cancel);
            let mut plays = std::pin::pin!(plays);

            while let Some(play) = plays.try_next().await? {
                if !fetch.contains(play.played_at) {
                    skipped += 1;
                    continue;
                }

                let artist = reconciler.resolve_artist(&mut *tx, &play.artist).await?;
                let track = reconciler.resolve_track(&mut *tx, artist.id, &play.name).await?;
                let week = self.calendar.week_of(play.played_at);
                let fact = PlayedTrack {
                    track_id: track.id,
                    user_name: user.to_string(),
                    played_at: play.played_at,
                    played_in_year: week.year(),
                    played_in_week: week.week(),
                };
                if db::insert_played_track(&mut *tx, &fact).await? {
                    imported += 1;
                }
            }
        }

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        db::advance_year_import_end(&mut *tx, import_id, window.end).await?;
        tx.commit()
            .await
            .with_context(format!("Failed to commit {year} import for {user}"))?;

        let coverage = TimeWindow::new(coverage_start, window.end);
        tracing::info!(
            target: "import",
            user,
            year,
            imported,
            skipped,
            artists_created = reconciler.artists_created(),
            tracks_created = reconciler.tracks_created(),
            %coverage,
            "Import committed"
        );

        Ok(ImportSummary {
            fetched: Some(fetch),
            coverage,
            imported,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeDelta, Utc};

    use super::*;
    use crate::source::SourceError;
    use crate::source::traits::mocks::MockRecentTracks;
    use crate::test_utils::{now_playing, page, played, temp_db, utc, utc_calendar};

    const ALICE: ImportRequest<'static> = ImportRequest {
        user: "alice",
        year: 2024,
        api_key: "key",
    };

    fn coordinator(
        pool: &SqlitePool,
        source: MockRecentTracks,
        now: DateTime<Utc>,
    ) -> ImportCoordinator<MockRecentTracks, Utc> {
        ImportCoordinator::with_calendar(pool.clone(), source, utc_calendar(now))
    }

    async fn stored_plays(pool: &SqlitePool) -> u64 {
        let mut conn = pool.acquire().await.unwrap();
        db::count_played_tracks(&mut conn, "alice").await.unwrap()
    }

    #[tokio::test]
    async fn test_import_then_reimport_is_noop() {
        let (pool, _dir) = temp_db().await;
        let events = (0..45)
            .map(|i| played(&format!("Song {i}"), "Artist", utc(2024, 3, 4) + TimeDelta::hours(i)))
            .collect();
        let importer = coordinator(&pool, MockRecentTracks::from_events(events), utc(2025, 6, 1));
        let cancel = CancellationToken::new();

        let first = importer.import_year(&ALICE, &cancel).await.unwrap();
        assert_eq!(first.imported, 45);
        assert_eq!(first.coverage, TimeWindow::new(utc(2024, 1, 1), utc(2024, 12, 30)));

        let second = importer.import_year(&ALICE, &cancel).await.unwrap();
        assert_eq!(second.imported, 0);
        assert_eq!(second.fetched, None);
        assert_eq!(second.coverage, first.coverage);

        // The second run never reached the source.
        assert_eq!(importer.source().requests().len(), 1);
        assert_eq!(stored_plays(&pool).await, 45);

        let mut conn = pool.acquire().await.unwrap();
        let import = db::find_year_import(&mut conn, "alice", 2024).await.unwrap().unwrap();
        assert_eq!(import.window(), first.coverage);
    }

    #[tokio::test]
    async fn test_running_year_stops_at_last_completed_week() {
        let (pool, _dir) = temp_db().await;
        let source = MockRecentTracks::from_events(vec![
            played("Done", "Artist", utc(2024, 5, 28)),
            played("Current", "Artist", utc(2024, 6, 4)),
        ]);
        // Wednesday of ISO week 23.
        let importer = coordinator(&pool, source, utc(2024, 6, 5));

        let summary = importer.import_year(&ALICE, &CancellationToken::new()).await.unwrap();
        assert_eq!(summary.imported, 1);
        assert_eq!(summary.coverage.end, utc(2024, 6, 3));

        let requests = importer.source().requests();
        assert_eq!(requests[0].to, utc(2024, 6, 3) - TimeDelta::seconds(1));
    }

    #[tokio::test]
    async fn test_resume_only_ingests_after_cursor() {
        let (pool, _dir) = temp_db().await;
        let cancel = CancellationToken::new();

        let early = coordinator(
            &pool,
            MockRecentTracks::from_events(vec![played("Early", "Artist", utc(2024, 2, 1))]),
            utc(2024, 6, 5),
        );
        early.import_year(&ALICE, &cancel).await.unwrap();

        // A source that ignores the window and replays older history.
        let late = coordinator(
            &pool,
            MockRecentTracks::from_pages(vec![page(
                1,
                1,
                vec![
                    played("Early", "Artist", utc(2024, 2, 1)),
                    played("Missed", "Artist", utc(2024, 5, 30)),
                    played("Summer", "Artist", utc(2024, 7, 1)),
                    played("Winter", "Artist", utc(2024, 12, 20)),
                ],
            )]),
            utc(2025, 1, 15),
        );
        let summary = late.import_year(&ALICE, &cancel).await.unwrap();

        assert_eq!(summary.fetched, Some(TimeWindow::new(utc(2024, 6, 3), utc(2024, 12, 30))));
        assert_eq!(summary.imported, 2);
        assert_eq!(summary.coverage, TimeWindow::new(utc(2024, 1, 1), utc(2024, 12, 30)));
        assert_eq!(late.source().requests()[0].from, utc(2024, 6, 3));
        assert_eq!(stored_plays(&pool).await, 3);

        let mut conn = pool.acquire().await.unwrap();
        let artist = db::find_artist_by_name(&mut conn, "Artist").await.unwrap().unwrap();
        assert!(db::find_track(&mut conn, artist.id, "Missed").await.unwrap().is_none());
        assert!(db::find_track(&mut conn, artist.id, "Winter").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_duplicate_event_across_pages_is_stored_once() {
        let (pool, _dir) = temp_db().await;
        let at = utc(2024, 3, 5);
        let source = MockRecentTracks::from_pages(vec![
            page(1, 2, vec![played("A", "Artist", utc(2024, 3, 4)), played("B", "Artist", at)]),
            page(2, 2, vec![played("B", "Artist", at), played("C", "Artist", utc(2024, 3, 6))]),
        ]);
        let importer = coordinator(&pool, source, utc(2025, 1, 15));

        let summary = importer.import_year(&ALICE, &CancellationToken::new()).await.unwrap();
        assert_eq!(summary.imported, 3);
        assert_eq!(stored_plays(&pool).await, 3);
    }

    #[tokio::test]
    async fn test_cancelled_import_writes_nothing() {
        let (pool, _dir) = temp_db().await;
        let importer = coordinator(
            &pool,
            MockRecentTracks::from_events(vec![played("A", "Artist", utc(2024, 3, 4))]),
            utc(2025, 1, 15),
        );
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = importer.import_year(&ALICE, &cancel).await;
        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(importer.source().requests().is_empty());

        let mut conn = pool.acquire().await.unwrap();
        assert!(db::find_user(&mut conn, "alice").await.unwrap().is_none());
        assert!(db::find_year_import(&mut conn, "alice", 2024).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remote_failure_rolls_back_earlier_pages() {
        let (pool, _dir) = temp_db().await;
        let source = MockRecentTracks::from_events(vec![
            played("A", "Artist", utc(2024, 3, 4)),
            played("B", "Artist", utc(2024, 3, 5)),
            played("C", "Artist", utc(2024, 3, 6)),
        ])
        .failing_on_page(3, SourceError::Network("connection reset".to_string()));
        let importer = coordinator(&pool, source, utc(2025, 1, 15)).page_size(1);

        let result = importer.import_year(&ALICE, &CancellationToken::new()).await;
        assert!(matches!(result, Err(Error::RemoteSource(SourceError::Network(_)))));
        assert_eq!(importer.source().requests().len(), 3);

        assert_eq!(stored_plays(&pool).await, 0);
        let mut conn = pool.acquire().await.unwrap();
        assert!(db::find_artist_by_name(&mut conn, "Artist").await.unwrap().is_none());
        assert!(db::find_year_import(&mut conn, "alice", 2024).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_now_playing_is_never_stored() {
        let (pool, _dir) = temp_db().await;
        let source = MockRecentTracks::from_events(vec![
            now_playing("Live", "Streaming Artist"),
            played("Done", "Artist", utc(2024, 3, 4)),
        ]);
        let importer = coordinator(&pool, source, utc(2025, 1, 15));

        let summary = importer.import_year(&ALICE, &CancellationToken::new()).await.unwrap();
        assert_eq!(summary.imported, 1);

        let mut conn = pool.acquire().await.unwrap();
        assert!(db::find_artist_by_name(&mut conn, "Streaming Artist").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_same_title_by_two_artists_makes_two_tracks() {
        let (pool, _dir) = temp_db().await;
        let source = MockRecentTracks::from_events(vec![
            played("Intro", "Artist A", utc(2024, 3, 4)),
            played("Intro", "Artist B", utc(2024, 3, 5)),
        ]);
        let importer = coordinator(&pool, source, utc(2025, 1, 15));
        importer.import_year(&ALICE, &CancellationToken::new()).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let a = db::find_artist_by_name(&mut conn, "Artist A").await.unwrap().unwrap();
        let b = db::find_artist_by_name(&mut conn, "Artist B").await.unwrap().unwrap();
        let intro_a = db::find_track(&mut conn, a.id, "Intro").await.unwrap().unwrap();
        let intro_b = db::find_track(&mut conn, b.id, "Intro").await.unwrap().unwrap();
        assert_ne!(intro_a.id, intro_b.id);
    }

    #[tokio::test]
    async fn test_facts_carry_iso_year_and_week() {
        let (pool, _dir) = temp_db().await;
        let source = MockRecentTracks::from_events(vec![played(
            "Song",
            "Artist",
            utc(2024, 3, 10) + TimeDelta::hours(23),
        )]);
        let importer = coordinator(&pool, source, utc(2025, 1, 15));
        importer.import_year(&ALICE, &CancellationToken::new()).await.unwrap();

        let (year, week): (i32, u32) =
            sqlx::query_as("SELECT played_in_year, played_in_week FROM played_tracks")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!((year, week), (2024, 10));
    }

    #[tokio::test]
    async fn test_year_without_completed_week_fails_before_fetching() {
        let (pool, _dir) = temp_db().await;
        let importer = coordinator(&pool, MockRecentTracks::from_events(vec![]), utc(2024, 1, 3));

        let result = importer.import_year(&ALICE, &CancellationToken::new()).await;
        assert!(matches!(result, Err(Error::EmptyImportWindow { year: 2024 })));
        assert!(importer.source().requests().is_empty());
    }
}
