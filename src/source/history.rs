//! Lazy, page-by-page stream of finished plays.
//!
//! Pages are requested strictly one after another, only when the consumer
//! has drained the previous page. The stream is finite and cannot be
//! restarted; build a new one for every import attempt.

use futures::stream::{self, Stream, TryStreamExt};
use tokio_util::sync::CancellationToken;

use super::domain::{PlayedEvent, RecentEvent, RecentTracksQuery};
use super::traits::RecentTracksSource;
use crate::calendar::TimeWindow;
use crate::error::{Error, Result};

/// What to fetch: one user's plays inside a time window.
#[derive(Debug, Clone, Copy)]
pub struct HistoryRequest<'a> {
    pub user: &'a str,
    pub api_key: &'a str,
    /// Half-open window; translated to Last.fm's inclusive bounds
    pub window: TimeWindow,
    pub page_size: u32,
}

impl<'a> HistoryRequest<'a> {
    fn query(&self, page: u32) -> RecentTracksQuery<'a> {
        RecentTracksQuery {
            user: self.user,
            from: self.window.start,
            to: self.window.end - chrono::TimeDelta::seconds(1),
            limit: self.page_size,
            page,
            api_key: self.api_key,
        }
    }
}

/// Stream every finished play of `request`, fetching pages on demand.
///
/// Now-playing entries are dropped. `cancel` is checked before each page
/// request; once it fires the stream yields [`Error::Cancelled`]. A failed
/// page request ends the stream with [`Error::RemoteSource`].
pub fn recent_plays<'a, S>(
    source: &'a S,
    request: HistoryRequest<'a>,
    cancel: &'a CancellationToken,
) -> impl Stream<Item = Result<PlayedEvent>> + 'a
where
    S: RecentTracksSource + ?Sized,
{
    stream::try_unfold(Some(1u32), move |next_page| async move {
        let Some(page) = next_page else {
            return Ok(None);
        };
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let response = source.fetch_page(&request.query(page)).await?;
        tracing::debug!(
            target: "import",
            page,
            total_pages = response.total_pages,
            events = response.events.len(),
            "Fetched page"
        );

        let next = (page < response.total_pages).then_some(page + 1);
        let plays: Vec<Result<PlayedEvent>> = response
            .events
            .into_iter()
            .filter_map(RecentEvent::into_played)
            .map(Ok)
            .collect();
        Ok(Some((stream::iter(plays), next)))
    })
    .try_flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::domain::SourceError;
    use crate::source::traits::mocks::MockRecentTracks;
    use crate::test_utils::{now_playing, played, utc};

    fn request(page_size: u32) -> HistoryRequest<'static> {
        HistoryRequest {
            user: "alice",
            api_key: "key",
            window: TimeWindow::new(utc(2024, 1, 1), utc(2024, 12, 30)),
            page_size,
        }
    }

    #[tokio::test]
    async fn test_streams_all_pages_in_order() {
        let mock = MockRecentTracks::from_events(vec![
            now_playing("Live", "Artist"),
            played("A", "Artist", utc(2024, 3, 1)),
            played("B", "Artist", utc(2024, 3, 2)),
            played("C", "Artist", utc(2024, 3, 3)),
        ]);
        let cancel = CancellationToken::new();

        let plays: Vec<_> = recent_plays(&mock, request(2), &cancel)
            .try_collect()
            .await
            .unwrap();

        let names: Vec<_> = plays.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["A", "B", "C"]);

        let pages: Vec<_> = mock.requests().iter().map(|r| r.page).collect();
        assert_eq!(pages, [1, 2]);
    }

    #[tokio::test]
    async fn test_query_uses_inclusive_upper_bound() {
        let mock = MockRecentTracks::from_events(vec![]);
        let cancel = CancellationToken::new();
        let _: Vec<_> = recent_plays(&mock, request(200), &cancel)
            .try_collect()
            .await
            .unwrap();

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].from, utc(2024, 1, 1));
        assert_eq!(requests[0].to, utc(2024, 12, 30) - chrono::TimeDelta::seconds(1));
        assert_eq!(requests[0].limit, 200);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_page() {
        let mock = MockRecentTracks::from_events(vec![played("A", "Artist", utc(2024, 3, 1))]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result: Result<Vec<_>> = recent_plays(&mock, request(200), &cancel).try_collect().await;
        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_failure_ends_stream_after_earlier_pages() {
        let mock = MockRecentTracks::from_events(vec![
            played("A", "Artist", utc(2024, 3, 1)),
            played("B", "Artist", utc(2024, 3, 2)),
        ])
        .failing_on_page(2, SourceError::EmptyResponse);
        let cancel = CancellationToken::new();

        let stream = recent_plays(&mock, request(1), &cancel);
        let mut stream = std::pin::pin!(stream);

        let first = stream.try_next().await.unwrap();
        assert_eq!(first.map(|p| p.name), Some("A".to_string()));
        let second = stream.try_next().await;
        assert!(matches!(
            second,
            Err(Error::RemoteSource(SourceError::EmptyResponse))
        ));
    }
}
