//! Trait definition for the remote play-history source.
//!
//! The import coordinator only depends on [`RecentTracksSource`]; production
//! code uses [`LastFmClient`](super::lastfm::LastFmClient), tests substitute
//! the mocks below.

use async_trait::async_trait;

use super::domain::{RecentTracksPage, RecentTracksQuery, SourceError};

/// A paginated source of a user's listening history.
#[async_trait]
pub trait RecentTracksSource: Send + Sync {
    /// Fetch one page of plays between `query.from` and `query.to`.
    async fn fetch_page(&self, query: &RecentTracksQuery<'_>) -> Result<RecentTracksPage, SourceError>;
}

#[async_trait]
impl RecentTracksSource for super::lastfm::LastFmClient {
    async fn fetch_page(&self, query: &RecentTracksQuery<'_>) -> Result<RecentTracksPage, SourceError> {
        self.get_recent_tracks(query).await
    }
}
